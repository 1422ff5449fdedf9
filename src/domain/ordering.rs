//! Integer ordering keys for lists within a board and cards within a list.
//!
//! An order is a per-scope counter, not a dense index: creation appends at
//! `max + 1`, deletions leave gaps, and only the ascending sort matters.
//! Dense `0..n` values appear only after a reorder commit rewrites a scope.

use std::collections::HashSet;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

pub trait Ordered {
    fn order(&self) -> i64;
}

/// Target list and order of one card in a bulk reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPlacement {
    pub id: String,
    pub list_id: String,
    pub order: i64,
}

/// Order of one list in a bulk reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPlacement {
    pub id: String,
    pub order: i64,
}

/// Order for a new entity appended to a scope whose current maximum is `max`.
pub fn next_order(max: Option<i64>) -> i64 {
    max.map_or(0, |m| m + 1)
}

/// Stable ascending sort by order key.
pub fn sort_by_order<T: Ordered>(items: &mut [T]) {
    items.sort_by_key(|item| item.order());
}

/// Returns the first key that occurs more than once.
pub fn first_duplicate<K, I>(keys: I) -> Option<K>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut seen = HashSet::new();
    keys.into_iter().find(|key| !seen.insert(key.clone()))
}

/// True when the orders form a strict ascending sequence.
pub fn is_strictly_ascending<T: Ordered>(items: &[T]) -> bool {
    items.windows(2).all(|pair| pair[0].order() < pair[1].order())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Item(&'static str, i64);

    impl Ordered for Item {
        fn order(&self) -> i64 {
            self.1
        }
    }

    #[test]
    fn test_next_order_in_empty_scope_is_zero() {
        assert_eq!(next_order(None), 0);
    }

    #[test]
    fn test_next_order_appends_after_max() {
        assert_eq!(next_order(Some(0)), 1);
        assert_eq!(next_order(Some(7)), 8);
    }

    #[test]
    fn test_next_order_ignores_gaps() {
        // orders 0 and 5 remain after deleting 1..4
        assert_eq!(next_order(Some(5)), 6);
    }

    #[test]
    fn test_sort_by_order_is_stable() {
        let mut items = vec![Item("c", 2), Item("a", 0), Item("b", 2), Item("d", 1)];
        sort_by_order(&mut items);
        assert_eq!(
            items,
            vec![Item("a", 0), Item("d", 1), Item("c", 2), Item("b", 2)]
        );
    }

    #[test]
    fn test_first_duplicate() {
        assert_eq!(first_duplicate(vec!["a", "b", "a"]), Some("a"));
        assert_eq!(first_duplicate(vec![("l1", 0), ("l2", 0)]), None);
        assert_eq!(first_duplicate(Vec::<i64>::new()), None);
    }

    #[test]
    fn test_is_strictly_ascending() {
        assert!(is_strictly_ascending(&[Item("a", 0), Item("b", 3)]));
        assert!(!is_strictly_ascending(&[Item("a", 1), Item("b", 1)]));
        assert!(is_strictly_ascending::<Item>(&[]));
    }
}
