//! Pure transformations over a board's list/card arrangement.

use crate::domain::ordering::{CardPlacement, ListPlacement};
use crate::domain::ListWithCards;

/// Where a drop target id resolved to: a list, and the hovered card's index
/// inside it when the target was a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub list: usize,
    pub card: Option<usize>,
}

/// Removes the item at `from` and reinserts it at `to`.
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from == to || from >= items.len() || to >= items.len() {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}

/// Position of a card as (list index, card index).
pub fn locate_card(lists: &[ListWithCards], card_id: &str) -> Option<(usize, usize)> {
    lists.iter().enumerate().find_map(|(list_idx, list)| {
        list.position_of(card_id).map(|card_idx| (list_idx, card_idx))
    })
}

pub fn locate_list(lists: &[ListWithCards], list_id: &str) -> Option<usize> {
    lists.iter().position(|list| list.id() == list_id)
}

/// Resolves a hovered id. List containers win over cards, matching how the
/// droppable list and its sortable cards share one id namespace.
pub fn resolve_target(lists: &[ListWithCards], over_id: &str) -> Option<Target> {
    if let Some(list) = locate_list(lists, over_id) {
        return Some(Target { list, card: None });
    }
    locate_card(lists, over_id).map(|(list, card)| Target {
        list,
        card: Some(card),
    })
}

/// Speculative card move while hovering `over_id`. Returns whether the
/// arrangement changed.
pub fn move_card_over(lists: &mut [ListWithCards], card_id: &str, over_id: &str) -> bool {
    let Some((from_list, from_idx)) = locate_card(lists, card_id) else {
        return false;
    };
    let Some(target) = resolve_target(lists, over_id) else {
        return false;
    };

    if target.list == from_list {
        // Hovering the own list container has no index to move to.
        return match target.card {
            Some(to_idx) if to_idx != from_idx => {
                array_move(&mut lists[from_list].cards, from_idx, to_idx);
                true
            }
            _ => false,
        };
    }

    let mut card = lists[from_list].cards.remove(from_idx);
    card.list_id = lists[target.list].list.id.clone();

    let destination = &mut lists[target.list].cards;
    match target.card {
        Some(to_idx) => destination.insert(to_idx, card),
        None => destination.push(card),
    }
    true
}

/// Speculative list move while hovering `over_id` (a list or one of its
/// cards). Returns whether the arrangement changed.
pub fn move_list_over(lists: &mut Vec<ListWithCards>, list_id: &str, over_id: &str) -> bool {
    let Some(from) = locate_list(lists, list_id) else {
        return false;
    };
    let Some(target) = resolve_target(lists, over_id) else {
        return false;
    };
    if target.list == from {
        return false;
    }
    array_move(lists, from, target.list);
    true
}

/// Rewrites every card's order to its positional index and returns the
/// full set of placements, lists and cards in display order.
pub fn renumber_cards(lists: &mut [ListWithCards]) -> Vec<CardPlacement> {
    let mut placements = Vec::new();
    for list in lists.iter_mut() {
        let list_id = list.list.id.clone();
        for (index, card) in list.cards.iter_mut().enumerate() {
            card.order = index as i64;
            card.list_id = list_id.clone();
            placements.push(CardPlacement {
                id: card.id.clone(),
                list_id: list_id.clone(),
                order: card.order,
            });
        }
    }
    placements
}

/// Rewrites every list's order to its positional index.
pub fn renumber_lists(lists: &mut [ListWithCards]) -> Vec<ListPlacement> {
    lists
        .iter_mut()
        .enumerate()
        .map(|(index, list)| {
            list.list.order = index as i64;
            ListPlacement {
                id: list.list.id.clone(),
                order: list.list.order,
            }
        })
        .collect()
}

/// True when both arrangements hold the same lists in the same sequence,
/// each with the same cards in the same sequence.
pub fn same_layout(a: &[ListWithCards], b: &[ListWithCards]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(left, right)| {
            left.id() == right.id()
                && left.cards.len() == right.cards.len()
                && left
                    .cards
                    .iter()
                    .zip(&right.cards)
                    .all(|(x, y)| x.id == y.id)
        })
}
