//! Client-side board store: a committed arrangement plus a speculative view.
//!
//! The view is mutated synchronously by drag gestures. The committed copy
//! only moves forward when the server acknowledges a commit or when fresh
//! board data is loaded; a rejected commit reverts the view to it.

use std::collections::BTreeMap;

use serde_json::json;

use super::ReorderError;
use crate::domain::ordering::{self, CardPlacement, ListPlacement};
use crate::domain::{BoardView, Card, List, ListWithCards};

/// What a commit asks the server to persist.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitPayload {
    Cards(Vec<CardPlacement>),
    Lists {
        board_id: String,
        lists: Vec<ListPlacement>,
    },
}

impl CommitPayload {
    /// Route of the bulk reorder operation.
    pub fn endpoint(&self) -> String {
        match self {
            CommitPayload::Cards(_) => "/api/cards/reorder".to_string(),
            CommitPayload::Lists { board_id, .. } => {
                format!("/api/boards/{}/lists/reorder", board_id)
            }
        }
    }

    pub fn body(&self) -> serde_json::Value {
        match self {
            CommitPayload::Cards(cards) => json!({ "cards": cards }),
            CommitPayload::Lists { lists, .. } => json!({ "lists": lists }),
        }
    }
}

/// A submitted arrangement awaiting acknowledgment. Sequence numbers grow
/// in gesture-completion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub seq: u64,
    pub payload: CommitPayload,
}

#[derive(Debug, Clone)]
pub struct BoardStore {
    board_id: String,
    committed: Vec<ListWithCards>,
    view: Vec<ListWithCards>,
    in_flight: BTreeMap<u64, Vec<ListWithCards>>,
    next_seq: u64,
    acknowledged: u64,
}

impl BoardStore {
    pub fn new(board: BoardView) -> Self {
        Self::from_lists(board.board.id, board.lists)
    }

    pub fn from_lists(board_id: impl Into<String>, mut lists: Vec<ListWithCards>) -> Self {
        normalize(&mut lists);
        Self {
            board_id: board_id.into(),
            committed: lists.clone(),
            view: lists,
            in_flight: BTreeMap::new(),
            next_seq: 1,
            acknowledged: 0,
        }
    }

    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    /// The arrangement currently on screen.
    pub fn lists(&self) -> &[ListWithCards] {
        &self.view
    }

    pub fn committed(&self) -> &[ListWithCards] {
        &self.committed
    }

    pub fn pending_commits(&self) -> usize {
        self.in_flight.len()
    }

    pub(crate) fn view_mut(&mut self) -> &mut Vec<ListWithCards> {
        &mut self.view
    }

    /// Replaces both copies with server data, e.g. after navigation or a
    /// board invalidation. Acknowledgments for commits issued before the
    /// refresh are ignored from here on.
    pub fn refresh(&mut self, board: BoardView) {
        let mut lists = board.lists;
        normalize(&mut lists);
        self.committed = lists.clone();
        self.view = lists;
        self.in_flight.clear();
        self.acknowledged = self.next_seq - 1;
    }

    /// Snapshots the current view as an in-flight commit.
    pub(crate) fn begin_commit(&mut self, payload: CommitPayload) -> Commit {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.in_flight.insert(seq, self.view.clone());
        Commit { seq, payload }
    }

    /// Server accepted commit `seq`. Returns false for unknown or stale
    /// acknowledgments, which leave the committed copy untouched.
    pub fn acknowledge(&mut self, seq: u64) -> bool {
        let Some(snapshot) = self.in_flight.remove(&seq) else {
            return false;
        };
        if seq <= self.acknowledged {
            return false;
        }
        self.acknowledged = seq;
        self.committed = snapshot;
        self.in_flight.retain(|pending, _| *pending > seq);
        true
    }

    /// Server rejected commit `seq`. The view snaps back to the newest
    /// commit still in flight, or to the committed arrangement when none is
    /// left. Each commit carries the whole board, so acknowledging that
    /// newer commit later leaves view and committed copy equal.
    pub fn reject(&mut self, seq: u64) {
        if self.in_flight.remove(&seq).is_none() {
            return;
        }
        let restored = self
            .in_flight
            .values()
            .next_back()
            .unwrap_or(&self.committed)
            .clone();
        tracing::debug!(
            seq,
            pending = self.in_flight.len(),
            "Reorder commit rejected, reverting view"
        );
        self.view = restored;
    }

    /// Appends a list the server just created.
    pub fn push_list(&mut self, list: List) {
        let entry = ListWithCards {
            list,
            cards: Vec::new(),
        };
        self.committed.push(entry.clone());
        self.view.push(entry);
    }

    /// Appends a card the server just created to the end of its list.
    pub fn push_card(&mut self, card: Card) -> Result<(), ReorderError> {
        for lists in [&mut self.committed, &mut self.view] {
            let list = lists
                .iter_mut()
                .find(|list| list.list.id == card.list_id)
                .ok_or_else(|| ReorderError::UnknownList(card.list_id.clone()))?;
            list.cards.push(card.clone());
        }
        Ok(())
    }
}

fn normalize(lists: &mut [ListWithCards]) {
    ordering::sort_by_order(lists);
    for list in lists.iter_mut() {
        ordering::sort_by_order(&mut list.cards);
    }
}

impl ordering::Ordered for ListWithCards {
    fn order(&self) -> i64 {
        self.list.order
    }
}
