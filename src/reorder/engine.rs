use super::arrangement;
use super::store::{BoardStore, Commit, CommitPayload};
use super::ReorderError;
use crate::domain::ListWithCards;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragSubject {
    Card(String),
    List(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragPhase {
    Idle,
    Dragging {
        subject: DragSubject,
        /// Arrangement when the gesture started.
        origin: Vec<ListWithCards>,
        /// Last drop target entered; repeated events for it are ignored.
        over: Option<String>,
    },
}

/// Result of releasing a drag.
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Released outside any drop target. Nothing is sent; the next refresh
    /// restores the committed arrangement.
    Cancelled,
    /// Released with the arrangement it started from.
    Unchanged,
    /// The new arrangement must be sent to the server.
    Dropped(Commit),
}

/// Drives one drag gesture at a time over a [`BoardStore`].
#[derive(Debug, Clone)]
pub struct ReorderEngine {
    store: BoardStore,
    phase: DragPhase,
}

impl ReorderEngine {
    pub fn new(store: BoardStore) -> Self {
        Self {
            store,
            phase: DragPhase::Idle,
        }
    }

    pub fn store(&self) -> &BoardStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut BoardStore {
        &mut self.store
    }

    pub fn lists(&self) -> &[ListWithCards] {
        self.store.lists()
    }

    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging { .. })
    }

    pub fn start_card_drag(&mut self, card_id: &str) -> Result<(), ReorderError> {
        if arrangement::locate_card(self.store.lists(), card_id).is_none() {
            return Err(ReorderError::UnknownCard(card_id.to_string()));
        }
        self.start(DragSubject::Card(card_id.to_string()))
    }

    pub fn start_list_drag(&mut self, list_id: &str) -> Result<(), ReorderError> {
        if arrangement::locate_list(self.store.lists(), list_id).is_none() {
            return Err(ReorderError::UnknownList(list_id.to_string()));
        }
        self.start(DragSubject::List(list_id.to_string()))
    }

    fn start(&mut self, subject: DragSubject) -> Result<(), ReorderError> {
        if self.is_dragging() {
            return Err(ReorderError::AlreadyDragging);
        }
        self.phase = DragPhase::Dragging {
            subject,
            origin: self.store.lists().to_vec(),
            over: None,
        };
        Ok(())
    }

    /// Pointer entered the drop target `over_id`. Recomputes the speculative
    /// arrangement and returns whether it changed.
    pub fn drag_over(&mut self, over_id: &str) -> Result<bool, ReorderError> {
        let DragPhase::Dragging { subject, over, .. } = &mut self.phase else {
            return Err(ReorderError::NotDragging);
        };
        if over.as_deref() == Some(over_id) {
            return Ok(false);
        }
        *over = Some(over_id.to_string());

        let lists = self.store.view_mut();
        let changed = match subject {
            DragSubject::Card(card_id) => arrangement::move_card_over(lists, card_id, over_id),
            DragSubject::List(list_id) => arrangement::move_list_over(lists, list_id, over_id),
        };
        Ok(changed)
    }

    /// Releases the drag. `over_id` is the target under the pointer, `None`
    /// when released outside every drop target.
    pub fn release(&mut self, over_id: Option<&str>) -> Result<DropOutcome, ReorderError> {
        let DragPhase::Dragging {
            subject, origin, ..
        } = std::mem::replace(&mut self.phase, DragPhase::Idle)
        else {
            return Err(ReorderError::NotDragging);
        };

        if over_id.is_none() {
            return Ok(DropOutcome::Cancelled);
        }
        if arrangement::same_layout(&origin, self.store.lists()) {
            return Ok(DropOutcome::Unchanged);
        }

        let payload = match subject {
            DragSubject::Card(_) => {
                CommitPayload::Cards(arrangement::renumber_cards(self.store.view_mut()))
            }
            DragSubject::List(_) => CommitPayload::Lists {
                board_id: self.store.board_id().to_string(),
                lists: arrangement::renumber_lists(self.store.view_mut()),
            },
        };
        let commit = self.store.begin_commit(payload);
        tracing::debug!(seq = commit.seq, "Reorder commit issued");
        Ok(DropOutcome::Dropped(commit))
    }
}
