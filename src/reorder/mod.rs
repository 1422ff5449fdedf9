//! Client-side drag-and-drop reordering of cards and lists.
//!
//! A gesture moves Idle -> Dragging -> Idle. While dragging, every new drop
//! target rearranges the speculative view in memory; releasing renumbers
//! the whole board positionally and yields one bulk reorder commit for the
//! server. Nothing here performs I/O.

pub mod arrangement;
pub mod engine;
pub mod store;

pub use engine::{DragPhase, DragSubject, DropOutcome, ReorderEngine};
pub use store::{BoardStore, Commit, CommitPayload};

#[derive(Debug, thiserror::Error)]
pub enum ReorderError {
    #[error("unknown card: {0}")]
    UnknownCard(String),

    #[error("unknown list: {0}")]
    UnknownList(String),

    #[error("a drag gesture is already in progress")]
    AlreadyDragging,

    #[error("no drag gesture in progress")]
    NotDragging,
}
