pub mod attachment;
pub mod board;
pub mod error;
pub mod ordering;
pub mod role;
pub mod user;

pub use attachment::Attachment;
pub use board::{Board, BoardView, Card, List, ListWithCards, Membership, Organization};
pub use error::KanbanError;
pub use role::Role;
pub use user::User;
