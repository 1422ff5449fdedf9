pub mod boards;
pub mod cards;

pub use boards::{
    BoardSummary, CreateBoardRequest, CreateListRequest, CreateOrganizationRequest,
    InvitationResponse, InviteMemberRequest, OrganizationDetail, OrganizationSummary,
    ReorderListsRequest, UpdateBoardRequest, UpdateListRequest,
};
pub use cards::{CreateCardRequest, MoveCardRequest, ReorderCardsRequest, UpdateCardRequest};
