pub mod access;
pub mod board_service;
pub mod card_service;
pub mod list_service;
pub mod mail_service;
pub mod organization_service;
pub mod upload_service;
pub mod view_cache;

pub use board_service::BoardService;
pub use card_service::CardService;
pub use list_service::ListService;
pub use organization_service::OrganizationService;
pub use upload_service::UploadService;
pub use view_cache::{BoardEvent, BoardViewCache};
