pub mod board_service;
pub mod board_store;
pub mod change_feed;

pub use board_service::BoardService;
pub use board_store::SqliteBoardStore;
pub use change_feed::{ChangeFeed, TableChange, DEFAULT_CHANGE_FEED_CAPACITY};
