pub mod requests;

pub use requests::{
    CreateBoardRequest, CreateCardRequest, CreateListRequest, LogActivityRequest,
    UpdateCardRequest,
};
