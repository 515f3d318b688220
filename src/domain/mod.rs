pub mod board;
pub mod error;
pub mod ids;

pub use board::{
    ActivityEntry, Assignee, Board, BoardSnapshot, Card, CardLabel, CardPatch, List, NewCard,
    NewList, Table,
};
pub use error::{validate_title, BoardError, SessionError, StoreError};
pub use ids::{BoardId, CardId, ListId};
