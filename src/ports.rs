//! Interfaces of the external collaborators a board session talks to.
//!
//! The storage collaborator is a row-oriented CRUD service; the notification
//! collaborator only says "this table changed" and carries no payload.

use async_trait::async_trait;

use crate::domain::{
    ActivityEntry, BoardId, BoardSnapshot, Card, CardId, CardPatch, List, NewCard, NewList,
    StoreError, Table,
};

#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Lists and cards of a board, each card carrying its label, assignee
    /// and comment-count projections.
    async fn fetch_board(&self, board_id: &BoardId) -> Result<BoardSnapshot, StoreError>;

    async fn insert_list(&self, list: NewList) -> Result<List, StoreError>;

    async fn insert_card(&self, card: NewCard) -> Result<Card, StoreError>;

    async fn update_card(&self, card_id: &CardId, patch: CardPatch) -> Result<(), StoreError>;

    /// Best-effort audit sink.
    async fn insert_activity_log(&self, entry: ActivityEntry) -> Result<(), StoreError>;
}

pub type ChangeCallback = Box<dyn Fn() + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

pub trait ChangeNotifier: Send + Sync {
    fn subscribe(&self, table: Table, on_change: ChangeCallback) -> SubscriptionHandle;

    fn unsubscribe(&self, handle: SubscriptionHandle);
}
