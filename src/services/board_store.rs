use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::{
    ActivityEntry, Board, BoardError, BoardId, BoardSnapshot, Card, CardId, CardPatch, List,
    ListId, NewCard, NewList, StoreError, Table,
};
use crate::ports::BoardStore;
use crate::services::{BoardService, ChangeFeed};

/// SQLite-backed storage collaborator. Every successful write announces the
/// touched table on the change feed.
#[derive(Clone)]
pub struct SqliteBoardStore {
    pool: SqlitePool,
    feed: Arc<ChangeFeed>,
}

impl SqliteBoardStore {
    pub fn new(pool: SqlitePool, feed: Arc<ChangeFeed>) -> Self {
        Self { pool, feed }
    }

    pub async fn create_board(
        &self,
        title: &str,
        owner_id: Option<&str>,
    ) -> Result<Board, BoardError> {
        let board = BoardService::create_board(&self.pool, title, owner_id).await?;
        self.feed.publish(Table::Boards);
        Ok(board)
    }

    pub async fn snapshot(&self, board_id: &BoardId) -> Result<BoardSnapshot, BoardError> {
        BoardService::fetch_snapshot(&self.pool, board_id).await
    }

    pub async fn create_list(
        &self,
        board_id: &BoardId,
        title: &str,
        position: Option<f64>,
    ) -> Result<List, BoardError> {
        let list = BoardService::create_list(&self.pool, board_id, title, position).await?;
        self.feed.publish(Table::Lists);
        Ok(list)
    }

    pub async fn create_card(
        &self,
        list_id: &ListId,
        title: &str,
        position: Option<f64>,
        created_by: Option<&str>,
    ) -> Result<Card, BoardError> {
        let card =
            BoardService::create_card(&self.pool, list_id, title, position, created_by).await?;
        self.feed.publish(Table::Cards);
        Ok(card)
    }

    pub async fn patch_card(&self, card_id: &CardId, patch: CardPatch) -> Result<(), BoardError> {
        BoardService::update_card(&self.pool, card_id, patch).await?;
        self.feed.publish(Table::Cards);
        Ok(())
    }

    pub async fn log_activity(&self, entry: ActivityEntry) -> Result<(), BoardError> {
        BoardService::insert_activity_log(&self.pool, entry).await?;
        self.feed.publish(Table::ActivityLogs);
        Ok(())
    }
}

#[async_trait]
impl BoardStore for SqliteBoardStore {
    async fn fetch_board(&self, board_id: &BoardId) -> Result<BoardSnapshot, StoreError> {
        Ok(self.snapshot(board_id).await?)
    }

    async fn insert_list(&self, list: NewList) -> Result<List, StoreError> {
        Ok(self
            .create_list(&list.board_id, &list.title, Some(list.position))
            .await?)
    }

    async fn insert_card(&self, card: NewCard) -> Result<Card, StoreError> {
        Ok(self
            .create_card(
                &card.list_id,
                &card.title,
                Some(card.position),
                card.created_by.as_deref(),
            )
            .await?)
    }

    async fn update_card(&self, card_id: &CardId, patch: CardPatch) -> Result<(), StoreError> {
        Ok(self.patch_card(card_id, patch).await?)
    }

    async fn insert_activity_log(&self, entry: ActivityEntry) -> Result<(), StoreError> {
        Ok(self.log_activity(entry).await?)
    }
}
