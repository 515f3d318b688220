use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqlitePool;

use crate::domain::{
    validate_title, ActivityEntry, Assignee, Board, BoardError, BoardId, BoardSnapshot, Card,
    CardId, CardLabel, CardPatch, List, ListId,
};
use crate::ordering::allocate_append;

#[derive(sqlx::FromRow)]
struct CardRow {
    id: CardId,
    list_id: ListId,
    position: f64,
    title: String,
    description: Option<String>,
    due_date: Option<String>,
    created_by: Option<String>,
    comment_count: i64,
}

impl CardRow {
    fn into_card(self, labels: Vec<CardLabel>, assignees: Vec<Assignee>) -> Card {
        Card {
            id: self.id,
            list_id: self.list_id,
            position: self.position,
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            created_by: self.created_by,
            labels,
            assignees,
            comment_count: self.comment_count,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LabelRow {
    card_id: CardId,
    name: String,
    color: String,
}

#[derive(sqlx::FromRow)]
struct AssigneeRow {
    card_id: CardId,
    full_name: String,
}

const CARD_COLUMNS: &str = r#"
    c.id, c.list_id, c.position, c.title, c.description, c.due_date, c.created_by,
    (SELECT COUNT(*) FROM comments cm WHERE cm.card_id = c.id) AS comment_count
"#;

pub struct BoardService;

impl BoardService {
    // ── Boards ─────────────────────────────────────────────────

    pub async fn create_board(
        pool: &SqlitePool,
        title: &str,
        owner_id: Option<&str>,
    ) -> Result<Board, BoardError> {
        let title = validate_title(title).map_err(BoardError::Validation)?;
        let id = BoardId::new();
        let now = Utc::now().to_rfc3339();

        let board: Board = sqlx::query_as(
            "INSERT INTO boards (id, title, description, owner_id, created_at, updated_at) VALUES (?, ?, NULL, ?, ?, ?) RETURNING id, title, description, owner_id, created_at, updated_at",
        )
        .bind(&id)
        .bind(title)
        .bind(owner_id)
        .bind(&now)
        .bind(&now)
        .fetch_one(pool)
        .await?;

        tracing::info!(board_id = %board.id, "Board created");
        Ok(board)
    }

    pub async fn get_board(pool: &SqlitePool, board_id: &BoardId) -> Result<Board, BoardError> {
        sqlx::query_as(
            "SELECT id, title, description, owner_id, created_at, updated_at FROM boards WHERE id = ?",
        )
        .bind(board_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| BoardError::NotFound(format!("Board not found: {}", board_id)))
    }

    /// Lists and cards of a board in display order, cards carrying their
    /// label, assignee and comment-count projections.
    pub async fn fetch_snapshot(
        pool: &SqlitePool,
        board_id: &BoardId,
    ) -> Result<BoardSnapshot, BoardError> {
        Self::get_board(pool, board_id).await?;

        let lists: Vec<List> = sqlx::query_as(
            "SELECT id, board_id, title, position FROM lists WHERE board_id = ? ORDER BY position ASC, id ASC",
        )
        .bind(board_id)
        .fetch_all(pool)
        .await?;

        let card_rows: Vec<CardRow> = sqlx::query_as(&format!(
            "SELECT {CARD_COLUMNS} FROM cards c JOIN lists l ON l.id = c.list_id WHERE l.board_id = ? ORDER BY c.position ASC, c.id ASC"
        ))
        .bind(board_id)
        .fetch_all(pool)
        .await?;

        let label_rows: Vec<LabelRow> = sqlx::query_as(
            r#"
            SELECT cl.card_id, cl.name, cl.color
            FROM card_labels cl
            JOIN cards c ON c.id = cl.card_id
            JOIN lists l ON l.id = c.list_id
            WHERE l.board_id = ?
            ORDER BY cl.created_at ASC, cl.id ASC
            "#,
        )
        .bind(board_id)
        .fetch_all(pool)
        .await?;

        let assignee_rows: Vec<AssigneeRow> = sqlx::query_as(
            r#"
            SELECT ca.card_id, p.full_name
            FROM card_assignees ca
            JOIN profiles p ON p.id = ca.user_id
            JOIN cards c ON c.id = ca.card_id
            JOIN lists l ON l.id = c.list_id
            WHERE l.board_id = ?
            ORDER BY ca.created_at ASC, ca.id ASC
            "#,
        )
        .bind(board_id)
        .fetch_all(pool)
        .await?;

        let mut labels: HashMap<CardId, Vec<CardLabel>> = HashMap::new();
        for row in label_rows {
            labels.entry(row.card_id).or_default().push(CardLabel {
                name: row.name,
                color: row.color,
            });
        }

        let mut assignees: HashMap<CardId, Vec<Assignee>> = HashMap::new();
        for row in assignee_rows {
            assignees.entry(row.card_id).or_default().push(Assignee {
                full_name: row.full_name,
            });
        }

        let cards = card_rows
            .into_iter()
            .map(|row| {
                let card_labels = labels.remove(&row.id).unwrap_or_default();
                let card_assignees = assignees.remove(&row.id).unwrap_or_default();
                row.into_card(card_labels, card_assignees)
            })
            .collect();

        Ok(BoardSnapshot { lists, cards })
    }

    // ── Lists ──────────────────────────────────────────────────

    /// Inserts a list. Without an explicit position it is appended after the
    /// board's last list.
    pub async fn create_list(
        pool: &SqlitePool,
        board_id: &BoardId,
        title: &str,
        position: Option<f64>,
    ) -> Result<List, BoardError> {
        let title = validate_title(title).map_err(BoardError::Validation)?;
        Self::get_board(pool, board_id).await?;

        let position = match position {
            Some(p) => Self::check_position(p)?,
            None => {
                let max: Option<f64> =
                    sqlx::query_scalar("SELECT MAX(position) FROM lists WHERE board_id = ?")
                        .bind(board_id)
                        .fetch_one(pool)
                        .await?;
                allocate_append(max)
            }
        };

        let id = ListId::new();
        let now = Utc::now().to_rfc3339();

        let list: List = sqlx::query_as(
            "INSERT INTO lists (id, board_id, title, position, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING id, board_id, title, position",
        )
        .bind(&id)
        .bind(board_id)
        .bind(title)
        .bind(position)
        .bind(&now)
        .bind(&now)
        .fetch_one(pool)
        .await?;

        tracing::debug!(list_id = %list.id, board_id = %board_id, position, "List created");
        Ok(list)
    }

    // ── Cards ──────────────────────────────────────────────────

    pub async fn create_card(
        pool: &SqlitePool,
        list_id: &ListId,
        title: &str,
        position: Option<f64>,
        created_by: Option<&str>,
    ) -> Result<Card, BoardError> {
        let title = validate_title(title).map_err(BoardError::Validation)?;
        Self::require_list(pool, list_id).await?;

        let position = match position {
            Some(p) => Self::check_position(p)?,
            None => {
                let max: Option<f64> =
                    sqlx::query_scalar("SELECT MAX(position) FROM cards WHERE list_id = ?")
                        .bind(list_id)
                        .fetch_one(pool)
                        .await?;
                allocate_append(max)
            }
        };

        let id = CardId::new();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO cards (id, list_id, title, description, position, due_date, created_by, created_at, updated_at) VALUES (?, ?, ?, NULL, ?, NULL, ?, ?, ?)",
        )
        .bind(&id)
        .bind(list_id)
        .bind(title)
        .bind(position)
        .bind(created_by)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;

        tracing::debug!(card_id = %id, list_id = %list_id, position, "Card created");
        Self::get_card(pool, &id).await
    }

    pub async fn get_card(pool: &SqlitePool, card_id: &CardId) -> Result<Card, BoardError> {
        let row: CardRow = sqlx::query_as(&format!(
            "SELECT {CARD_COLUMNS} FROM cards c WHERE c.id = ?"
        ))
        .bind(card_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| BoardError::NotFound(format!("Card not found: {}", card_id)))?;

        let labels: Vec<CardLabel> = sqlx::query_as(
            "SELECT name, color FROM card_labels WHERE card_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(card_id)
        .fetch_all(pool)
        .await?;

        let assignees: Vec<Assignee> = sqlx::query_as(
            "SELECT p.full_name FROM card_assignees ca JOIN profiles p ON p.id = ca.user_id WHERE ca.card_id = ? ORDER BY ca.created_at ASC, ca.id ASC",
        )
        .bind(card_id)
        .fetch_all(pool)
        .await?;

        Ok(row.into_card(labels, assignees))
    }

    /// Patches a card's list and/or position. Fields left `None` keep their
    /// stored value.
    pub async fn update_card(
        pool: &SqlitePool,
        card_id: &CardId,
        patch: CardPatch,
    ) -> Result<(), BoardError> {
        if let Some(position) = patch.position {
            Self::check_position(position)?;
        }
        if let Some(list_id) = &patch.list_id {
            Self::require_list(pool, list_id).await?;
        }

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE cards SET list_id = COALESCE(?, list_id), position = COALESCE(?, position), updated_at = ? WHERE id = ?",
        )
        .bind(patch.list_id.as_ref())
        .bind(patch.position)
        .bind(&now)
        .bind(card_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(BoardError::NotFound(format!("Card not found: {}", card_id)));
        }

        tracing::debug!(
            card_id = %card_id,
            list_id = ?patch.list_id,
            position = ?patch.position,
            "Card updated"
        );
        Ok(())
    }

    // ── Activity ───────────────────────────────────────────────

    pub async fn insert_activity_log(
        pool: &SqlitePool,
        entry: ActivityEntry,
    ) -> Result<(), BoardError> {
        Self::get_board(pool, &entry.board_id).await?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let metadata = serde_json::to_string(&entry.metadata)?;

        sqlx::query(
            "INSERT INTO activity_logs (id, board_id, user_id, action, entity_type, entity_id, metadata, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&entry.board_id)
        .bind(&entry.user_id)
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&metadata)
        .bind(&now)
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn require_list(pool: &SqlitePool, list_id: &ListId) -> Result<(), BoardError> {
        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM lists WHERE id = ?")
            .bind(list_id)
            .fetch_optional(pool)
            .await?;
        exists
            .map(|_| ())
            .ok_or_else(|| BoardError::NotFound(format!("List not found: {}", list_id)))
    }

    fn check_position(position: f64) -> Result<f64, BoardError> {
        if position.is_finite() {
            Ok(position)
        } else {
            Err(BoardError::Validation("position must be a finite number".into()))
        }
    }
}
