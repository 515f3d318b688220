use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ids::{BoardId, CardId, ListId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct List {
    pub id: ListId,
    pub board_id: BoardId,
    pub title: String,
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CardLabel {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Assignee {
    pub full_name: String,
}

/// A card as the ordering engine sees it. Everything past `position` is
/// payload carried along for rendering and never interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub list_id: ListId,
    pub position: f64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub labels: Vec<CardLabel>,
    #[serde(default)]
    pub assignees: Vec<Assignee>,
    #[serde(default)]
    pub comment_count: i64,
}

impl Card {
    pub fn new(list_id: ListId, title: impl Into<String>, position: f64) -> Self {
        Self {
            id: CardId::new(),
            list_id,
            position,
            title: title.into(),
            description: None,
            due_date: None,
            created_by: None,
            labels: Vec::new(),
            assignees: Vec::new(),
            comment_count: 0,
        }
    }
}

/// Authoritative board contents as returned by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub lists: Vec<List>,
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewList {
    pub board_id: BoardId,
    pub title: String,
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCard {
    pub list_id: ListId,
    pub title: String,
    pub position: f64,
    pub created_by: Option<String>,
}

/// Partial card update. Only the ordering fields are ever patched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CardPatch {
    #[serde(default)]
    pub list_id: Option<ListId>,
    #[serde(default)]
    pub position: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub board_id: BoardId,
    pub user_id: Option<String>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Tables whose changes are announced on the notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Boards,
    Lists,
    Cards,
    ActivityLogs,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Boards => "boards",
            Table::Lists => "lists",
            Table::Cards => "cards",
            Table::ActivityLogs => "activity_logs",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
