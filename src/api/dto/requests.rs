use serde::Deserialize;

use crate::domain::{ActivityEntry, BoardId, CardPatch, ListId};

#[derive(Debug, Deserialize)]
pub struct CreateBoardRequest {
    pub title: String,
    #[serde(default)]
    pub owner_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub title: String,
    #[serde(default)]
    pub position: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCardRequest {
    pub title: String,
    #[serde(default)]
    pub position: Option<f64>,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCardRequest {
    #[serde(default)]
    pub list_id: Option<ListId>,
    #[serde(default)]
    pub position: Option<f64>,
}

impl From<UpdateCardRequest> for CardPatch {
    fn from(req: UpdateCardRequest) -> Self {
        CardPatch {
            list_id: req.list_id,
            position: req.position,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LogActivityRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl LogActivityRequest {
    pub fn into_entry(self, board_id: BoardId) -> ActivityEntry {
        ActivityEntry {
            board_id,
            user_id: self.user_id,
            action: self.action,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            metadata: self.metadata,
        }
    }
}
