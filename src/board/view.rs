use serde::Serialize;

use crate::domain::{BoardId, Card, List};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListView {
    pub list: List,
    pub cards: Vec<Card>,
}

/// Snapshot of the board in display order, published to the rendering layer
/// after every state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardView {
    pub board_id: BoardId,
    pub lists: Vec<ListView>,
}

impl BoardView {
    /// Keeps every list but only the cards whose title contains `query`,
    /// ignoring case. A blank query returns the view unchanged.
    pub fn filtered(&self, query: &str) -> BoardView {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.clone();
        }

        BoardView {
            board_id: self.board_id.clone(),
            lists: self
                .lists
                .iter()
                .map(|lv| ListView {
                    list: lv.list.clone(),
                    cards: lv
                        .cards
                        .iter()
                        .filter(|c| c.title.to_lowercase().contains(&needle))
                        .cloned()
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn card_ids(&self, list_index: usize) -> Vec<&str> {
        self.lists
            .get(list_index)
            .map(|lv| lv.cards.iter().map(|c| c.id.as_str()).collect())
            .unwrap_or_default()
    }
}
