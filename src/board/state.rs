use std::cmp::Ordering;
use std::collections::HashMap;

use crate::domain::{BoardError, BoardId, BoardSnapshot, Card, CardId, List, ListId};
use crate::ordering;

use super::view::{BoardView, ListView};

/// What a drag collaborator's target identifier resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum DropTarget {
    Card { card_id: CardId, list_id: ListId },
    List(ListId),
}

impl DropTarget {
    pub fn list_id(&self) -> &ListId {
        match self {
            DropTarget::Card { list_id, .. } => list_id,
            DropTarget::List(list_id) => list_id,
        }
    }
}

/// A position written back to storage, produced by moves and renumbering.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionUpdate {
    pub card_id: CardId,
    pub list_id: ListId,
    pub position: f64,
}

/// Canonical in-memory board for one session.
///
/// Holds no I/O and applies no merge policy of its own. The card whose move
/// is awaiting persistence, along with any sibling positions renumbered for
/// that move, is tracked here so the reconciler can protect them.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardState {
    board_id: BoardId,
    lists: Vec<List>,
    cards: HashMap<CardId, Card>,
    pending: Option<CardId>,
    pending_siblings: Vec<PositionUpdate>,
}

fn by_position(a_pos: f64, a_id: &str, b_pos: f64, b_id: &str) -> Ordering {
    a_pos.total_cmp(&b_pos).then_with(|| a_id.cmp(b_id))
}

impl BoardState {
    pub fn new(board_id: BoardId) -> Self {
        Self {
            board_id,
            lists: Vec::new(),
            cards: HashMap::new(),
            pending: None,
            pending_siblings: Vec::new(),
        }
    }

    pub fn from_snapshot(board_id: BoardId, snapshot: BoardSnapshot) -> Self {
        let mut state = Self::new(board_id);
        state.replace_all(snapshot.lists, snapshot.cards);
        state
    }

    /// Lists in display order.
    pub fn lists(&self) -> &[List] {
        &self.lists
    }

    pub fn list(&self, list_id: &ListId) -> Option<&List> {
        self.lists.iter().find(|l| &l.id == list_id)
    }

    pub fn has_list(&self, list_id: &ListId) -> bool {
        self.list(list_id).is_some()
    }

    pub fn card(&self, card_id: &CardId) -> Option<&Card> {
        self.cards.get(card_id)
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    /// Cards of `list_id` in ascending position order.
    pub fn cards_of(&self, list_id: &ListId) -> Vec<&Card> {
        let mut cards: Vec<&Card> = self
            .cards
            .values()
            .filter(|c| &c.list_id == list_id)
            .collect();
        cards.sort_by(|a, b| by_position(a.position, a.id.as_str(), b.position, b.id.as_str()));
        cards
    }

    pub fn max_list_position(&self) -> Option<f64> {
        self.lists.last().map(|l| l.position)
    }

    pub fn last_card_position(&self, list_id: &ListId) -> Option<f64> {
        self.cards_of(list_id).last().map(|c| c.position)
    }

    /// Resolves a raw drop-target id to a card (and its list) or a list.
    pub fn resolve_target(&self, target_id: &str) -> Option<DropTarget> {
        let card_id = CardId::from(target_id);
        if let Some(card) = self.cards.get(&card_id) {
            return Some(DropTarget::Card {
                card_id,
                list_id: card.list_id.clone(),
            });
        }
        let list_id = ListId::from(target_id);
        self.has_list(&list_id).then_some(DropTarget::List(list_id))
    }

    pub fn pending_card(&self) -> Option<&CardId> {
        self.pending.as_ref()
    }

    pub fn mark_pending(&mut self, card_id: CardId) {
        self.pending = Some(card_id);
    }

    /// Sibling positions rewritten for the pending move. They stay authoritative
    /// locally until the move settles.
    pub fn protect_siblings(&mut self, updates: Vec<PositionUpdate>) {
        self.pending_siblings = updates;
    }

    pub fn pending_siblings(&self) -> &[PositionUpdate] {
        &self.pending_siblings
    }

    pub fn clear_pending(&mut self) -> Option<CardId> {
        self.pending_siblings.clear();
        self.pending.take()
    }

    /// Moves a card to `target_list` at `target_position`, synchronously.
    pub fn apply_optimistic_move(
        &mut self,
        card_id: &CardId,
        target_list: &ListId,
        target_position: f64,
    ) -> Result<(), BoardError> {
        if !self.has_list(target_list) {
            return Err(BoardError::NotFound(format!("List not found: {}", target_list)));
        }
        let card = self
            .cards
            .get_mut(card_id)
            .ok_or_else(|| BoardError::NotFound(format!("Card not found: {}", card_id)))?;

        card.list_id = target_list.clone();
        card.position = target_position;
        Ok(())
    }

    /// Replaces every list and card. Cards pointing at a list missing from
    /// `lists` are dropped; the count of dropped cards is returned.
    pub fn replace_all(&mut self, lists: Vec<List>, cards: Vec<Card>) -> usize {
        let mut lists = lists;
        lists.sort_by(|a, b| by_position(a.position, a.id.as_str(), b.position, b.id.as_str()));
        self.lists = lists;

        let mut dropped = 0;
        let mut next = HashMap::with_capacity(cards.len());
        for card in cards {
            if !self.has_list(&card.list_id) {
                tracing::warn!(
                    card_id = %card.id,
                    list_id = %card.list_id,
                    "Dropping card that references a list absent from the board"
                );
                dropped += 1;
                continue;
            }
            next.insert(card.id.clone(), card);
        }
        self.cards = next;
        dropped
    }

    pub fn upsert_list(&mut self, list: List) {
        self.lists.retain(|l| l.id != list.id);
        let idx = self.lists.partition_point(|l| {
            by_position(l.position, l.id.as_str(), list.position, list.id.as_str()) == Ordering::Less
        });
        self.lists.insert(idx, list);
    }

    /// Inserts or replaces a card record as a unit. Orphans are refused.
    pub fn upsert_card(&mut self, card: Card) -> bool {
        if !self.has_list(&card.list_id) {
            tracing::warn!(card_id = %card.id, list_id = %card.list_id, "Refusing orphaned card");
            return false;
        }
        self.cards.insert(card.id.clone(), card);
        true
    }

    /// Rewrites the positions of a list's cards to `GAP, 2·GAP, …`, keeping
    /// their order. `skip` leaves one card (typically the one being dragged)
    /// out of the sequence. Returns the cards whose position changed.
    pub fn renumber_list(&mut self, list_id: &ListId, skip: Option<&CardId>) -> Vec<PositionUpdate> {
        let ordered: Vec<CardId> = self
            .cards_of(list_id)
            .into_iter()
            .filter(|c| Some(&c.id) != skip)
            .map(|c| c.id.clone())
            .collect();

        let count = ordered.len();
        let mut updates = Vec::new();
        for (card_id, position) in ordered.into_iter().zip(ordering::spaced(count)) {
            if let Some(card) = self.cards.get_mut(&card_id) {
                if card.position != position {
                    card.position = position;
                    updates.push(PositionUpdate {
                        card_id,
                        list_id: list_id.clone(),
                        position,
                    });
                }
            }
        }
        updates
    }

    /// Read-only projection handed to the rendering layer.
    pub fn view(&self) -> BoardView {
        BoardView {
            board_id: self.board_id.clone(),
            lists: self
                .lists
                .iter()
                .map(|list| ListView {
                    list: list.clone(),
                    cards: self.cards_of(&list.id).into_iter().cloned().collect(),
                })
                .collect(),
        }
    }
}
