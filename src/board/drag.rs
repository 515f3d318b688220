//! Drag lifecycle: `Idle → Dragging → (Idle | Persisting → Idle)`.
//!
//! Drag-over moves are provisional and purely local. Drag-end recomputes the
//! final position from the drop index and hands back a [`MoveRequest`] for
//! the caller to persist; the controller itself never performs I/O.

use crate::domain::{Card, CardId, ListId};
use crate::ordering::{allocate_append, allocate_between, fits_between};

use super::state::{BoardState, DropTarget, PositionUpdate};

/// Events emitted by the drag-and-drop collaborator. `over` is a raw id that
/// may name either a card or a list.
#[derive(Debug, Clone, PartialEq)]
pub enum DragEvent {
    Start { card_id: CardId },
    Over { active: CardId, over: String },
    End { active: CardId, over: Option<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub card_id: CardId,
    pub origin_list: ListId,
    pub pending: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging(DragSession),
    Persisting(DragSession),
}

/// Final placement of a dropped card, plus any sibling positions rewritten
/// because the target list had run out of precision.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRequest {
    pub card_id: CardId,
    pub from_list: ListId,
    pub to_list: ListId,
    pub position: f64,
    pub renumbered: Vec<PositionUpdate>,
}

#[derive(Debug, Default)]
pub struct DragController {
    phase: DragPhase,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, DragPhase::Idle)
    }


    /// Feeds one collaborator event through the state machine. Only a
    /// completed drop yields a request.
    pub fn handle(&mut self, state: &mut BoardState, event: &DragEvent) -> Option<MoveRequest> {
        match event {
            DragEvent::Start { card_id } => {
                self.drag_start(state, card_id);
                None
            }
            DragEvent::Over { active, over } => {
                self.drag_over(state, active, over);
                None
            }
            DragEvent::End { active, over } => self.drag_end(state, active, over.as_deref()),
        }
    }

    pub fn drag_start(&mut self, state: &BoardState, card_id: &CardId) -> bool {
        match &self.phase {
            DragPhase::Idle => {}
            DragPhase::Dragging(session) => {
                tracing::debug!(
                    card_id = %card_id,
                    active = %session.card_id,
                    "Ignoring drag start while another drag is active"
                );
                return false;
            }
            DragPhase::Persisting(session) => {
                tracing::debug!(
                    card_id = %card_id,
                    pending = %session.card_id,
                    "Ignoring drag start while a move is still persisting"
                );
                return false;
            }
        }

        let Some(card) = state.card(card_id) else {
            tracing::warn!(card_id = %card_id, "Drag started on unknown card");
            return false;
        };

        tracing::debug!(card_id = %card_id, list_id = %card.list_id, "Drag started");
        self.phase = DragPhase::Dragging(DragSession {
            card_id: card_id.clone(),
            origin_list: card.list_id.clone(),
            pending: false,
        });
        true
    }

    /// Relocates the card provisionally when the pointer crosses into another
    /// list. Returns whether the state changed.
    pub fn drag_over(&mut self, state: &mut BoardState, active: &CardId, over: &str) -> bool {
        if !self.is_dragging(active) {
            return false;
        }
        let Some(target) = state.resolve_target(over) else {
            return false;
        };
        let Some(current_list) = state.card(active).map(|c| c.list_id.clone()) else {
            return false;
        };
        let hovered_list = target.list_id().clone();
        if hovered_list == current_list {
            return false;
        }

        let position = match &target {
            DropTarget::Card { card_id, .. } => {
                let siblings = state.cards_of(&hovered_list);
                let idx = siblings
                    .iter()
                    .position(|c| &c.id == card_id)
                    .unwrap_or(siblings.len());
                let prev = idx.checked_sub(1).and_then(|i| siblings.get(i)).map(|c| c.position);
                let next = siblings.get(idx).map(|c| c.position);
                allocate_between(prev, next)
            }
            DropTarget::List(list_id) => allocate_append(state.last_card_position(list_id)),
        };

        match state.apply_optimistic_move(active, &hovered_list, position) {
            Ok(()) => {
                tracing::debug!(
                    card_id = %active,
                    list_id = %hovered_list,
                    position,
                    "Provisional move"
                );
                true
            }
            Err(e) => {
                tracing::warn!(card_id = %active, error = %e, "Provisional move rejected");
                false
            }
        }
    }

    /// Completes the drag. A drop onto a known card or list applies the final
    /// optimistic move, marks the card pending and returns the request to
    /// persist. Anything else returns to idle and keeps the last placement.
    pub fn drag_end(
        &mut self,
        state: &mut BoardState,
        active: &CardId,
        over: Option<&str>,
    ) -> Option<MoveRequest> {
        let session = match &self.phase {
            DragPhase::Dragging(s) if &s.card_id == active => s.clone(),
            _ => {
                tracing::debug!(card_id = %active, "Ignoring drag end without a matching drag");
                return None;
            }
        };

        let Some(target) = over.and_then(|id| state.resolve_target(id)) else {
            tracing::debug!(card_id = %active, "Drag ended outside any target");
            self.phase = DragPhase::Idle;
            return None;
        };

        // the card may have vanished under a refresh mid-drag; bail out
        // before any sibling gets renumbered
        if state.card(active).is_none() {
            tracing::warn!(card_id = %active, "Dragged card is gone, dropping the drag");
            self.phase = DragPhase::Idle;
            return None;
        }

        let to_list = target.list_id().clone();
        let (position, renumbered) = Self::drop_position(state, active, &target);

        if let Err(e) = state.apply_optimistic_move(active, &to_list, position) {
            tracing::warn!(card_id = %active, error = %e, "Drop rejected");
            self.phase = DragPhase::Idle;
            return None;
        }
        state.mark_pending(active.clone());
        state.protect_siblings(renumbered.clone());

        tracing::debug!(
            card_id = %active,
            from_list = %session.origin_list,
            to_list = %to_list,
            position,
            "Card dropped"
        );

        let request = MoveRequest {
            card_id: active.clone(),
            from_list: session.origin_list.clone(),
            to_list,
            position,
            renumbered,
        };
        self.phase = DragPhase::Persisting(DragSession {
            pending: true,
            ..session
        });
        Some(request)
    }

    /// Persistence for `card_id` settled, successfully or not.
    pub fn settle(&mut self, state: &mut BoardState, card_id: &CardId) -> Option<DragSession> {
        match &self.phase {
            DragPhase::Persisting(s) if &s.card_id == card_id => {
                let session = s.clone();
                self.phase = DragPhase::Idle;
                state.clear_pending();
                Some(session)
            }
            _ => None,
        }
    }

    fn is_dragging(&self, card_id: &CardId) -> bool {
        matches!(&self.phase, DragPhase::Dragging(s) if &s.card_id == card_id)
    }

    fn others<'a>(state: &'a BoardState, list_id: &ListId, active: &CardId) -> Vec<&'a Card> {
        state
            .cards_of(list_id)
            .into_iter()
            .filter(|c| &c.id != active)
            .collect()
    }

    /// Drop index among the target list's cards, not counting the dragged one.
    fn drop_index(state: &BoardState, active: &CardId, target: &DropTarget) -> usize {
        let others = Self::others(state, target.list_id(), active);
        match target {
            DropTarget::Card { card_id, .. } if card_id != active => others
                .iter()
                .position(|c| &c.id == card_id)
                .unwrap_or(others.len()),
            // dropped back onto itself: keep its current slot
            DropTarget::Card { .. } => match state.card(active) {
                Some(card) => others.iter().filter(|c| c.position < card.position).count(),
                None => others.len(),
            },
            DropTarget::List(_) => others.len(),
        }
    }

    fn neighbours(
        state: &BoardState,
        list_id: &ListId,
        active: &CardId,
        index: usize,
    ) -> (Option<f64>, Option<f64>) {
        let others = Self::others(state, list_id, active);
        let prev = index
            .checked_sub(1)
            .and_then(|i| others.get(i))
            .map(|c| c.position);
        let next = others.get(index).map(|c| c.position);
        (prev, next)
    }

    fn position_at(index: usize, prev: Option<f64>, next: Option<f64>) -> f64 {
        if index == 0 {
            allocate_between(None, next)
        } else if next.is_none() {
            allocate_append(prev)
        } else {
            allocate_between(prev, next)
        }
    }

    fn drop_position(
        state: &mut BoardState,
        active: &CardId,
        target: &DropTarget,
    ) -> (f64, Vec<PositionUpdate>) {
        let list_id = target.list_id().clone();
        let index = Self::drop_index(state, active, target);
        let (prev, next) = Self::neighbours(state, &list_id, active, index);
        let position = Self::position_at(index, prev, next);
        if fits_between(prev, next, position) {
            return (position, Vec::new());
        }

        tracing::info!(list_id = %list_id, "Position precision exhausted, renumbering list");
        let renumbered = state.renumber_list(&list_id, Some(active));
        let (prev, next) = Self::neighbours(state, &list_id, active, index);
        (Self::position_at(index, prev, next), renumbered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::state::tests::{board, card, list};

    fn id(s: &str) -> CardId {
        CardId::from(s)
    }

    fn two_lists() -> BoardState {
        board(
            vec![list("a", 1024.0), list("b", 2048.0)],
            vec![
                card("c", "a", 1024.0),
                card("b1", "b", 1024.0),
                card("b2", "b", 2048.0),
            ],
        )
    }

    #[test]
    fn cross_list_drop_lands_between_neighbours() {
        let mut state = two_lists();
        let mut drag = DragController::new();

        assert!(drag.drag_start(&state, &id("c")));
        assert!(drag.drag_over(&mut state, &id("c"), "b2"));
        let request = drag.drag_end(&mut state, &id("c"), Some("b2")).unwrap();

        assert_eq!(request.from_list, ListId::from("a"));
        assert_eq!(request.to_list, ListId::from("b"));
        assert_eq!(request.position, 1536.0);
        assert!(request.renumbered.is_empty());

        let moved = state.card(&id("c")).unwrap();
        assert_eq!(moved.list_id, ListId::from("b"));
        assert_eq!(moved.position, 1536.0);
        assert!(state.cards_of(&ListId::from("a")).is_empty());
        assert_eq!(state.pending_card(), Some(&id("c")));
        assert!(matches!(drag.phase(), DragPhase::Persisting(s) if s.pending));
    }

    #[test]
    fn drop_index_boundaries() {
        // head of the list
        let mut state = two_lists();
        let mut drag = DragController::new();
        drag.drag_start(&state, &id("c"));
        let request = drag.drag_end(&mut state, &id("c"), Some("b1")).unwrap();
        assert_eq!(request.position, 512.0);

        // empty space of the list appends
        let mut state = two_lists();
        let mut drag = DragController::new();
        drag.drag_start(&state, &id("c"));
        let request = drag.drag_end(&mut state, &id("c"), Some("b")).unwrap();
        assert_eq!(request.position, 3072.0);
    }

    #[test]
    fn hovering_an_empty_list_appends_provisionally() {
        let mut state = board(
            vec![list("a", 1024.0), list("b", 2048.0)],
            vec![card("c", "a", 1024.0)],
        );
        let mut drag = DragController::new();

        drag.drag_start(&state, &id("c"));
        assert!(drag.drag_over(&mut state, &id("c"), "b"));

        let card = state.card(&id("c")).unwrap();
        assert_eq!(card.list_id, ListId::from("b"));
        assert_eq!(card.position, 1024.0);
    }

    #[test]
    fn drag_over_within_same_list_is_a_no_op() {
        let mut state = two_lists();
        let mut drag = DragController::new();

        drag.drag_start(&state, &id("b1"));
        assert!(!drag.drag_over(&mut state, &id("b1"), "b2"));
        assert_eq!(state.card(&id("b1")).unwrap().position, 1024.0);
    }

    #[test]
    fn drop_outside_keeps_provisional_placement() {
        let mut state = two_lists();
        let mut drag = DragController::new();

        drag.drag_start(&state, &id("c"));
        drag.drag_over(&mut state, &id("c"), "b1");
        let request = drag.drag_end(&mut state, &id("c"), None);

        assert!(request.is_none());
        assert!(drag.is_idle());
        assert_eq!(state.card(&id("c")).unwrap().list_id, ListId::from("b"));
        assert_eq!(state.pending_card(), None);
    }

    #[test]
    fn drag_start_is_ignored_while_persisting() {
        let mut state = two_lists();
        let mut drag = DragController::new();

        drag.drag_start(&state, &id("c"));
        drag.drag_end(&mut state, &id("c"), Some("b")).unwrap();

        assert!(!drag.drag_start(&state, &id("c")));
        assert!(!drag.drag_start(&state, &id("b1")));

        let session = drag.settle(&mut state, &id("c")).unwrap();
        assert_eq!(session.origin_list, ListId::from("a"));
        assert!(drag.is_idle());
        assert_eq!(state.pending_card(), None);
        assert!(drag.drag_start(&state, &id("c")));
    }

    #[test]
    fn reorder_within_list_excludes_dragged_card() {
        let mut state = board(
            vec![list("a", 1024.0)],
            vec![
                card("a1", "a", 1024.0),
                card("a2", "a", 2048.0),
                card("a3", "a", 3072.0),
            ],
        );
        let mut drag = DragController::new();

        drag.drag_start(&state, &id("a1"));
        let request = drag.drag_end(&mut state, &id("a1"), Some("a3")).unwrap();

        assert_eq!(request.position, 2560.0);
        let order: Vec<&str> = state
            .cards_of(&ListId::from("a"))
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(order, vec!["a2", "a1", "a3"]);
    }

    #[test]
    fn dropping_onto_itself_keeps_its_slot() {
        let mut state = board(
            vec![list("a", 1024.0)],
            vec![card("a1", "a", 1024.0), card("a2", "a", 2048.0)],
        );
        let mut drag = DragController::new();

        drag.drag_start(&state, &id("a2"));
        let request = drag.drag_end(&mut state, &id("a2"), Some("a2")).unwrap();

        assert_eq!(request.position, 2048.0);
    }

    #[test]
    fn exhausted_precision_renumbers_target_list() {
        let tight = f64::from_bits(1.0_f64.to_bits() + 1);
        let mut state = board(
            vec![list("a", 1024.0), list("b", 2048.0)],
            vec![
                card("c", "a", 1024.0),
                card("b1", "b", 1.0),
                card("b2", "b", tight),
            ],
        );
        let mut drag = DragController::new();

        drag.drag_start(&state, &id("c"));
        let request = drag.drag_end(&mut state, &id("c"), Some("b2")).unwrap();

        assert_eq!(request.position, 1536.0);
        assert_eq!(request.renumbered.len(), 2);
        assert_eq!(state.card(&id("b1")).unwrap().position, 1024.0);
        assert_eq!(state.card(&id("b2")).unwrap().position, 2048.0);
    }

    #[test]
    fn vanished_card_leaves_siblings_untouched() {
        let tight = f64::from_bits(1.0_f64.to_bits() + 1);
        let mut state = board(
            vec![list("a", 1024.0), list("b", 2048.0)],
            vec![
                card("c", "a", 1024.0),
                card("b1", "b", 1.0),
                card("b2", "b", tight),
            ],
        );
        let mut drag = DragController::new();
        drag.drag_start(&state, &id("c"));

        // a refresh removed the dragged card
        state.replace_all(
            vec![list("a", 1024.0), list("b", 2048.0)],
            vec![card("b1", "b", 1.0), card("b2", "b", tight)],
        );

        assert!(drag.drag_end(&mut state, &id("c"), Some("b2")).is_none());
        assert!(drag.is_idle());
        assert_eq!(state.card(&id("b1")).unwrap().position, 1.0);
        assert_eq!(state.card(&id("b2")).unwrap().position, tight);
        assert_eq!(state.pending_card(), None);
    }

    #[test]
    fn unknown_targets_are_ignored() {
        let mut state = two_lists();
        let mut drag = DragController::new();

        drag.drag_start(&state, &id("c"));
        assert!(!drag.drag_over(&mut state, &id("c"), "nowhere"));
        assert!(drag.drag_end(&mut state, &id("c"), Some("nowhere")).is_none());
        assert_eq!(state.card(&id("c")).unwrap().list_id, ListId::from("a"));
        assert!(drag.is_idle());
    }
}
