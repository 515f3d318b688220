//! Merges authoritative snapshots into live state.
//!
//! Every change notification starts a fresh fetch and receives a
//! monotonically increasing [`FetchTicket`]. Only the most recently issued
//! ticket may be applied; completions of older fetches are dropped so a slow
//! response can never overwrite a newer one.

use crate::domain::{BoardSnapshot, CardId};

use super::state::BoardState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchTicket(u64);

impl std::fmt::Display for FetchTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    Applied {
        preserved: Option<CardId>,
        dropped: usize,
    },
    Superseded,
}

#[derive(Debug, Default)]
pub struct SyncReconciler {
    issued: u64,
    settled: u64,
    applied: Option<u64>,
}

impl SyncReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.issued
    }

    pub fn last_applied(&self) -> Option<FetchTicket> {
        self.applied.map(FetchTicket)
    }

    /// Whether the most recently issued fetch has yet to complete.
    pub fn fetch_in_flight(&self) -> bool {
        self.settled < self.issued
    }

    /// Records a failed fetch. Returns whether it was the latest one, i.e.
    /// whether the failure is worth reporting.
    pub fn fail(&mut self, ticket: FetchTicket) -> bool {
        self.settled = self.settled.max(ticket.0);
        self.is_current(ticket)
    }

    /// Applies `snapshot` if `ticket` is the latest fetch, protecting the
    /// pending card.
    pub fn merge(
        &mut self,
        state: &mut BoardState,
        ticket: FetchTicket,
        snapshot: BoardSnapshot,
    ) -> MergeOutcome {
        self.settled = self.settled.max(ticket.0);
        if !self.is_current(ticket) {
            tracing::debug!(
                ticket = %ticket,
                latest = self.issued,
                "Discarding superseded snapshot"
            );
            return MergeOutcome::Superseded;
        }

        let (preserved, dropped) = merge_snapshot(state, snapshot);
        self.applied = Some(ticket.0);
        tracing::debug!(
            ticket = %ticket,
            preserved = ?preserved,
            dropped,
            "Snapshot merged"
        );
        MergeOutcome::Applied { preserved, dropped }
    }
}

/// Replaces `state` wholesale from `snapshot`, except that a card pending
/// persistence keeps its local list and position, and siblings renumbered for
/// that move keep their new positions. Returns the preserved card id (if any)
/// and the number of orphaned cards dropped.
pub fn merge_snapshot(state: &mut BoardState, snapshot: BoardSnapshot) -> (Option<CardId>, usize) {
    let BoardSnapshot { lists, mut cards } = snapshot;

    for update in state.pending_siblings() {
        if let Some(fetched) = cards
            .iter_mut()
            .find(|c| c.id == update.card_id && c.list_id == update.list_id)
        {
            fetched.position = update.position;
        }
    }

    let local = state
        .pending_card()
        .and_then(|id| state.card(id))
        .cloned();

    let Some(local) = local else {
        return (None, state.replace_all(lists, cards));
    };

    let fetched = cards
        .iter()
        .position(|c| c.id == local.id)
        .map(|idx| cards.swap_remove(idx));

    let dropped = state.replace_all(lists, cards);

    if state.upsert_card(local.clone()) {
        return (Some(local.id), dropped);
    }

    // The local target list vanished server-side; fall back to the fetched
    // record so the card does not disappear.
    match fetched {
        Some(record) => {
            tracing::warn!(
                card_id = %local.id,
                list_id = %local.list_id,
                "Pending card's list is gone, taking authoritative record"
            );
            let kept = state.upsert_card(record);
            (None, dropped + usize::from(!kept))
        }
        None => (None, dropped + 1),
    }
}
