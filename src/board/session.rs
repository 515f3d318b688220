//! One open board.
//!
//! A [`BoardSession`] owns the [`BoardState`] and is the only thing that ever
//! mutates it. Drag events and commands arrive from [`SessionHandle`]s on one
//! channel; change notifications and completions of the storage calls it
//! spawned arrive on another. Events are handled one at a time, so no locking
//! is involved. The session ends on `close` or once every handle is dropped.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::domain::{
    validate_title, ActivityEntry, BoardId, BoardSnapshot, Card, CardId, CardPatch, List, ListId,
    NewCard, NewList, SessionError, StoreError, Table,
};
use crate::ordering::allocate_append;
use crate::ports::{BoardStore, ChangeNotifier, SubscriptionHandle};

use super::drag::{DragController, DragEvent, DragPhase, MoveRequest};
use super::state::{BoardState, PositionUpdate};
use super::sync::{FetchTicket, MergeOutcome, SyncReconciler};
use super::view::BoardView;

pub const DEFAULT_NOTICE_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub board_id: BoardId,
    pub user_id: Option<String>,
    pub notice_capacity: usize,
}

impl SessionConfig {
    pub fn new(board_id: impl Into<BoardId>) -> Self {
        Self {
            board_id: board_id.into(),
            user_id: None,
            notice_capacity: DEFAULT_NOTICE_CAPACITY,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_notice_capacity(mut self, capacity: usize) -> Self {
        self.notice_capacity = capacity;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

enum Command {
    Drag(DragEvent),
    CreateList {
        title: String,
        reply: oneshot::Sender<Result<List, SessionError>>,
    },
    CreateCard {
        list_id: ListId,
        title: String,
        reply: oneshot::Sender<Result<Card, SessionError>>,
    },
    Refresh,
    RenumberList {
        list_id: ListId,
    },
    Close,
}

enum SessionEvent {
    Changed(Table),
    Persisted {
        request: MoveRequest,
        result: Result<(), StoreError>,
    },
    Renumbered {
        list_id: ListId,
        result: Result<(), StoreError>,
    },
    Fetched {
        ticket: FetchTicket,
        result: Result<BoardSnapshot, StoreError>,
    },
    ListCreated {
        result: Result<List, StoreError>,
        reply: oneshot::Sender<Result<List, SessionError>>,
    },
    CardCreated {
        result: Result<Card, StoreError>,
        reply: oneshot::Sender<Result<Card, SessionError>>,
    },
}

pub struct BoardSession {
    config: SessionConfig,
    store: Arc<dyn BoardStore>,
    notifier: Arc<dyn ChangeNotifier>,
    state: BoardState,
    drag: DragController,
    sync: SyncReconciler,
    subscriptions: Vec<SubscriptionHandle>,
    commands_rx: mpsc::UnboundedReceiver<Command>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    view_tx: watch::Sender<BoardView>,
    notice_tx: broadcast::Sender<Notice>,
    closed: bool,
}

impl BoardSession {
    /// Loads the board and subscribes to list and card changes.
    pub async fn open(
        config: SessionConfig,
        store: Arc<dyn BoardStore>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Result<(Self, SessionHandle), SessionError> {
        let snapshot = store.fetch_board(&config.board_id).await?;
        let state = BoardState::from_snapshot(config.board_id.clone(), snapshot);

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(state.view());
        let (notice_tx, _) = broadcast::channel(config.notice_capacity.max(1));

        let subscriptions: Vec<SubscriptionHandle> = [Table::Lists, Table::Cards]
            .into_iter()
            .map(|table| {
                let tx = events_tx.clone();
                notifier.subscribe(
                    table,
                    Box::new(move || {
                        let _ = tx.send(SessionEvent::Changed(table));
                    }),
                )
            })
            .collect();

        tracing::info!(
            board_id = %config.board_id,
            lists = state.lists().len(),
            cards = state.card_count(),
            "Board session opened"
        );

        let handle = SessionHandle {
            tx: commands_tx,
            view_rx,
            notice_tx: notice_tx.clone(),
        };

        let session = Self {
            config,
            store,
            notifier,
            state,
            drag: DragController::new(),
            sync: SyncReconciler::new(),
            subscriptions,
            commands_rx,
            events_tx,
            events_rx,
            view_tx,
            notice_tx,
            closed: false,
        };

        Ok((session, handle))
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn drag_phase(&self) -> &DragPhase {
        self.drag.phase()
    }

    /// Processes events until the session is closed or every handle is gone.
    pub async fn run(mut self) {
        while self.step().await {}
    }

    /// Waits for and handles a single command or event. Returns `false` once
    /// closed.
    pub async fn step(&mut self) -> bool {
        if self.closed {
            return false;
        }
        tokio::select! {
            command = self.commands_rx.recv() => match command {
                Some(command) => self.handle_command(command),
                None => {
                    tracing::debug!(board_id = %self.config.board_id, "All session handles dropped");
                    self.closed = true;
                }
            },
            Some(event) = self.events_rx.recv() => self.handle_event(event),
        }
        !self.closed
    }

    fn shutdown(&mut self) {
        if self.subscriptions.is_empty() {
            return;
        }
        for handle in self.subscriptions.drain(..) {
            self.notifier.unsubscribe(handle);
        }
        tracing::info!(board_id = %self.config.board_id, "Board session closed");
    }

    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Changed(table) => {
                tracing::debug!(table = %table, "Change notification");
                self.start_fetch();
            }
            SessionEvent::Persisted { request, result } => self.on_persisted(request, result),
            SessionEvent::Renumbered { list_id, result } => {
                if let Err(e) = result {
                    tracing::warn!(list_id = %list_id, error = %e, "Failed to persist renumbering");
                    self.notify(NoticeLevel::Error, format!("Failed to reorder list: {}", e));
                    self.start_fetch();
                }
            }
            SessionEvent::Fetched { ticket, result } => self.on_fetched(ticket, result),
            SessionEvent::ListCreated { result, reply } => {
                let result = match result {
                    Ok(list) => {
                        self.state.upsert_list(list.clone());
                        self.publish();
                        self.notify(NoticeLevel::Info, "List created".into());
                        Ok(list)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to create list");
                        Err(SessionError::Store(e))
                    }
                };
                let _ = reply.send(result);
            }
            SessionEvent::CardCreated { result, reply } => {
                let result = match result {
                    Ok(card) => {
                        if self.state.upsert_card(card.clone()) {
                            self.publish();
                        }
                        self.notify(NoticeLevel::Info, "Card created".into());
                        Ok(card)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to create card");
                        Err(SessionError::Store(e))
                    }
                };
                let _ = reply.send(result);
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Drag(event) => {
                let request = self.drag.handle(&mut self.state, &event);
                self.publish();
                if let Some(request) = request {
                    self.persist_move(request);
                }
            }
            Command::CreateList { title, reply } => {
                let title = match validate_title(&title) {
                    Ok(title) => title.to_string(),
                    Err(msg) => {
                        let _ = reply.send(Err(SessionError::Validation(msg)));
                        return;
                    }
                };
                let new_list = NewList {
                    board_id: self.config.board_id.clone(),
                    title,
                    position: allocate_append(self.state.max_list_position()),
                };
                let store = Arc::clone(&self.store);
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = store.insert_list(new_list).await;
                    let _ = tx.send(SessionEvent::ListCreated { result, reply });
                });
            }
            Command::CreateCard {
                list_id,
                title,
                reply,
            } => {
                let title = match validate_title(&title) {
                    Ok(title) => title.to_string(),
                    Err(msg) => {
                        let _ = reply.send(Err(SessionError::Validation(msg)));
                        return;
                    }
                };
                if !self.state.has_list(&list_id) {
                    let _ = reply.send(Err(SessionError::Validation(format!(
                        "unknown list: {}",
                        list_id
                    ))));
                    return;
                }
                let new_card = NewCard {
                    position: allocate_append(self.state.last_card_position(&list_id)),
                    list_id,
                    title,
                    created_by: self.config.user_id.clone(),
                };
                let store = Arc::clone(&self.store);
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = store.insert_card(new_card).await;
                    let _ = tx.send(SessionEvent::CardCreated { result, reply });
                });
            }
            Command::Refresh => self.start_fetch(),
            Command::RenumberList { list_id } => self.renumber(list_id),
            Command::Close => self.closed = true,
        }
    }

    fn renumber(&mut self, list_id: ListId) {
        if !self.drag.is_idle() {
            tracing::debug!(list_id = %list_id, "Skipping renumber while a drag is active");
            return;
        }
        let updates = self.state.renumber_list(&list_id, None);
        if updates.is_empty() {
            return;
        }
        self.publish();

        let store = Arc::clone(&self.store);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = write_positions(store.as_ref(), &updates).await;
            let _ = tx.send(SessionEvent::Renumbered { list_id, result });
        });
    }

    fn persist_move(&self, request: MoveRequest) {
        let store = Arc::clone(&self.store);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = write_move(store.as_ref(), &request).await;
            let _ = tx.send(SessionEvent::Persisted { request, result });
        });
    }

    fn on_persisted(&mut self, request: MoveRequest, result: Result<(), StoreError>) {
        self.drag.settle(&mut self.state, &request.card_id);

        match result {
            Ok(()) => {
                tracing::debug!(card_id = %request.card_id, "Card move persisted");
                self.log_move(&request);
                // A fetch issued before the write landed would carry the old
                // placement now that the card is no longer protected.
                if self.sync.fetch_in_flight() {
                    self.start_fetch();
                }
            }
            Err(e) => {
                tracing::warn!(
                    card_id = %request.card_id,
                    error = %e,
                    "Failed to persist card move, resynchronizing"
                );
                self.notify(NoticeLevel::Error, format!("Failed to move card: {}", e));
                self.start_fetch();
            }
        }
    }

    fn log_move(&self, request: &MoveRequest) {
        let entry = ActivityEntry {
            board_id: self.config.board_id.clone(),
            user_id: self.config.user_id.clone(),
            action: "moved_card".into(),
            entity_type: "card".into(),
            entity_id: request.card_id.to_string(),
            metadata: serde_json::json!({
                "from_list": request.from_list,
                "to_list": request.to_list,
            }),
        };
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.insert_activity_log(entry).await {
                tracing::warn!(error = %e, "Failed to write activity log");
            }
        });
    }

    fn start_fetch(&mut self) {
        let ticket = self.sync.begin_fetch();
        let store = Arc::clone(&self.store);
        let tx = self.events_tx.clone();
        let board_id = self.config.board_id.clone();
        tracing::debug!(ticket = %ticket, "Fetching board snapshot");
        tokio::spawn(async move {
            let result = store.fetch_board(&board_id).await;
            let _ = tx.send(SessionEvent::Fetched { ticket, result });
        });
    }

    fn on_fetched(&mut self, ticket: FetchTicket, result: Result<BoardSnapshot, StoreError>) {
        match result {
            Ok(snapshot) => {
                if let MergeOutcome::Applied { .. } =
                    self.sync.merge(&mut self.state, ticket, snapshot)
                {
                    self.publish();
                }
            }
            Err(e) => {
                if self.sync.fail(ticket) {
                    tracing::warn!(ticket = %ticket, error = %e, "Failed to refresh board");
                    self.notify(NoticeLevel::Error, format!("Failed to refresh board: {}", e));
                } else {
                    tracing::debug!(ticket = %ticket, error = %e, "Superseded fetch failed");
                }
            }
        }
    }

    fn publish(&self) {
        let view = self.state.view();
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                return false;
            }
            *current = view;
            true
        });
    }

    fn notify(&self, level: NoticeLevel, message: String) {
        let _ = self.notice_tx.send(Notice { level, message });
    }
}

impl Drop for BoardSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn write_positions(
    store: &dyn BoardStore,
    updates: &[PositionUpdate],
) -> Result<(), StoreError> {
    for update in updates {
        store
            .update_card(
                &update.card_id,
                CardPatch {
                    list_id: Some(update.list_id.clone()),
                    position: Some(update.position),
                },
            )
            .await?;
    }
    Ok(())
}

async fn write_move(store: &dyn BoardStore, request: &MoveRequest) -> Result<(), StoreError> {
    write_positions(store, &request.renumbered).await?;
    store
        .update_card(
            &request.card_id,
            CardPatch {
                list_id: Some(request.to_list.clone()),
                position: Some(request.position),
            },
        )
        .await
}

/// Cheap, cloneable entry point into a running [`BoardSession`].
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Command>,
    view_rx: watch::Receiver<BoardView>,
    notice_tx: broadcast::Sender<Notice>,
}

impl SessionHandle {
    fn send(&self, command: Command) -> Result<(), SessionError> {
        self.tx.send(command).map_err(|_| SessionError::Closed)
    }

    pub fn drag(&self, event: DragEvent) -> Result<(), SessionError> {
        self.send(Command::Drag(event))
    }

    pub fn drag_start(&self, card_id: impl Into<CardId>) -> Result<(), SessionError> {
        self.drag(DragEvent::Start {
            card_id: card_id.into(),
        })
    }

    pub fn drag_over(
        &self,
        active: impl Into<CardId>,
        over: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.drag(DragEvent::Over {
            active: active.into(),
            over: over.into(),
        })
    }

    pub fn drag_end(
        &self,
        active: impl Into<CardId>,
        over: Option<String>,
    ) -> Result<(), SessionError> {
        self.drag(DragEvent::End {
            active: active.into(),
            over,
        })
    }

    pub async fn create_list(&self, title: impl Into<String>) -> Result<List, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::CreateList {
            title: title.into(),
            reply,
        })?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    pub async fn create_card(
        &self,
        list_id: impl Into<ListId>,
        title: impl Into<String>,
    ) -> Result<Card, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::CreateCard {
            list_id: list_id.into(),
            title: title.into(),
            reply,
        })?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    pub fn refresh(&self) -> Result<(), SessionError> {
        self.send(Command::Refresh)
    }

    pub fn renumber_list(&self, list_id: impl Into<ListId>) -> Result<(), SessionError> {
        self.send(Command::RenumberList {
            list_id: list_id.into(),
        })
    }

    pub fn close(&self) -> Result<(), SessionError> {
        self.send(Command::Close)
    }

    /// Change-observable projection for the rendering layer.
    pub fn view(&self) -> watch::Receiver<BoardView> {
        self.view_rx.clone()
    }

    pub fn current_view(&self) -> BoardView {
        self.view_rx.borrow().clone()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notice_tx.subscribe()
    }
}
