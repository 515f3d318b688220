use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::domain::Table;
use crate::ports::{ChangeCallback, ChangeNotifier, SubscriptionHandle};

pub const DEFAULT_CHANGE_FEED_CAPACITY: usize = 256;

/// Payload-free change announcement. Receivers re-fetch instead of trusting
/// any row data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableChange {
    pub table: Table,
}

pub struct ChangeFeed {
    tx: broadcast::Sender<TableChange>,
    next_id: AtomicU64,
    subscriptions: Mutex<HashMap<u64, JoinHandle<()>>>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            next_id: AtomicU64::new(1),
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    pub fn publish(&self, table: Table) {
        // no receivers is fine
        let _ = self.tx.send(TableChange { table });
    }

    /// Raw receiver, used by the SSE endpoint.
    pub fn receiver(&self) -> broadcast::Receiver<TableChange> {
        self.tx.subscribe()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CHANGE_FEED_CAPACITY)
    }
}

impl ChangeNotifier for ChangeFeed {
    fn subscribe(&self, table: Table, on_change: ChangeCallback) -> SubscriptionHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut rx = self.tx.subscribe();

        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(change) if change.table == table => on_change(),
                    Ok(_) => continue,
                    Err(RecvError::Lagged(n)) => {
                        // missed events still mean something changed
                        tracing::debug!(table = %table, skipped = n, "Change subscriber lagged");
                        on_change();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        self.subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, task);
        tracing::debug!(table = %table, subscription = id, "Change subscription added");
        SubscriptionHandle(id)
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        let task = self
            .subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&handle.0);
        if let Some(task) = task {
            task.abort();
            tracing::debug!(subscription = handle.0, "Change subscription removed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test]
    async fn subscribers_only_hear_their_table() {
        let feed = ChangeFeed::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        feed.subscribe(
            Table::Cards,
            Box::new(move || {
                let _ = tx.send(());
            }),
        );

        feed.publish(Table::Lists);
        feed.publish(Table::Cards);

        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("card change delivered")
            .unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let feed = Arc::new(ChangeFeed::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = feed.subscribe(
            Table::Lists,
            Box::new(move || {
                let _ = tx.send(());
            }),
        );
        assert_eq!(feed.subscription_count(), 1);

        feed.unsubscribe(handle);
        feed.publish(Table::Lists);

        assert_eq!(feed.subscription_count(), 0);
        let got = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(!matches!(got, Ok(Some(()))));
    }
}
