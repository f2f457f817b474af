//! Stream-based store subscriptions.
//!
//! A [`Subscription`] is the consuming end of a store listener: a spawned
//! forwarder task decodes snapshots from the store's watch channel and
//! delivers them through an mpsc channel, exposed to callers as a
//! [`futures::Stream`]. Dropping or closing the subscription cancels the
//! forwarder and releases the listener's path synchronously, so a new
//! subscription on the same path can be created right away.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::store::{WatcherMap, lock_watchers};

/// Buffered snapshots before the forwarder blocks on a slow consumer.
const SNAPSHOT_BUFFER: usize = 16;

/// Releases a listener's path entry in the store's watcher map on drop.
///
/// Removing the entry also drops the watch sender, which wakes the forwarder
/// task so it can exit even if the cancellation token is never touched.
pub(crate) struct ListenerGuard {
    watchers: WatcherMap,
    path: String,
}

impl ListenerGuard {
    pub(crate) fn new(watchers: WatcherMap, path: String) -> Self {
        Self { watchers, path }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        lock_watchers(&self.watchers).remove(&self.path);
        debug!(path = %self.path, "listener released");
    }
}

/// A stream of decoded snapshots from one store path.
///
/// Yields the current snapshot first (when the path holds decodable data),
/// then every subsequent change. The stream ends when the subscription is
/// cancelled; it never yields errors, since undecodable or missing data is
/// simply skipped.
pub struct Subscription<T> {
    receiver: mpsc::Receiver<T>,
    handle: JoinHandle<()>,
    cancel: CancellationToken,
    _guard: ListenerGuard,
}

impl<T: Send + 'static> Subscription<T> {
    /// Spawn the forwarder task for a freshly registered listener.
    pub(crate) fn spawn<F>(
        path: &str,
        mut snapshots: watch::Receiver<Option<Value>>,
        guard: ListenerGuard,
        decode: F,
    ) -> Self
    where
        F: Fn(&Value) -> Option<T> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
        let cancel = CancellationToken::new();
        let task_token = cancel.clone();
        let task_path = path.to_string();

        let handle = tokio::spawn(async move {
            loop {
                // Decode outside the borrow so the watch slot is not held
                // across the send await.
                let item = snapshots
                    .borrow_and_update()
                    .as_ref()
                    .and_then(|value| decode(value));
                if let Some(item) = item {
                    if tx.send(item).await.is_err() {
                        break;
                    }
                }
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    changed = snapshots.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!(path = %task_path, "subscription forwarder stopped");
        });

        Self {
            receiver: rx,
            handle,
            cancel,
            _guard: guard,
        }
    }
}

impl<T> Subscription<T> {
    /// Stop the subscription and release its path.
    pub fn close(self) {
        self.cancel.cancel();
        // Dropping self releases the path via the guard.
    }

    /// Whether the forwarder task is still running.
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Token cancelled when the subscription shuts down.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.receiver.poll_recv(cx)
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use futures::StreamExt;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn stream_yields_decoded_snapshots_in_order() {
        let store = Store::new();
        let mut sub = store
            .subscribe("sensorData", |v| v["temperature"].as_f64())
            .await
            .unwrap();

        for temperature in [20.0, 21.0, 22.0] {
            store
                .write("sensorData", json!({ "temperature": temperature }))
                .await
                .unwrap();
            assert_eq!(sub.next().await, Some(temperature));
        }
    }

    #[tokio::test]
    async fn drop_stops_forwarder() {
        let store = Store::new();
        let sub = store
            .subscribe("alerts", |v| Some(v.clone()))
            .await
            .unwrap();
        let token = sub.cancellation_token().clone();
        drop(sub);
        // The forwarder observes cancellation without any further writes.
        tokio::time::timeout(Duration::from_secs(1), token.cancelled())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn removal_is_observed_as_snapshot_change() {
        let store = Store::new();
        store
            .write("alerts/alert-1", json!({"message": "High humidity detected"}))
            .await
            .unwrap();

        let mut sub = store
            .subscribe("alerts", |v| {
                v.as_object().map(|alerts| alerts.len())
            })
            .await
            .unwrap();
        assert_eq!(sub.next().await, Some(1));

        store.write("alerts/alert-1", Value::Null).await.unwrap();
        assert_eq!(sub.next().await, Some(0));
    }
}
