//! In-process real-time store session.
//!
//! The [`Store`] is a path-addressed JSON tree with per-path change
//! notification, standing in for the hosted real-time database the farm
//! dashboard talks to. It is an explicit session object owned by the
//! composition root; there are no module-level handles or import-time side
//! effects.
//!
//! Paths are slash-separated segment strings (see [`crate::paths`]).
//! Writing replaces the value at a path atomically from the caller's
//! perspective; writing `null` deletes the entry, which collection
//! subscribers observe as removal. There is no merge, retry, batching, or
//! offline queueing, and concurrent writers on the same path race with
//! last-write-wins semantics.
//!
//! Snapshots are fanned out through per-path `watch` channels: a subscriber
//! always sees snapshots for its path in write order, though a slow
//! subscriber may skip intermediate ones. No ordering is guaranteed across
//! different paths.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use tokio::sync::{RwLock, watch};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::paths::overlaps;
use crate::subscription::{ListenerGuard, Subscription};

/// Map of live listeners, keyed by logical path.
pub(crate) type WatcherMap = Arc<Mutex<HashMap<String, watch::Sender<Option<Value>>>>>;

/// A handle to the real-time store.
///
/// Cheap to clone; all clones address the same tree. Create one per
/// application in the composition root and pass it (or a typed client built
/// on it) to whichever component needs store access.
#[derive(Debug, Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    tree: RwLock<Value>,
    watchers: WatcherMap,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                tree: RwLock::new(Value::Object(Map::new())),
                watchers: Arc::default(),
            }),
        }
    }

    /// Read the current value at `path`, if any.
    ///
    /// Returns `None` for absent paths and for explicit `null` entries; the
    /// two are indistinguishable to readers, matching removal semantics.
    pub async fn get(&self, path: &str) -> Option<Value> {
        let tree = self.inner.tree.read().await;
        value_at(&tree, path).cloned()
    }

    /// Replace the value at `path`.
    ///
    /// Writing [`Value::Null`] deletes the entry. Subscribers whose path
    /// overlaps the written path receive a fresh snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecord`] if an intermediate node on the path
    /// exists but is not an object.
    pub async fn write(&self, path: &str, value: Value) -> Result<()> {
        let mut tree = self.inner.tree.write().await;
        set_at(&mut tree, path, value)?;
        debug!(path, "store write");
        // Notify while still holding the write guard so snapshot delivery
        // order matches write order on every path.
        self.notify(&tree, path);
        Ok(())
    }

    /// Serialize `record` and replace the value at `path` with it.
    pub async fn write_record<T: serde::Serialize>(&self, path: &str, record: &T) -> Result<()> {
        self.write(path, serde_json::to_value(record)?).await
    }

    /// Create a new uniquely-keyed child entry under `path`.
    ///
    /// Returns the generated key.
    pub async fn push(&self, path: &str, value: Value) -> Result<String> {
        let key = Uuid::new_v4().to_string();
        self.write(&format!("{path}/{key}"), value).await?;
        Ok(key)
    }

    /// Subscribe to snapshots of the subtree at `path`.
    ///
    /// The current snapshot is delivered first (if the path holds data),
    /// then every subsequent change at or below the path. Snapshots the
    /// `decode` function rejects are skipped, never surfaced as errors:
    /// missing or undecodable data is "no update".
    ///
    /// # Errors
    ///
    /// Returns [`Error::ListenerActive`] if a subscription for `path` is
    /// already live; at most one listener per logical path is allowed. The
    /// path is released as soon as the previous subscription is dropped or
    /// closed.
    pub async fn subscribe<T, F>(&self, path: &str, decode: F) -> Result<Subscription<T>>
    where
        T: Send + 'static,
        F: Fn(&Value) -> Option<T> + Send + 'static,
    {
        // Hold the tree lock across registration so no write can slip
        // between reading the initial snapshot and installing the watcher.
        let tree = self.inner.tree.read().await;
        let receiver = {
            let mut watchers = lock_watchers(&self.inner.watchers);
            if watchers.contains_key(path) {
                return Err(Error::ListenerActive {
                    path: path.to_string(),
                });
            }
            let initial = value_at(&tree, path).cloned();
            let (tx, rx) = watch::channel(initial);
            watchers.insert(path.to_string(), tx);
            rx
        };
        drop(tree);

        let guard = ListenerGuard::new(Arc::clone(&self.inner.watchers), path.to_string());
        Ok(Subscription::spawn(path, receiver, guard, decode))
    }

    /// Send fresh snapshots to every watcher overlapping `written`.
    fn notify(&self, tree: &Value, written: &str) {
        let watchers = lock_watchers(&self.inner.watchers);
        for (path, sender) in watchers.iter() {
            if overlaps(path, written) {
                // Ignore send errors: the forwarder may be mid-shutdown.
                let _ = sender.send(value_at(tree, path).cloned());
            }
        }
    }
}

/// Lock the watcher map, recovering from a poisoned lock.
pub(crate) fn lock_watchers(
    watchers: &Mutex<HashMap<String, watch::Sender<Option<Value>>>>,
) -> std::sync::MutexGuard<'_, HashMap<String, watch::Sender<Option<Value>>>> {
    watchers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Look up the node at a slash-separated path.
fn value_at<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = tree;
    for segment in path.split('/') {
        node = node.as_object()?.get(segment)?;
    }
    if node.is_null() { None } else { Some(node) }
}

/// Set (or delete, for `null`) the node at a slash-separated path,
/// creating intermediate objects as needed.
fn set_at(tree: &mut Value, path: &str, value: Value) -> Result<()> {
    let mut segments = path.split('/').peekable();
    let mut node = tree;
    while let Some(segment) = segments.next() {
        let map = node.as_object_mut().ok_or_else(|| {
            Error::invalid_record(path, "intermediate node is not an object")
        })?;
        if segments.peek().is_none() {
            if value.is_null() {
                map.remove(segment);
            } else {
                map.insert(segment.to_string(), value);
            }
            return Ok(());
        }
        node = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn write_then_get() {
        let store = Store::new();
        store
            .write("sensorData", json!({"temperature": 24.5}))
            .await
            .unwrap();
        let value = store.get("sensorData").await.unwrap();
        assert_eq!(value["temperature"], json!(24.5));
    }

    #[tokio::test]
    async fn deep_write_creates_intermediate_objects() {
        let store = Store::new();
        store
            .write("equipment/lighting-led/power", json!(85))
            .await
            .unwrap();
        assert_eq!(
            store.get("equipment/lighting-led/power").await,
            Some(json!(85))
        );
        let collection = store.get("equipment").await.unwrap();
        assert!(collection["lighting-led"].is_object());
    }

    #[tokio::test]
    async fn null_write_deletes_entry() {
        let store = Store::new();
        store.write("alerts/alert-1", json!({"type": "info"})).await.unwrap();
        store.write("alerts/alert-1", Value::Null).await.unwrap();
        assert_eq!(store.get("alerts/alert-1").await, None);
        // The parent collection no longer carries the key at all.
        let alerts = store.get("alerts").await.unwrap();
        assert!(alerts.as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn write_through_scalar_is_an_error() {
        let store = Store::new();
        store.write("sensorData", json!(42)).await.unwrap();
        let err = store
            .write("sensorData/temperature", json!(24.5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { .. }));
    }

    #[tokio::test]
    async fn push_generates_unique_keys() {
        let store = Store::new();
        let a = store.push("alerts", json!({"n": 1})).await.unwrap();
        let b = store.push("alerts", json!({"n": 2})).await.unwrap();
        assert_ne!(a, b);
        let alerts = store.get("alerts").await.unwrap();
        assert_eq!(alerts.as_object().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn subscriber_sees_initial_then_changes() {
        let store = Store::new();
        store.write("sensorData", json!({"temperature": 24.5})).await.unwrap();

        let mut sub = store
            .subscribe("sensorData", |v| v["temperature"].as_f64())
            .await
            .unwrap();
        assert_eq!(sub.next().await, Some(24.5));

        store.write("sensorData", json!({"temperature": 27.0})).await.unwrap();
        assert_eq!(sub.next().await, Some(27.0));
    }

    #[tokio::test]
    async fn subscriber_below_write_path_is_notified() {
        let store = Store::new();
        store
            .write("equipment/heating-main", json!({"power": 60}))
            .await
            .unwrap();

        let mut sub = store
            .subscribe("equipment", |v| {
                v["heating-main"]["power"].as_u64()
            })
            .await
            .unwrap();
        assert_eq!(sub.next().await, Some(60));

        store
            .write("equipment/heating-main/power", json!(70))
            .await
            .unwrap();
        assert_eq!(sub.next().await, Some(70));
    }

    #[tokio::test]
    async fn missing_data_is_not_delivered() {
        let store = Store::new();
        let mut sub = store
            .subscribe("gasData", |v| v["co"].as_f64())
            .await
            .unwrap();

        // Nothing at the path yet: the stream stays silent.
        store.write("sensorData", json!({"temperature": 20.0})).await.unwrap();
        store.write("gasData", json!({"co": 2.0})).await.unwrap();
        // The first item delivered is the first decodable snapshot.
        assert_eq!(sub.next().await, Some(2.0));
    }

    #[tokio::test]
    async fn second_listener_on_live_path_is_rejected() {
        let store = Store::new();
        let sub = store.subscribe("alerts", |v| Some(v.clone())).await.unwrap();
        let second = store.subscribe::<Value, _>("alerts", |v| Some(v.clone())).await;
        assert!(matches!(second, Err(Error::ListenerActive { .. })));

        // Releasing the first listener frees the path immediately.
        drop(sub);
        store.subscribe("alerts", |v| Some(v.clone())).await.unwrap();
    }

    #[tokio::test]
    async fn closed_subscription_stops_delivery() {
        let store = Store::new();
        let sub = store
            .subscribe("sensorData", |v| v["temperature"].as_f64())
            .await
            .unwrap();
        sub.close();

        // The path is free again and new writes go to the new listener only.
        let mut sub2 = store
            .subscribe("sensorData", |v| v["temperature"].as_f64())
            .await
            .unwrap();
        store.write("sensorData", json!({"temperature": 21.0})).await.unwrap();
        assert_eq!(sub2.next().await, Some(21.0));
    }
}
