//! Online-presence tracking.
//!
//! Presence rows live in the platform (`online_users`, one row per user,
//! keyed by id), while live WebSocket connections are held in an in-process
//! hub so the full online list can be pushed to every viewer whenever it
//! changes. A user counts as online while their row is strictly newer than
//! the two-minute window.

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

use chrono::{Duration, Utc};
use serde_json::json;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::models::forum::OnlineUser;
use crate::platform::{PlatformResult, PresenceStore};

/// Window after the last heartbeat during which a user is shown as online.
pub const ONLINE_WINDOW_SECS: i64 = 120;

/// Registry of live WebSocket connections. Connection ids are process-local;
/// several connections may belong to one user (multiple tabs).
#[derive(Clone, Default)]
pub struct PresenceHub {
    connections: Arc<Mutex<HashMap<u64, UnboundedSender<String>>>>,
    next_id: Arc<AtomicU64>,
}

impl PresenceHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection and returns its id plus the outbound channel
    /// the socket task drains.
    pub fn register(&self) -> (u64, UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connections
            .lock()
            .expect("presence hub lock poisoned")
            .insert(id, tx);
        (id, rx)
    }

    pub fn unregister(&self, id: u64) {
        self.connections
            .lock()
            .expect("presence hub lock poisoned")
            .remove(&id);
    }

    pub fn connection_count(&self) -> usize {
        self.connections
            .lock()
            .expect("presence hub lock poisoned")
            .len()
    }

    /// Sends a frame to every live connection. Connections whose receiver is
    /// gone are dropped from the registry.
    pub fn broadcast(&self, message: &str) {
        let mut connections = self
            .connections
            .lock()
            .expect("presence hub lock poisoned");
        connections.retain(|_, tx| tx.send(message.to_string()).is_ok());
    }
}

/// Couples the durable presence rows with the live hub.
#[derive(Clone)]
pub struct PresenceTracker {
    store: Arc<dyn PresenceStore>,
    hub: PresenceHub,
}

impl PresenceTracker {
    pub fn new(store: Arc<dyn PresenceStore>, hub: PresenceHub) -> Self {
        Self { store, hub }
    }

    pub fn hub(&self) -> &PresenceHub {
        &self.hub
    }

    /// Records a heartbeat for the user. Idempotent per user.
    pub async fn touch(&self, user_id: Uuid) -> PlatformResult<()> {
        self.store.upsert(user_id, Utc::now()).await
    }

    pub async fn remove(&self, user_id: Uuid) -> PlatformResult<()> {
        self.store.remove(user_id).await
    }

    /// Users seen within the online window, newest first.
    pub async fn list_online(&self) -> PlatformResult<Vec<OnlineUser>> {
        let threshold = Utc::now() - Duration::seconds(ONLINE_WINDOW_SECS);
        let mut users = self.store.list_since(threshold).await?;
        users.sort_by(|a, b| b.last_seen_at.cmp(&a.last_seen_at));
        Ok(users)
    }

    /// Pushes the current online list to every connected viewer. Failures are
    /// logged and swallowed; presence updates must never fail a request.
    pub async fn broadcast_online_list(&self) {
        match self.list_online().await {
            Ok(users) => {
                let frame = json!({ "type": "UPDATE_LIST", "users": users });
                self.hub.broadcast(&frame.to_string());
            }
            Err(err) => {
                tracing::warn!("Failed to load online users for broadcast: {:?}", err);
            }
        }
    }
}
