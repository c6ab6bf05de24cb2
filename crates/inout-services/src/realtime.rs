//! Change notification hub
//!
//! One broadcast channel per external project table. Webhooks publish into
//! it and WebSocket sessions subscribe to the table their dashboard reads.
//! Two tenants whose tables share a name never wake each other.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::broadcast;
use tracing::debug;

/// A table inside one external project
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelKey {
    /// Lowercased project host, e.g. `abc.supabase.co`
    pub project: String,
    pub table: String,
}

impl ChannelKey {
    pub fn new(project: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            project: project.into().to_ascii_lowercase(),
            table: table.into(),
        }
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project, self.table)
    }
}

/// A row change reported by the external project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub channel: ChannelKey,
    /// `INSERT`, `UPDATE` or `DELETE` as sent by the webhook
    pub kind: String,
    #[serde(default)]
    pub record: Option<Value>,
    pub received_at: DateTime<Utc>,
}

/// Per-table broadcast channels
pub struct ChangeHub {
    channels: RwLock<HashMap<ChannelKey, broadcast::Sender<ChangeEvent>>>,
    capacity: usize,
}

impl ChangeHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Receive every event published for `key` from now on
    pub fn subscribe(&self, key: &ChannelKey) -> broadcast::Receiver<ChangeEvent> {
        if let Some(sender) = self.channels.read().get(key) {
            return sender.subscribe();
        }

        self.channels
            .write()
            .entry(key.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Deliver an event; returns how many subscribers received it
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let key = event.channel.clone();
        let delivered = {
            let channels = self.channels.read();
            match channels.get(&key) {
                Some(sender) => sender.send(event).unwrap_or(0),
                None => 0,
            }
        };

        if delivered == 0 {
            self.prune(&key);
        }
        debug!(channel = %key, delivered, "Published change event");
        delivered
    }

    /// Channels currently open
    pub fn table_count(&self) -> usize {
        self.channels.read().len()
    }

    fn prune(&self, key: &ChannelKey) {
        let mut channels = self.channels.write();
        if channels
            .get(key)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            channels.remove(key);
        }
    }
}
