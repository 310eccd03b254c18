//! Per-session change-notification hub.
//!
//! Each session gets its own broadcast channel, created lazily on the first
//! subscription. Subscribing yields a lazy, unbounded sequence of server
//! events; dropping the receiver releases the subscription, and channels with
//! no remaining subscribers are pruned on the next broadcast.

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dto::sse::ServerEvent;

/// Registry of per-session broadcast channels.
pub struct SessionHub {
    channels: DashMap<Uuid, broadcast::Sender<ServerEvent>>,
    capacity: usize,
}

impl SessionHub {
    /// Build a hub whose per-session channels buffer `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity,
        }
    }

    /// Register a subscriber for one session's event sequence.
    pub fn subscribe(&self, session_id: Uuid) -> broadcast::Receiver<ServerEvent> {
        self.channels
            .entry(session_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Send an event to every subscriber of the session, if any.
    pub fn broadcast(&self, session_id: Uuid, event: ServerEvent) {
        let Some(sender) = self.channels.get(&session_id) else {
            return;
        };

        if sender.send(event).is_err() {
            // Last subscriber is gone; drop the channel.
            drop(sender);
            self.channels
                .remove_if(&session_id, |_, sender| sender.receiver_count() == 0);
        }
    }

    /// Number of sessions with a live channel (tests and diagnostics).
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
