//! Session-level events
//!
//! The HTTP client has no access to the store, so it announces forced
//! logouts here. Subscribers (the service layer, the CLI) react to them.
//!
//! ```
//! use libportal::events::{Event, EventBus};
//!
//! let bus = EventBus::new(16);
//! let mut receiver = bus.subscribe();
//! bus.emit(Event::SessionExpired {
//!     redirect_to: "/admin/login".to_string(),
//! });
//! assert!(receiver.try_recv().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::Role;

pub type EventReceiver = broadcast::Receiver<Event>;

/// Broadcast bus; emitting with no subscribers is a no-op
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: Event) {
        // Err only means nobody is listening
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A request was rejected with 401; the session has already been cleared
    SessionExpired { redirect_to: String },

    SignedIn { user_id: String, role: Role },

    SignedOut,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_does_not_fail() {
        let bus = EventBus::new(4);
        assert_eq!(bus.subscriber_count(), 0);
        bus.emit(Event::SignedOut);
    }

    #[tokio::test]
    async fn test_all_subscribers_receive_events() {
        let bus = EventBus::new(4);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.emit(Event::SignedIn {
            user_id: "7".to_string(),
            role: Role::Staff,
        });

        assert_eq!(first.recv().await.unwrap(), second.recv().await.unwrap());
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let json = serde_json::to_value(Event::SessionExpired {
            redirect_to: "/admin/login".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "session_expired");
        assert_eq!(json["redirect_to"], "/admin/login");
    }
}
