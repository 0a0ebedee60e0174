//! Live notification channel
//!
//! Keeps an in-memory directory of which user currently owns which
//! WebSocket connection, and pushes notification events over it. Delivery
//! here is best-effort only: the persisted notification record is the
//! durable path, a missed push is picked up by polling.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::naive::NaiveDateTime;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::notifications::Notification;
use crate::notifications::NotificationKind;

/// Event payloads pushed over the live channel
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event")]
pub enum LiveEvent {
    /// A new notification was persisted for the user
    #[serde(rename = "newNotification", rename_all = "camelCase")]
    NewNotification {
        id: Uuid,
        #[serde(rename = "type")]
        kind: NotificationKind,
        content: String,
        related_entity_id: Option<Uuid>,
        is_read: bool,
        created_at: NaiveDateTime,
    },

    /// A single notification was marked as read, for multi-tab consistency
    #[serde(rename = "NOTIFICATION_READ", rename_all = "camelCase")]
    NotificationRead { notification_id: Uuid },

    /// All notifications of the user were marked as read
    #[serde(rename = "ALL_NOTIFICATIONS_READ")]
    AllNotificationsRead,
}

impl LiveEvent {
    /// Live payload for a freshly persisted notification
    pub fn from_notification(notification: &Notification) -> Self {
        Self::NewNotification {
            id: notification.id,
            kind: notification.kind,
            content: notification.content.clone(),
            related_entity_id: notification.related_entity_id,
            is_read: notification.is_read,
            created_at: notification.created_at,
        }
    }
}

/// A registered live connection
struct Connection {
    /// Identity of this particular connection, not of the user
    id: Uuid,

    /// Send half of the per-connection event queue
    sender: UnboundedSender<LiveEvent>,
}

/// Directory of live connections, one per user at most
///
/// Process-local shared state; the lock is only ever held for the map
/// operation itself, no I/O happens inside the critical section.
#[derive(Clone)]
pub struct ConnectionRegistry {
    connections: Arc<Mutex<HashMap<Uuid, Connection>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            connections: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register a connection for a user, returning its connection ID
    ///
    /// Last-connect-wins: a previous mapping for the same user is
    /// overwritten, its send half drops and that channel closes
    pub async fn register(&self, user_id: Uuid, sender: UnboundedSender<LiveEvent>) -> Uuid {
        let connection_id = Uuid::new_v4();

        self.connections.lock().await.insert(
            user_id,
            Connection {
                id: connection_id,
                sender,
            },
        );

        tracing::debug!("User {user_id} connected to live notifications");

        connection_id
    }

    /// Remove a connection, matched by connection identity
    ///
    /// A disconnect for a stale connection ID is a no-op, so an out of
    /// order disconnect never evicts a newer connection of the same user
    pub async fn deregister(&self, user_id: &Uuid, connection_id: &Uuid) {
        let mut connections = self.connections.lock().await;

        if connections
            .get(user_id)
            .is_some_and(|connection| &connection.id == connection_id)
        {
            connections.remove(user_id);

            tracing::debug!("User {user_id} disconnected from live notifications");
        }
    }

    /// Best-effort push of an event to the live connection of a user
    ///
    /// Returns whether the event was handed to a connection; `false` when
    /// the user has no live connection or its channel already closed
    pub async fn push(&self, user_id: &Uuid, event: LiveEvent) -> bool {
        self.connections
            .lock()
            .await
            .get(user_id)
            .is_some_and(|connection| connection.sender.send(event).is_ok())
    }

    /// Whether a user currently has a live connection
    #[cfg(test)]
    pub async fn is_connected(&self, user_id: &Uuid) -> bool {
        self.connections.lock().await.contains_key(user_id)
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::unbounded_channel;

    use super::*;

    #[tokio::test]
    async fn test_push_without_connection_is_noop() {
        let registry = ConnectionRegistry::new();

        assert!(!registry.push(&Uuid::new_v4(), LiveEvent::AllNotificationsRead).await);
    }

    #[tokio::test]
    async fn test_push_delivers_to_registered_connection() {
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();

        let (sender, mut receiver) = unbounded_channel();
        registry.register(user_id, sender).await;

        assert!(registry.push(&user_id, LiveEvent::AllNotificationsRead).await);
        assert!(matches!(
            receiver.recv().await,
            Some(LiveEvent::AllNotificationsRead)
        ));
    }

    #[tokio::test]
    async fn test_last_connect_wins() {
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();

        let (first_sender, mut first_receiver) = unbounded_channel();
        registry.register(user_id, first_sender).await;

        let (second_sender, mut second_receiver) = unbounded_channel();
        registry.register(user_id, second_sender).await;

        assert!(registry.push(&user_id, LiveEvent::AllNotificationsRead).await);

        // only the newest connection receives events
        assert!(second_receiver.recv().await.is_some());
        assert!(first_receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stale_disconnect_keeps_newer_connection() {
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();

        let (first_sender, _first_receiver) = unbounded_channel();
        let first_connection = registry.register(user_id, first_sender).await;

        let (second_sender, _second_receiver) = unbounded_channel();
        registry.register(user_id, second_sender).await;

        // the old connection disconnects after the new one registered
        registry.deregister(&user_id, &first_connection).await;

        assert!(registry.is_connected(&user_id).await);
    }

    #[tokio::test]
    async fn test_matching_disconnect_removes_connection() {
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();

        let (sender, _receiver) = unbounded_channel();
        let connection_id = registry.register(user_id, sender).await;

        registry.deregister(&user_id, &connection_id).await;

        assert!(!registry.is_connected(&user_id).await);
        assert!(!registry.push(&user_id, LiveEvent::AllNotificationsRead).await);
    }

    #[test]
    fn test_live_event_wire_format() {
        let event = LiveEvent::NotificationRead {
            notification_id: Uuid::nil(),
        };

        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "NOTIFICATION_READ");
        assert_eq!(
            json["notificationId"],
            "00000000-0000-0000-0000-000000000000"
        );

        let json = serde_json::to_value(LiveEvent::AllNotificationsRead).unwrap();
        assert_eq!(json["event"], "ALL_NOTIFICATIONS_READ");
    }
}
