//! Notification dispatch
//!
//! Persist-then-push: every notification is written to storage first and
//! only then offered to the live channel. A client that is offline at push
//! time still finds the record on its next poll; a failed push is logged
//! and otherwise ignored.

use uuid::Uuid;

use crate::live::ConnectionRegistry;
use crate::live::LiveEvent;
use crate::notifications::Notification;
use crate::notifications::NotificationKind;
use crate::storage::CreateNotificationValues;
use crate::storage::Page;
use crate::storage::Result;
use crate::storage::Storage;

/// Dispatches notifications: durable record first, live push second
#[derive(Clone)]
pub struct NotificationDispatcher<S: Storage> {
    storage: S,
    registry: ConnectionRegistry,
}

impl<S: Storage> NotificationDispatcher<S> {
    pub fn new(storage: S, registry: ConnectionRegistry) -> Self {
        Self { storage, registry }
    }

    /// Persist a notification and push it to the user's live connection
    ///
    /// A storage failure propagates to the caller; a push failure does not,
    /// the persisted record is the source of truth
    pub async fn notify(
        &self,
        user_id: &Uuid,
        kind: NotificationKind,
        content: &str,
        related_entity_id: Option<&Uuid>,
    ) -> Result<Notification> {
        let values = CreateNotificationValues {
            user_id,
            kind,
            content,
            related_entity_id,
        };

        let notification = self.storage.create_notification(&values).await?;

        let event = LiveEvent::from_notification(&notification);
        if !self.registry.push(user_id, event).await {
            tracing::debug!("No live connection for user {user_id}, notification kept for poll");
        }

        Ok(notification)
    }

    /// Mark a single notification as read, only when owned by the user
    ///
    /// Returns the number of affected rows; the caller treats `0` as not
    /// found. The read event push is for multi-tab consistency only
    pub async fn mark_read(&self, notification_id: &Uuid, user_id: &Uuid) -> Result<u64> {
        let affected = self
            .storage
            .mark_notification_read(notification_id, user_id)
            .await?;

        if affected > 0 {
            let event = LiveEvent::NotificationRead {
                notification_id: *notification_id,
            };

            self.registry.push(user_id, event).await;
        }

        Ok(affected)
    }

    /// Mark all unread notifications of the user as read
    pub async fn mark_all_read(&self, user_id: &Uuid) -> Result<u64> {
        let affected = self.storage.mark_all_notifications_read(user_id).await?;

        self.registry
            .push(user_id, LiveEvent::AllNotificationsRead)
            .await;

        Ok(affected)
    }

    /// Count the unread notifications of the user
    pub async fn unread_count(&self, user_id: &Uuid) -> Result<u64> {
        self.storage.count_unread_notifications(user_id).await
    }

    /// Page through the notifications of the user, newest first
    pub async fn list(&self, user_id: &Uuid, page: Page) -> Result<(Vec<Notification>, u64)> {
        self.storage.find_notifications_by_user(user_id, page).await
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::unbounded_channel;

    use crate::storage::Memory;

    use super::*;

    fn dispatcher() -> (NotificationDispatcher<Memory>, ConnectionRegistry) {
        let registry = ConnectionRegistry::new();
        (
            NotificationDispatcher::new(Memory::new(), registry.clone()),
            registry,
        )
    }

    #[tokio::test]
    async fn test_notify_persists_before_push() {
        let (dispatcher, registry) = dispatcher();
        let user_id = Uuid::new_v4();

        let (sender, mut receiver) = unbounded_channel();
        registry.register(user_id, sender).await;

        let notification = dispatcher
            .notify(&user_id, NotificationKind::NoteApproved, "approved", None)
            .await
            .unwrap();

        // the pushed event carries the already persisted record
        match receiver.recv().await {
            Some(LiveEvent::NewNotification { id, is_read, .. }) => {
                assert_eq!(notification.id, id);
                assert!(!is_read);
            }
            other => panic!("expected newNotification, got {other:?}"),
        }

        assert_eq!(1, dispatcher.unread_count(&user_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_notify_without_connection_still_persists() {
        let (dispatcher, _registry) = dispatcher();
        let user_id = Uuid::new_v4();

        dispatcher
            .notify(&user_id, NotificationKind::NoteRejected, "rejected", None)
            .await
            .unwrap();

        assert_eq!(1, dispatcher.unread_count(&user_id).await.unwrap());

        let (notifications, total) = dispatcher
            .list(&user_id, Page { number: 1, size: 10 })
            .await
            .unwrap();
        assert_eq!(1, total);
        assert_eq!("rejected", notifications[0].content);
    }

    #[tokio::test]
    async fn test_mark_read_requires_ownership() {
        let (dispatcher, _registry) = dispatcher();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let notification = dispatcher
            .notify(&owner, NotificationKind::NoteDeleted, "deleted", None)
            .await
            .unwrap();

        assert_eq!(0, dispatcher.mark_read(&notification.id, &stranger).await.unwrap());
        assert_eq!(1, dispatcher.unread_count(&owner).await.unwrap());

        assert_eq!(1, dispatcher.mark_read(&notification.id, &owner).await.unwrap());
        assert_eq!(0, dispatcher.unread_count(&owner).await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_all_read() {
        let (dispatcher, registry) = dispatcher();
        let user_id = Uuid::new_v4();

        for content in ["one", "two", "three"] {
            dispatcher
                .notify(&user_id, NotificationKind::SystemAlert, content, None)
                .await
                .unwrap();
        }

        let (sender, mut receiver) = unbounded_channel();
        registry.register(user_id, sender).await;

        assert_eq!(3, dispatcher.mark_all_read(&user_id).await.unwrap());
        assert_eq!(0, dispatcher.unread_count(&user_id).await.unwrap());

        assert!(matches!(
            receiver.recv().await,
            Some(LiveEvent::AllNotificationsRead)
        ));

        // idempotent, affects nothing the second time
        assert_eq!(0, dispatcher.mark_all_read(&user_id).await.unwrap());
    }
}
