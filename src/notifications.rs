//! Notification records
//!
//! Notifications are append-only: they are created exactly once per
//! triggering moderation event, only the `is_read` flag ever changes.

use chrono::naive::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Kind of a notification
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NoteApproved,
    NoteRejected,
    NoteDeleted,
    CommentReceived,
    SystemAlert,
}

#[derive(Clone, Debug)]
pub struct Notification {
    pub id: Uuid,
    /// The recipient, always the author of the related note
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub content: String,
    pub related_entity_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
