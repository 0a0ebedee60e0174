//! All things related to the storage of notes, notifications and users
//!
//! The storage is the only source of mutual exclusion for moderation: every
//! state transition goes through a conditional update guarded by the current
//! row state, never through an in-process lock.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::notes::NewMedia;
use crate::notes::Note;
use crate::notes::NoteStatus;
use crate::notifications::Notification;
use crate::notifications::NotificationKind;
use crate::users::Role;
use crate::users::User;

pub use memory::Memory;

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

/// Setup the storage
#[cfg(not(feature = "postgres"))]
#[allow(clippy::unused_async)]
pub async fn setup() -> Memory {
    Memory::new()
}

/// Setup the storage
#[cfg(feature = "postgres")]
pub async fn setup() -> postgres::Postgres {
    postgres::Postgres::new().await
}

/// Storage errors
#[derive(Debug, Error)]
pub enum Error {
    /// A connection error with the storage
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Values to create a User
pub struct CreateUserValues<'a> {
    /// The initial session ID for the user
    pub session_id: &'a Uuid,

    /// The role of the user
    pub role: Role,

    /// The username
    pub username: &'a str,

    /// The hashed password
    pub hashed_password: &'a str,
}

/// Values to create a Note
///
/// The media set is stored together with the note; composition rules are
/// enforced by the moderation engine before this reaches storage
pub struct CreateNoteValues<'a> {
    /// The author of the note
    pub author: &'a User,

    /// Title, already trimmed and validated
    pub title: &'a str,

    /// Content, already trimmed and validated
    pub content: &'a str,

    /// The media attachments
    pub media: &'a [NewMedia],
}

/// Values for an author edit of a pending note
pub struct EditNoteValues<'a> {
    /// The author performing the edit, part of the update guard
    pub author_id: &'a Uuid,

    /// New (optional) title
    pub title: Option<&'a str>,

    /// New (optional) content
    pub content: Option<&'a str>,

    /// New (optional) media set
    ///
    /// When present the previous attachments are deleted and replaced
    pub media: Option<&'a [NewMedia]>,
}

/// Filter for the review listing
#[derive(Default)]
pub struct ReviewFilter<'a> {
    /// Only notes with this status
    pub status: Option<NoteStatus>,

    /// Case-insensitive title keyword
    pub keyword: Option<&'a str>,
}

/// A page request, 1-based
#[derive(Clone, Copy)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    /// Number of rows to skip
    pub fn offset(self) -> usize {
        let number = self.number.max(1) as usize;
        (number - 1) * self.size as usize
    }
}

/// Values to create a Notification
pub struct CreateNotificationValues<'a> {
    /// The recipient
    pub user_id: &'a Uuid,

    /// Kind of the notification
    pub kind: NotificationKind,

    /// Human readable message
    pub content: &'a str,

    /// The entity the notification is about, e.g. the note ID
    pub related_entity_id: Option<&'a Uuid>,
}

/// Storage with all supported operations
#[async_trait]
pub trait Storage: Clone + Send + Sync + 'static {
    /// Find any single user
    ///
    /// Respects the soft-delete
    async fn find_any_single_user(&self) -> Result<Option<User>>;

    /// Finds a single user by its username
    ///
    /// Respects the soft-delete
    async fn find_single_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Finds a single user by its ID
    ///
    /// Respects the soft-delete
    async fn find_single_user_by_id(&self, id: &Uuid) -> Result<Option<User>>;

    /// Create a single user
    async fn create_user(&self, values: &CreateUserValues) -> Result<User>;

    /// Create a note with its media set, status starts out as pending
    async fn create_note(&self, values: &CreateNoteValues) -> Result<Note>;

    /// Find a single note by its ID
    ///
    /// Respects the soft-delete
    async fn find_single_note_by_id(&self, id: &Uuid) -> Result<Option<Note>>;

    /// Find a single note by its ID, deleted or not
    ///
    /// Moderator audit path, handle with care
    async fn find_single_note_by_id_unchecked(&self, id: &Uuid) -> Result<Option<Note>>;

    /// Apply an author edit, only when the note is still pending
    ///
    /// The update is guarded by note ID, author ID and `status = pending`;
    /// `None` means the guard matched no row (missing, deleted, not owned,
    /// or no longer pending)
    async fn update_note_if_pending(
        &self,
        note_id: &Uuid,
        values: &EditNoteValues,
    ) -> Result<Option<Note>>;

    /// Transition a pending note to a new status
    ///
    /// The update is guarded by `status = pending`; `None` means the guard
    /// matched no row, so a concurrent transition won the race
    async fn set_note_status_if_pending(
        &self,
        note_id: &Uuid,
        status: NoteStatus,
        reject_reason: Option<&str>,
    ) -> Result<Option<Note>>;

    /// Soft-delete a note, whatever its status
    ///
    /// Guarded by `is_deleted = false`: deleting an already deleted note
    /// matches no row and returns `None`
    async fn soft_delete_note(&self, note_id: &Uuid) -> Result<Option<Note>>;

    /// Page through approved, not deleted notes, newest first
    ///
    /// An optional keyword filters on the title, case-insensitive
    async fn find_approved_notes(
        &self,
        keyword: Option<&str>,
        page: Page,
    ) -> Result<(Vec<Note>, u64)>;

    /// Page through the notes of one author, newest first
    ///
    /// Respects the soft-delete
    async fn find_notes_by_author(&self, author_id: &Uuid, page: Page)
    -> Result<(Vec<Note>, u64)>;

    /// Page through notes for the review desk, newest first
    ///
    /// DOES NOT respect the soft-delete: deleted notes stay visible here
    /// for audit
    async fn find_notes_for_review(
        &self,
        filter: &ReviewFilter,
        page: Page,
    ) -> Result<(Vec<Note>, u64)>;

    /// Append a notification record
    async fn create_notification(&self, values: &CreateNotificationValues)
    -> Result<Notification>;

    /// Page through the notifications of one user, newest first
    async fn find_notifications_by_user(
        &self,
        user_id: &Uuid,
        page: Page,
    ) -> Result<(Vec<Notification>, u64)>;

    /// Mark a single notification as read, only when owned by the user
    ///
    /// Returns the number of affected rows; `0` means not found or not owned
    async fn mark_notification_read(&self, notification_id: &Uuid, user_id: &Uuid) -> Result<u64>;

    /// Mark all unread notifications of a user as read
    ///
    /// Returns the number of affected rows, which may be `0`
    async fn mark_all_notifications_read(&self, user_id: &Uuid) -> Result<u64>;

    /// Count the unread notifications of a user
    async fn count_unread_notifications(&self, user_id: &Uuid) -> Result<u64>;
}
