//!Postgres storage

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::PgPool;
use sqlx::Postgres as Pg;
use sqlx::QueryBuilder;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::notes::Media;
use crate::notes::MediaKind;
use crate::notes::Note;
use crate::notes::NoteStatus;
use crate::notifications::Notification;
use crate::notifications::NotificationKind;
use crate::users::Role;
use crate::users::User;

use super::CreateNoteValues;
use super::CreateNotificationValues;
use super::CreateUserValues;
use super::EditNoteValues;
use super::Error;
use super::Page;
use super::Result;
use super::ReviewFilter;
use super::Storage;

/// Migrator to run migrations on startup
static MIGRATOR: Migrator = sqlx::migrate!();

/// Postgres type for user role
#[derive(PartialEq, Debug, sqlx::Type)]
#[sqlx(type_name = "user_role_type")]
#[sqlx(rename_all = "kebab-case")]
enum UserRoleType {
    /// Author
    Author,

    /// Reviewer
    Reviewer,

    /// Admin
    Admin,
}

impl UserRoleType {
    /// Create user role type from role
    fn from_role(role: Role) -> Self {
        match role {
            Role::Author => UserRoleType::Author,
            Role::Reviewer => UserRoleType::Reviewer,
            Role::Admin => UserRoleType::Admin,
        }
    }

    /// Create role from user role type
    fn to_role(&self) -> Role {
        match self {
            UserRoleType::Author => Role::Author,
            UserRoleType::Reviewer => Role::Reviewer,
            UserRoleType::Admin => Role::Admin,
        }
    }
}

/// Postgres type for note status
#[derive(PartialEq, Debug, sqlx::Type)]
#[sqlx(type_name = "note_status_type")]
#[sqlx(rename_all = "snake_case")]
enum NoteStatusType {
    /// Waiting for a reviewer
    Pending,

    /// Publicly visible
    Approved,

    /// Rejected with a reason
    Rejected,
}

impl NoteStatusType {
    /// Create note status type from status
    fn from_status(status: NoteStatus) -> Self {
        match status {
            NoteStatus::Pending => NoteStatusType::Pending,
            NoteStatus::Approved => NoteStatusType::Approved,
            NoteStatus::Rejected => NoteStatusType::Rejected,
        }
    }

    /// Create status from note status type
    fn to_status(&self) -> NoteStatus {
        match self {
            NoteStatusType::Pending => NoteStatus::Pending,
            NoteStatusType::Approved => NoteStatus::Approved,
            NoteStatusType::Rejected => NoteStatus::Rejected,
        }
    }
}

/// Postgres type for media kind
#[derive(PartialEq, Debug, sqlx::Type)]
#[sqlx(type_name = "media_kind_type")]
#[sqlx(rename_all = "snake_case")]
enum MediaKindType {
    /// Image
    Image,

    /// Video
    Video,
}

impl MediaKindType {
    /// Create media kind type from kind
    fn from_kind(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image => MediaKindType::Image,
            MediaKind::Video => MediaKindType::Video,
        }
    }

    /// Create kind from media kind type
    fn to_kind(&self) -> MediaKind {
        match self {
            MediaKindType::Image => MediaKind::Image,
            MediaKindType::Video => MediaKind::Video,
        }
    }
}

/// Postgres type for notification kind
#[derive(PartialEq, Debug, sqlx::Type)]
#[sqlx(type_name = "notification_kind_type")]
#[sqlx(rename_all = "snake_case")]
enum NotificationKindType {
    /// Note approved
    NoteApproved,

    /// Note rejected
    NoteRejected,

    /// Note deleted
    NoteDeleted,

    /// Comment received
    CommentReceived,

    /// System alert
    SystemAlert,
}

impl NotificationKindType {
    /// Create notification kind type from kind
    fn from_kind(kind: NotificationKind) -> Self {
        match kind {
            NotificationKind::NoteApproved => NotificationKindType::NoteApproved,
            NotificationKind::NoteRejected => NotificationKindType::NoteRejected,
            NotificationKind::NoteDeleted => NotificationKindType::NoteDeleted,
            NotificationKind::CommentReceived => NotificationKindType::CommentReceived,
            NotificationKind::SystemAlert => NotificationKindType::SystemAlert,
        }
    }

    /// Create kind from notification kind type
    fn to_kind(&self) -> NotificationKind {
        match self {
            NotificationKindType::NoteApproved => NotificationKind::NoteApproved,
            NotificationKindType::NoteRejected => NotificationKind::NoteRejected,
            NotificationKindType::NoteDeleted => NotificationKind::NoteDeleted,
            NotificationKindType::CommentReceived => NotificationKind::CommentReceived,
            NotificationKindType::SystemAlert => NotificationKind::SystemAlert,
        }
    }
}

/// Postgres storage
#[derive(Clone)]
pub struct Postgres {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Postgres {
    /// Create Postgres storage
    ///
    /// Use the `DATABASE_URL` environment variable
    ///
    /// Migrations will be run
    pub async fn new() -> Self {
        let database_connection_string = std::env::var("DATABASE_URL").expect("Valid DATABASE_URL");

        let connection_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_connection_string)
            .await
            .expect("Valid connection");

        Self::new_with_pool(connection_pool).await
    }

    /// Create Postgres storage with existing pool
    ///
    /// Migrations will be run
    pub async fn new_with_pool(connection_pool: PgPool) -> Self {
        let migration_result = MIGRATOR.run(&connection_pool).await;

        if let Err(err) = migration_result {
            panic!("Migrations could not run: {err}");
        }

        Self { connection_pool }
    }

    /// Load the media sets for a batch of notes, keeping insertion order
    async fn load_notes(&self, notes: Vec<PostgresNote>) -> Result<Vec<Note>> {
        let note_ids = notes.iter().map(|note| note.id).collect::<Vec<Uuid>>();

        let mut media = sqlx::query_as::<Pg, PostgresMedia>(
            r"
            SELECT id, note_id, kind, url, thumbnail_url
            FROM note_media
            WHERE note_id = ANY($1)
            ORDER BY position
            ",
        )
        .bind(&note_ids)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(notes
            .into_iter()
            .map(|note| {
                let (own, rest) = media
                    .drain(..)
                    .partition(|attachment| attachment.note_id == note.id);
                media = rest;

                Note::from_postgres_note(note, own)
            })
            .collect())
    }

    /// Load a single optional note with its media set
    async fn load_note(&self, note: Option<PostgresNote>) -> Result<Option<Note>> {
        match note {
            Some(note) => Ok(self.load_notes(vec![note]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    /// Insert a media set for a note, preserving its order
    async fn insert_media(
        transaction: &mut sqlx::Transaction<'_, Pg>,
        note_id: &Uuid,
        media: &[crate::notes::NewMedia],
    ) -> core::result::Result<(), sqlx::Error> {
        for (position, attachment) in media.iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO note_media (id, note_id, kind, url, thumbnail_url, position)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(Uuid::new_v4())
            .bind(note_id)
            .bind(MediaKindType::from_kind(attachment.kind))
            .bind(&attachment.url)
            .bind(attachment.thumbnail_url.as_deref())
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .execute(&mut **transaction)
            .await?;
        }

        Ok(())
    }
}

/// Postgres version of user
#[derive(sqlx::FromRow)]
struct PostgresUser {
    /// User ID
    id: Uuid,

    /// Sessions ID
    session_id: Uuid,

    /// Username
    username: String,

    /// Hashed password
    hashed_password: String,

    /// User role
    role: UserRoleType,

    /// Creation date
    created_at: NaiveDateTime,

    /// Last updated at
    updated_at: NaiveDateTime,

    /// Deleted at
    deleted_at: Option<NaiveDateTime>,
}

impl User {
    /// Create user from postgres version
    fn from_postgres_user(user: PostgresUser) -> Self {
        Self {
            id: user.id,
            session_id: user.session_id,
            username: user.username,
            hashed_password: user.hashed_password,
            role: user.role.to_role(),
            created_at: user.created_at,
            updated_at: user.updated_at,
            deleted_at: user.deleted_at,
        }
    }

    /// Maybe create user from postgres version
    fn from_postgres_user_optional(user: Option<PostgresUser>) -> Option<Self> {
        user.map(Self::from_postgres_user)
    }
}

/// Postgres version of note, without its media set
#[derive(sqlx::FromRow)]
struct PostgresNote {
    /// Note ID
    id: Uuid,

    /// Author ID
    author_id: Uuid,

    /// Title
    title: String,

    /// Content
    content: String,

    /// Moderation status
    status: NoteStatusType,

    /// Reject reason
    reject_reason: Option<String>,

    /// Soft-delete flag
    is_deleted: bool,

    /// Creation date
    created_at: NaiveDateTime,

    /// Last updated at
    updated_at: NaiveDateTime,
}

/// Postgres version of a media attachment
#[derive(sqlx::FromRow)]
struct PostgresMedia {
    /// Media ID
    id: Uuid,

    /// Owning note ID
    note_id: Uuid,

    /// Kind of the attachment
    kind: MediaKindType,

    /// URL
    url: String,

    /// Thumbnail URL
    thumbnail_url: Option<String>,
}

impl Note {
    /// Create note from postgres version and its media rows
    fn from_postgres_note(note: PostgresNote, media: Vec<PostgresMedia>) -> Self {
        Self {
            id: note.id,
            author_id: note.author_id,
            title: note.title,
            content: note.content,
            status: note.status.to_status(),
            reject_reason: note.reject_reason,
            media: media
                .into_iter()
                .map(|attachment| Media {
                    id: attachment.id,
                    kind: attachment.kind.to_kind(),
                    url: attachment.url,
                    thumbnail_url: attachment.thumbnail_url,
                })
                .collect(),
            is_deleted: note.is_deleted,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

/// Postgres version of notification
#[derive(sqlx::FromRow)]
struct PostgresNotification {
    /// Notification ID
    id: Uuid,

    /// Recipient ID
    user_id: Uuid,

    /// Kind of the notification
    kind: NotificationKindType,

    /// Human readable message
    content: String,

    /// Related entity ID
    related_entity_id: Option<Uuid>,

    /// Read flag
    is_read: bool,

    /// Creation date
    created_at: NaiveDateTime,

    /// Last updated at
    updated_at: NaiveDateTime,
}

impl Notification {
    /// Create notification from postgres version
    fn from_postgres_notification(notification: PostgresNotification) -> Self {
        Self {
            id: notification.id,
            user_id: notification.user_id,
            kind: notification.kind.to_kind(),
            content: notification.content,
            related_entity_id: notification.related_entity_id,
            is_read: notification.is_read,
            created_at: notification.created_at,
            updated_at: notification.updated_at,
        }
    }
}

#[async_trait]
impl Storage for Postgres {
    async fn find_any_single_user(&self) -> Result<Option<User>> {
        let user = sqlx::query_as::<Pg, PostgresUser>(
            r"
            SELECT id, session_id, username, hashed_password, role,
                created_at, updated_at, deleted_at
            FROM users
            WHERE deleted_at IS NULL
            LIMIT 1
            ",
        )
        .fetch_optional(&self.connection_pool)
        .await
        .map(User::from_postgres_user_optional)
        .map_err(connection_error)?;

        Ok(user)
    }

    async fn find_single_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<Pg, PostgresUser>(
            r"
            SELECT id, session_id, username, hashed_password, role,
                created_at, updated_at, deleted_at
            FROM users
            WHERE deleted_at IS NULL
                AND username = $1
            LIMIT 1
            ",
        )
        .bind(username)
        .fetch_optional(&self.connection_pool)
        .await
        .map(User::from_postgres_user_optional)
        .map_err(connection_error)?;

        Ok(user)
    }

    async fn find_single_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<Pg, PostgresUser>(
            r"
            SELECT id, session_id, username, hashed_password, role,
                created_at, updated_at, deleted_at
            FROM users
            WHERE deleted_at IS NULL
                AND id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map(User::from_postgres_user_optional)
        .map_err(connection_error)?;

        Ok(user)
    }

    async fn create_user(&self, values: &CreateUserValues) -> Result<User> {
        let user = sqlx::query_as::<Pg, PostgresUser>(
            r"
            INSERT INTO users (id, session_id, username, hashed_password, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, session_id, username, hashed_password, role,
                created_at, updated_at, deleted_at
            ",
        )
        .bind(Uuid::new_v4())
        .bind(values.session_id)
        .bind(values.username)
        .bind(values.hashed_password)
        .bind(UserRoleType::from_role(values.role))
        .fetch_one(&self.connection_pool)
        .await
        .map(User::from_postgres_user)
        .map_err(connection_error)?;

        Ok(user)
    }

    async fn create_note(&self, values: &CreateNoteValues) -> Result<Note> {
        let mut transaction = self
            .connection_pool
            .begin()
            .await
            .map_err(connection_error)?;

        let note = sqlx::query_as::<Pg, PostgresNote>(
            r"
            INSERT INTO notes (id, author_id, title, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, author_id, title, content, status, reject_reason,
                is_deleted, created_at, updated_at
            ",
        )
        .bind(Uuid::new_v4())
        .bind(values.author.id)
        .bind(values.title)
        .bind(values.content)
        .fetch_one(&mut *transaction)
        .await
        .map_err(connection_error)?;

        Self::insert_media(&mut transaction, &note.id, values.media)
            .await
            .map_err(connection_error)?;

        transaction.commit().await.map_err(connection_error)?;

        self.load_note(Some(note))
            .await?
            .ok_or_else(|| Error::Connection("Created note disappeared".to_string()))
    }

    async fn find_single_note_by_id(&self, id: &Uuid) -> Result<Option<Note>> {
        let note = sqlx::query_as::<Pg, PostgresNote>(
            r"
            SELECT id, author_id, title, content, status, reject_reason,
                is_deleted, created_at, updated_at
            FROM notes
            WHERE is_deleted = FALSE
                AND id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        self.load_note(note).await
    }

    async fn find_single_note_by_id_unchecked(&self, id: &Uuid) -> Result<Option<Note>> {
        let note = sqlx::query_as::<Pg, PostgresNote>(
            r"
            SELECT id, author_id, title, content, status, reject_reason,
                is_deleted, created_at, updated_at
            FROM notes
            WHERE id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        self.load_note(note).await
    }

    async fn update_note_if_pending(
        &self,
        note_id: &Uuid,
        values: &EditNoteValues,
    ) -> Result<Option<Note>> {
        let mut transaction = self
            .connection_pool
            .begin()
            .await
            .map_err(connection_error)?;

        // the row guard carries the whole edit precondition
        let note = sqlx::query_as::<Pg, PostgresNote>(
            r"
            UPDATE notes
            SET title = COALESCE($1, title),
                content = COALESCE($2, content),
                reject_reason = NULL,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $3
                AND author_id = $4
                AND status = 'pending'
                AND is_deleted = FALSE
            RETURNING id, author_id, title, content, status, reject_reason,
                is_deleted, created_at, updated_at
            ",
        )
        .bind(values.title)
        .bind(values.content)
        .bind(note_id)
        .bind(values.author_id)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(connection_error)?;

        let Some(note) = note else {
            transaction.rollback().await.map_err(connection_error)?;

            return Ok(None);
        };

        // a patched media set replaces the previous attachments wholesale
        if let Some(media) = values.media {
            sqlx::query("DELETE FROM note_media WHERE note_id = $1")
                .bind(note_id)
                .execute(&mut *transaction)
                .await
                .map_err(connection_error)?;

            Self::insert_media(&mut transaction, note_id, media)
                .await
                .map_err(connection_error)?;
        }

        transaction.commit().await.map_err(connection_error)?;

        self.load_note(Some(note)).await
    }

    async fn set_note_status_if_pending(
        &self,
        note_id: &Uuid,
        status: NoteStatus,
        reject_reason: Option<&str>,
    ) -> Result<Option<Note>> {
        let note = sqlx::query_as::<Pg, PostgresNote>(
            r"
            UPDATE notes
            SET status = $1,
                reject_reason = $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $3
                AND status = 'pending'
                AND is_deleted = FALSE
            RETURNING id, author_id, title, content, status, reject_reason,
                is_deleted, created_at, updated_at
            ",
        )
        .bind(NoteStatusType::from_status(status))
        .bind(reject_reason)
        .bind(note_id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        self.load_note(note).await
    }

    async fn soft_delete_note(&self, note_id: &Uuid) -> Result<Option<Note>> {
        let note = sqlx::query_as::<Pg, PostgresNote>(
            r"
            UPDATE notes
            SET is_deleted = TRUE,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
                AND is_deleted = FALSE
            RETURNING id, author_id, title, content, status, reject_reason,
                is_deleted, created_at, updated_at
            ",
        )
        .bind(note_id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        self.load_note(note).await
    }

    async fn find_approved_notes(
        &self,
        keyword: Option<&str>,
        page: Page,
    ) -> Result<(Vec<Note>, u64)> {
        let total = sqlx::query_scalar::<Pg, i64>(
            r"
            SELECT COUNT(*)
            FROM notes
            WHERE is_deleted = FALSE
                AND status = 'approved'
                AND ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
            ",
        )
        .bind(keyword)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        let notes = sqlx::query_as::<Pg, PostgresNote>(
            r"
            SELECT id, author_id, title, content, status, reject_reason,
                is_deleted, created_at, updated_at
            FROM notes
            WHERE is_deleted = FALSE
                AND status = 'approved'
                AND ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(keyword)
        .bind(i64::from(page.size))
        .bind(page.offset() as i64)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok((self.load_notes(notes).await?, total.unsigned_abs()))
    }

    async fn find_notes_by_author(
        &self,
        author_id: &Uuid,
        page: Page,
    ) -> Result<(Vec<Note>, u64)> {
        let total = sqlx::query_scalar::<Pg, i64>(
            r"
            SELECT COUNT(*)
            FROM notes
            WHERE is_deleted = FALSE
                AND author_id = $1
            ",
        )
        .bind(author_id)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        let notes = sqlx::query_as::<Pg, PostgresNote>(
            r"
            SELECT id, author_id, title, content, status, reject_reason,
                is_deleted, created_at, updated_at
            FROM notes
            WHERE is_deleted = FALSE
                AND author_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(author_id)
        .bind(i64::from(page.size))
        .bind(page.offset() as i64)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok((self.load_notes(notes).await?, total.unsigned_abs()))
    }

    async fn find_notes_for_review(
        &self,
        filter: &ReviewFilter<'_>,
        page: Page,
    ) -> Result<(Vec<Note>, u64)> {
        // deleted notes stay visible here for audit
        let mut count_query =
            QueryBuilder::<Pg>::new("SELECT COUNT(*) FROM notes WHERE TRUE");
        let mut list_query = QueryBuilder::<Pg>::new(
            "SELECT id, author_id, title, content, status, reject_reason, \
             is_deleted, created_at, updated_at FROM notes WHERE TRUE",
        );

        for query in [&mut count_query, &mut list_query] {
            if let Some(status) = filter.status {
                query
                    .push(" AND status = ")
                    .push_bind(NoteStatusType::from_status(status));
            }

            if let Some(keyword) = filter.keyword {
                query
                    .push(" AND title ILIKE '%' || ")
                    .push_bind(keyword)
                    .push(" || '%'");
            }
        }

        let total = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.connection_pool)
            .await
            .map_err(connection_error)?;

        list_query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(page.size))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let notes = list_query
            .build_query_as::<PostgresNote>()
            .fetch_all(&self.connection_pool)
            .await
            .map_err(connection_error)?;

        Ok((self.load_notes(notes).await?, total.unsigned_abs()))
    }

    async fn create_notification(
        &self,
        values: &CreateNotificationValues,
    ) -> Result<Notification> {
        let notification = sqlx::query_as::<Pg, PostgresNotification>(
            r"
            INSERT INTO notifications (id, user_id, kind, content, related_entity_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, kind, content, related_entity_id,
                is_read, created_at, updated_at
            ",
        )
        .bind(Uuid::new_v4())
        .bind(values.user_id)
        .bind(NotificationKindType::from_kind(values.kind))
        .bind(values.content)
        .bind(values.related_entity_id)
        .fetch_one(&self.connection_pool)
        .await
        .map(Notification::from_postgres_notification)
        .map_err(connection_error)?;

        Ok(notification)
    }

    async fn find_notifications_by_user(
        &self,
        user_id: &Uuid,
        page: Page,
    ) -> Result<(Vec<Notification>, u64)> {
        let total = sqlx::query_scalar::<Pg, i64>(
            r"
            SELECT COUNT(*)
            FROM notifications
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        let notifications = sqlx::query_as::<Pg, PostgresNotification>(
            r"
            SELECT id, user_id, kind, content, related_entity_id,
                is_read, created_at, updated_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user_id)
        .bind(i64::from(page.size))
        .bind(page.offset() as i64)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok((
            notifications
                .into_iter()
                .map(Notification::from_postgres_notification)
                .collect(),
            total.unsigned_abs(),
        ))
    }

    async fn mark_notification_read(&self, notification_id: &Uuid, user_id: &Uuid) -> Result<u64> {
        let result = sqlx::query(
            r"
            UPDATE notifications
            SET is_read = TRUE,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
                AND user_id = $2
            ",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(result.rows_affected())
    }

    async fn mark_all_notifications_read(&self, user_id: &Uuid) -> Result<u64> {
        let result = sqlx::query(
            r"
            UPDATE notifications
            SET is_read = TRUE,
                updated_at = CURRENT_TIMESTAMP
            WHERE user_id = $1
                AND is_read = FALSE
            ",
        )
        .bind(user_id)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(result.rows_affected())
    }

    async fn count_unread_notifications(&self, user_id: &Uuid) -> Result<u64> {
        let count = sqlx::query_scalar::<Pg, i64>(
            r"
            SELECT COUNT(*)
            FROM notifications
            WHERE user_id = $1
                AND is_read = FALSE
            ",
        )
        .bind(user_id)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(count.unsigned_abs())
    }
}

/// Convert `SQLx` to storage connection error
fn connection_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::Connection(err.to_string())
}
