//! Memory storage
//!
//! Will be destroyed on system shutdown

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::notes::Media;
use crate::notes::NewMedia;
use crate::notes::Note;
use crate::notes::NoteStatus;
use crate::notifications::Notification;
use crate::users::User;

use super::CreateNoteValues;
use super::CreateNotificationValues;
use super::CreateUserValues;
use super::EditNoteValues;
use super::Page;
use super::Result;
use super::ReviewFilter;
use super::Storage;

/// An in-memory storage
///
/// Will be destroyed on system shutdown
#[derive(Clone, Debug)]
pub struct Memory {
    /// All users in storage
    users: Arc<Mutex<HashMap<Uuid, User>>>,

    /// All notes in storage, media included
    notes: Arc<Mutex<HashMap<Uuid, Note>>>,

    /// All notifications in storage
    notifications: Arc<Mutex<HashMap<Uuid, Notification>>>,
}

impl Memory {
    /// Create a new empty Memory storage
    pub fn new() -> Self {
        Self {
            users: Arc::new(Mutex::new(HashMap::new())),
            notes: Arc::new(Mutex::new(HashMap::new())),
            notifications: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Newest first, with the ID as tie breaker for stable ordering
fn page_newest_first<T, K>(mut items: Vec<T>, page: Page, key: K) -> (Vec<T>, u64)
where
    K: Fn(&T) -> (chrono::naive::NaiveDateTime, Uuid),
{
    items.sort_by(|a, b| key(b).cmp(&key(a)));

    let total = items.len() as u64;
    let items = items
        .into_iter()
        .skip(page.offset())
        .take(page.size as usize)
        .collect();

    (items, total)
}

fn materialize_media(media: &[NewMedia]) -> Vec<Media> {
    media
        .iter()
        .map(|media| Media {
            id: Uuid::new_v4(),
            kind: media.kind,
            url: media.url.clone(),
            thumbnail_url: media.thumbnail_url.clone(),
        })
        .collect()
}

fn title_matches(note: &Note, keyword: Option<&str>) -> bool {
    keyword.is_none_or(|keyword| {
        note.title
            .to_lowercase()
            .contains(&keyword.to_lowercase())
    })
}

#[async_trait]
impl Storage for Memory {
    async fn find_any_single_user(&self) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|user| user.deleted_at.is_none())
            .cloned())
    }

    async fn find_single_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|user| user.username == username && user.deleted_at.is_none())
            .cloned())
    }

    async fn find_single_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|user| &user.id == id && user.deleted_at.is_none())
            .cloned())
    }

    async fn create_user(&self, values: &CreateUserValues) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            session_id: *values.session_id,
            username: values.username.to_string(),
            hashed_password: values.hashed_password.to_string(),
            role: values.role,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
            deleted_at: None,
        };

        self.users.lock().await.insert(user.id, user.clone());

        Ok(user)
    }

    async fn create_note(&self, values: &CreateNoteValues) -> Result<Note> {
        let note = Note {
            id: Uuid::new_v4(),
            author_id: values.author.id,
            title: values.title.to_string(),
            content: values.content.to_string(),
            status: NoteStatus::Pending,
            reject_reason: None,
            media: materialize_media(values.media),
            is_deleted: false,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        };

        self.notes.lock().await.insert(note.id, note.clone());

        Ok(note)
    }

    async fn find_single_note_by_id(&self, id: &Uuid) -> Result<Option<Note>> {
        Ok(self
            .notes
            .lock()
            .await
            .values()
            .find(|note| &note.id == id && !note.is_deleted)
            .cloned())
    }

    async fn find_single_note_by_id_unchecked(&self, id: &Uuid) -> Result<Option<Note>> {
        Ok(self.notes.lock().await.get(id).cloned())
    }

    async fn update_note_if_pending(
        &self,
        note_id: &Uuid,
        values: &EditNoteValues,
    ) -> Result<Option<Note>> {
        Ok(self.notes.lock().await.get_mut(note_id).and_then(|note| {
            // same guard as the conditional UPDATE in the relational backend
            if note.is_deleted
                || &note.author_id != values.author_id
                || note.status != NoteStatus::Pending
            {
                return None;
            }

            if let Some(title) = values.title {
                note.title = title.to_string();
            }

            if let Some(content) = values.content {
                note.content = content.to_string();
            }

            if let Some(media) = values.media {
                note.media = materialize_media(media);
            }

            note.status = NoteStatus::Pending;
            note.reject_reason = None;
            note.updated_at = Utc::now().naive_utc();

            Some(note.clone())
        }))
    }

    async fn set_note_status_if_pending(
        &self,
        note_id: &Uuid,
        status: NoteStatus,
        reject_reason: Option<&str>,
    ) -> Result<Option<Note>> {
        Ok(self.notes.lock().await.get_mut(note_id).and_then(|note| {
            if note.is_deleted || note.status != NoteStatus::Pending {
                return None;
            }

            note.status = status;
            note.reject_reason = reject_reason.map(ToString::to_string);
            note.updated_at = Utc::now().naive_utc();

            Some(note.clone())
        }))
    }

    async fn soft_delete_note(&self, note_id: &Uuid) -> Result<Option<Note>> {
        Ok(self.notes.lock().await.get_mut(note_id).and_then(|note| {
            if note.is_deleted {
                return None;
            }

            note.is_deleted = true;
            note.updated_at = Utc::now().naive_utc();

            Some(note.clone())
        }))
    }

    async fn find_approved_notes(
        &self,
        keyword: Option<&str>,
        page: Page,
    ) -> Result<(Vec<Note>, u64)> {
        let notes = self
            .notes
            .lock()
            .await
            .values()
            .filter(|note| {
                !note.is_deleted
                    && note.status == NoteStatus::Approved
                    && title_matches(note, keyword)
            })
            .cloned()
            .collect::<Vec<Note>>();

        Ok(page_newest_first(notes, page, |note| {
            (note.created_at, note.id)
        }))
    }

    async fn find_notes_by_author(
        &self,
        author_id: &Uuid,
        page: Page,
    ) -> Result<(Vec<Note>, u64)> {
        let notes = self
            .notes
            .lock()
            .await
            .values()
            .filter(|note| !note.is_deleted && &note.author_id == author_id)
            .cloned()
            .collect::<Vec<Note>>();

        Ok(page_newest_first(notes, page, |note| {
            (note.created_at, note.id)
        }))
    }

    async fn find_notes_for_review(
        &self,
        filter: &ReviewFilter,
        page: Page,
    ) -> Result<(Vec<Note>, u64)> {
        let notes = self
            .notes
            .lock()
            .await
            .values()
            .filter(|note| {
                filter.status.is_none_or(|status| note.status == status)
                    && title_matches(note, filter.keyword)
            })
            .cloned()
            .collect::<Vec<Note>>();

        Ok(page_newest_first(notes, page, |note| {
            (note.created_at, note.id)
        }))
    }

    async fn create_notification(
        &self,
        values: &CreateNotificationValues,
    ) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: *values.user_id,
            kind: values.kind,
            content: values.content.to_string(),
            related_entity_id: values.related_entity_id.copied(),
            is_read: false,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        };

        self.notifications
            .lock()
            .await
            .insert(notification.id, notification.clone());

        Ok(notification)
    }

    async fn find_notifications_by_user(
        &self,
        user_id: &Uuid,
        page: Page,
    ) -> Result<(Vec<Notification>, u64)> {
        let notifications = self
            .notifications
            .lock()
            .await
            .values()
            .filter(|notification| &notification.user_id == user_id)
            .cloned()
            .collect::<Vec<Notification>>();

        Ok(page_newest_first(notifications, page, |notification| {
            (notification.created_at, notification.id)
        }))
    }

    async fn mark_notification_read(&self, notification_id: &Uuid, user_id: &Uuid) -> Result<u64> {
        Ok(self
            .notifications
            .lock()
            .await
            .get_mut(notification_id)
            .map_or(0, |notification| {
                // ownership is the only guard, re-marking a read
                // notification succeeds again
                if &notification.user_id == user_id {
                    notification.is_read = true;
                    notification.updated_at = Utc::now().naive_utc();
                    1
                } else {
                    0
                }
            }))
    }

    async fn mark_all_notifications_read(&self, user_id: &Uuid) -> Result<u64> {
        let mut affected = 0;

        for notification in self.notifications.lock().await.values_mut() {
            if &notification.user_id == user_id && !notification.is_read {
                notification.is_read = true;
                notification.updated_at = Utc::now().naive_utc();
                affected += 1;
            }
        }

        Ok(affected)
    }

    async fn count_unread_notifications(&self, user_id: &Uuid) -> Result<u64> {
        Ok(self
            .notifications
            .lock()
            .await
            .values()
            .filter(|notification| &notification.user_id == user_id && !notification.is_read)
            .count() as u64)
    }
}
