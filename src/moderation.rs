//! The moderation state machine
//!
//! Owns no storage of its own: every transition is one conditional update
//! against the note row, and the row guard is the only mutual exclusion.
//! Two concurrent approvals of the same note cannot both win; the loser's
//! update matches zero rows and surfaces as [`ModerationError::InvalidState`].
//! Exactly one notification is dispatched per successful transition, after
//! the write committed.

use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::dispatch::NotificationDispatcher;
use crate::notes::MediaKind;
use crate::notes::NewMedia;
use crate::notes::Note;
use crate::notes::NoteStatus;
use crate::notifications::NotificationKind;
use crate::storage;
use crate::storage::CreateNoteValues;
use crate::storage::EditNoteValues;
use crate::storage::Storage;

/// Longest allowed note title, in characters
pub const MAX_TITLE_LENGTH: usize = 50;

/// Longest allowed note content, in characters
pub const MAX_CONTENT_LENGTH: usize = 2000;

/// Longest allowed media URL, in characters
pub const MAX_MEDIA_URL_LENGTH: usize = 300;

/// Longest allowed reject reason, in characters
pub const MAX_REJECT_REASON_LENGTH: usize = 500;

/// Failure modes of moderation operations
#[derive(Debug, Error)]
pub enum ModerationError {
    /// The entity does not exist, or is not visible to the caller
    #[error("{0}")]
    NotFound(&'static str),

    /// The caller does not own the entity
    #[error("{0}")]
    Forbidden(&'static str),

    /// The transition precondition does not hold
    #[error("{0}")]
    InvalidState(&'static str),

    /// Malformed input: length limits or the media composition rule
    #[error("{0}")]
    Validation(String),

    /// The persistence collaborator failed, always fatal
    #[error(transparent)]
    Storage(#[from] storage::Error),
}

/// Result type for all moderation operations
pub type Result<T> = core::result::Result<T, ModerationError>;

/// A note submission, before validation
#[derive(Debug)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub media: Vec<NewMedia>,
}

/// An author edit of a pending note
///
/// A present media set replaces the previous attachments wholesale
#[derive(Debug, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub media: Option<Vec<NewMedia>>,
}

/// The moderation state machine with its notification fan-out
#[derive(Clone)]
pub struct ModerationEngine<S: Storage> {
    storage: S,
    dispatcher: NotificationDispatcher<S>,
}

impl<S: Storage> ModerationEngine<S> {
    pub fn new(storage: S, dispatcher: NotificationDispatcher<S>) -> Self {
        Self { storage, dispatcher }
    }

    /// Submit a new note, it starts out pending
    ///
    /// No notification is triggered on submission
    pub async fn submit(&self, author_id: &Uuid, new_note: &NewNote) -> Result<Note> {
        let title = validate_title(&new_note.title)?;
        let content = validate_content(&new_note.content)?;
        validate_media(&new_note.media)?;

        let author = self
            .storage
            .find_single_user_by_id(author_id)
            .await?
            .ok_or(ModerationError::NotFound("Author not found"))?;

        let values = CreateNoteValues {
            author: &author,
            title: &title,
            content: &content,
            media: &new_note.media,
        };

        Ok(self.storage.create_note(&values).await?)
    }

    /// Edit a note, only by its author and only while pending
    ///
    /// Editing keeps the note pending and clears any leftover reject
    /// reason; a patched media set is validated and replaces the old one.
    /// No notification is triggered
    pub async fn edit(&self, note_id: &Uuid, author_id: &Uuid, patch: &NotePatch) -> Result<Note> {
        let title = patch.title.as_deref().map(validate_title).transpose()?;
        let content = patch.content.as_deref().map(validate_content).transpose()?;

        if let Some(media) = &patch.media {
            validate_media(media)?;
        }

        // precondition read, for a precise error; the conditional update
        // below re-checks the guard against the row itself
        let note = self
            .storage
            .find_single_note_by_id(note_id)
            .await?
            .ok_or(ModerationError::NotFound("Note not found"))?;

        if &note.author_id != author_id {
            return Err(ModerationError::Forbidden("Not the author of this note"));
        }

        if note.status != NoteStatus::Pending {
            return Err(ModerationError::InvalidState(
                "Only pending notes can be edited",
            ));
        }

        let values = EditNoteValues {
            author_id,
            title: title.as_deref(),
            content: content.as_deref(),
            media: patch.media.as_deref(),
        };

        self.storage
            .update_note_if_pending(note_id, &values)
            .await?
            .ok_or(ModerationError::InvalidState(
                "Only pending notes can be edited",
            ))
    }

    /// Approve a pending note and notify its author
    pub async fn approve(&self, note_id: &Uuid) -> Result<Note> {
        let note = self.transition(note_id, NoteStatus::Approved, None).await?;

        let content = format!("Your travel note \"{}\" has been approved", note.title);
        self.dispatcher
            .notify(
                &note.author_id,
                NotificationKind::NoteApproved,
                &content,
                Some(&note.id),
            )
            .await?;

        Ok(note)
    }

    /// Reject a pending note with a reason and notify its author
    pub async fn reject(&self, note_id: &Uuid, reason: &str) -> Result<Note> {
        let reason = validate_reject_reason(reason)?;

        let note = self
            .transition(note_id, NoteStatus::Rejected, Some(&reason))
            .await?;

        let content = format!(
            "Your travel note \"{}\" has been rejected: {reason}",
            note.title
        );
        self.dispatcher
            .notify(
                &note.author_id,
                NotificationKind::NoteRejected,
                &content,
                Some(&note.id),
            )
            .await?;

        Ok(note)
    }

    /// Soft-delete a note in any status and notify its author
    ///
    /// Deleting an already deleted note is NotFound, so the author is
    /// notified exactly once per deletion
    pub async fn soft_delete(&self, note_id: &Uuid) -> Result<Note> {
        // the unchecked read distinguishes "never existed" from "already
        // deleted"; both end up as NotFound, the guard decides the rest
        self.storage
            .find_single_note_by_id_unchecked(note_id)
            .await?
            .ok_or(ModerationError::NotFound("Note not found"))?;

        let note = self
            .storage
            .soft_delete_note(note_id)
            .await?
            .ok_or(ModerationError::NotFound("Note not found"))?;

        let content = format!("Your travel note \"{}\" has been deleted", note.title);
        self.dispatcher
            .notify(
                &note.author_id,
                NotificationKind::NoteDeleted,
                &content,
                Some(&note.id),
            )
            .await?;

        Ok(note)
    }

    /// Guarded pending-to-new-status transition
    async fn transition(
        &self,
        note_id: &Uuid,
        status: NoteStatus,
        reject_reason: Option<&str>,
    ) -> Result<Note> {
        let note = self
            .storage
            .find_single_note_by_id(note_id)
            .await?
            .ok_or(ModerationError::NotFound("Note not found"))?;

        if note.status != NoteStatus::Pending {
            return Err(ModerationError::InvalidState(
                "Note is not awaiting review",
            ));
        }

        // a concurrent reviewer may have won between the read and this
        // write; the guard makes the loser's update match zero rows
        self.storage
            .set_note_status_if_pending(note_id, status, reject_reason)
            .await?
            .ok_or(ModerationError::InvalidState(
                "Note is not awaiting review",
            ))
    }
}

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ModerationError::Validation("Title is required".to_string()));
    }

    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ModerationError::Validation(format!(
            "Title can be at most {MAX_TITLE_LENGTH} characters"
        )));
    }

    Ok(title.to_string())
}

fn validate_content(content: &str) -> Result<String> {
    let content = content.trim();

    if content.is_empty() {
        return Err(ModerationError::Validation(
            "Content is required".to_string(),
        ));
    }

    if content.chars().count() > MAX_CONTENT_LENGTH {
        return Err(ModerationError::Validation(format!(
            "Content can be at most {MAX_CONTENT_LENGTH} characters"
        )));
    }

    Ok(content.to_string())
}

fn validate_reject_reason(reason: &str) -> Result<String> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(ModerationError::Validation(
            "Reject reason is required".to_string(),
        ));
    }

    if reason.chars().count() > MAX_REJECT_REASON_LENGTH {
        return Err(ModerationError::Validation(format!(
            "Reject reason can be at most {MAX_REJECT_REASON_LENGTH} characters"
        )));
    }

    Ok(reason.to_string())
}

/// The media composition rule: at least one image, at most one video
fn validate_media(media: &[NewMedia]) -> Result<()> {
    let images = media
        .iter()
        .filter(|media| media.kind == MediaKind::Image)
        .count();

    if images == 0 {
        return Err(ModerationError::Validation(
            "At least one image is required".to_string(),
        ));
    }

    let videos = media.len() - images;

    if videos > 1 {
        return Err(ModerationError::Validation(
            "At most one video is allowed".to_string(),
        ));
    }

    for item in media {
        validate_media_url(&item.url)?;

        if let Some(thumbnail_url) = &item.thumbnail_url {
            validate_media_url(thumbnail_url)?;
        }
    }

    Ok(())
}

fn validate_media_url(url: &str) -> Result<()> {
    if url.chars().count() > MAX_MEDIA_URL_LENGTH {
        return Err(ModerationError::Validation(format!(
            "Media URL can be at most {MAX_MEDIA_URL_LENGTH} characters"
        )));
    }

    Url::parse(url)
        .map_err(|err| ModerationError::Validation(format!("Invalid media URL: {err}")))?;

    Ok(())
}
