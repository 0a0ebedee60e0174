//! Travel note endpoints: public listing, author submission and edits

use axum::Extension;
use axum::extract::Query;
use chrono::naive::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::moderation::ModerationEngine;
use crate::moderation::NewNote;
use crate::moderation::NotePatch;
use crate::notes::Media;
use crate::notes::MediaKind;
use crate::notes::NewMedia;
use crate::notes::Note;
use crate::notes::NoteStatus;
use crate::storage::Storage;
use crate::users::Role;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::Paginated;
use super::PathParameters;
use super::Success;
use super::request::PageQuery;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaResponse {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl MediaResponse {
    fn from_media(media: Media) -> Self {
        Self {
            kind: media.kind,
            url: media.url,
            thumbnail_url: media.thumbnail_url,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub status: NoteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<String>,
    pub media: Vec<MediaResponse>,
    pub is_deleted: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NoteResponse {
    pub fn from_note(note: Note) -> Self {
        Self {
            id: note.id,
            author_id: note.author_id,
            title: note.title,
            content: note.content,
            status: note.status,
            reject_reason: note.reject_reason,
            media: note
                .media
                .into_iter()
                .map(MediaResponse::from_media)
                .collect(),
            is_deleted: note.is_deleted,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }

    pub fn from_note_multiple(notes: Vec<Note>) -> Vec<Self> {
        notes.into_iter().map(Self::from_note).collect()
    }
}

/// Compact listing entry for the public feed
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSummaryResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    /// Cover image, the first image attachment
    pub image_url: Option<String>,
    pub created_at: NaiveDateTime,
}

impl NoteSummaryResponse {
    fn from_note(note: &Note) -> Self {
        Self {
            id: note.id,
            author_id: note.author_id,
            title: note.title.clone(),
            image_url: note.cover_image_url().map(ToString::to_string),
            created_at: note.created_at,
        }
    }
}

/// Public feed of approved notes
pub async fn list_approved<S: Storage>(
    Extension(storage): Extension<S>,
    Query(query): Query<PageQuery>,
) -> Result<Success<Paginated<NoteSummaryResponse>>, Error> {
    let (notes, total) = storage
        .find_approved_notes(query.keyword.as_deref(), query.to_page())
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(Paginated {
        total,
        page: query.page,
        page_size: query.page_size,
        data: notes.iter().map(NoteSummaryResponse::from_note).collect(),
    }))
}

/// The author's own notes, whatever their status
pub async fn list_mine<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    Query(query): Query<PageQuery>,
) -> Result<Success<Paginated<NoteResponse>>, Error> {
    current_user.role.is_allowed(Role::Author)?;

    let (notes, total) = storage
        .find_notes_by_author(&current_user.id, query.to_page())
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(Paginated {
        total,
        page: query.page,
        page_size: query.page_size,
        data: NoteResponse::from_note_multiple(notes),
    }))
}

/// Single note: approved notes are public, the author sees their own in
/// any status; pending and rejected notes look missing to everyone else
pub async fn single<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: Option<CurrentUser<S>>,
    PathParameters(note_id): PathParameters<Uuid>,
) -> Result<Success<NoteResponse>, Error> {
    let note = storage
        .find_single_note_by_id(&note_id)
        .await
        .map_err(Error::internal_server_error)?;

    let is_author = |note: &Note| {
        current_user
            .as_ref()
            .is_some_and(|current_user| current_user.id == note.author_id)
    };

    match note {
        Some(note) if note.status == NoteStatus::Approved || is_author(&note) => {
            Ok(Success::ok(NoteResponse::from_note(note)))
        }
        _ => Err(Error::not_found("Note not found")),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaForm {
    #[serde(rename = "type")]
    kind: MediaKind,
    url: String,
    thumbnail_url: Option<String>,
}

impl MediaForm {
    fn into_new_media(self) -> NewMedia {
        NewMedia {
            kind: self.kind,
            url: self.url,
            thumbnail_url: self.thumbnail_url,
        }
    }

    fn into_new_media_multiple(media: Vec<Self>) -> Vec<NewMedia> {
        media.into_iter().map(Self::into_new_media).collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitNoteForm {
    title: String,
    content: String,
    media: Vec<MediaForm>,
}

/// Submit a new note for review
pub async fn submit<S: Storage>(
    Extension(engine): Extension<ModerationEngine<S>>,
    current_user: CurrentUser<S>,
    Form(form): Form<SubmitNoteForm>,
) -> Result<Success<NoteResponse>, Error> {
    current_user.role.is_allowed(Role::Author)?;

    let new_note = NewNote {
        title: form.title,
        content: form.content,
        media: MediaForm::into_new_media_multiple(form.media),
    };

    let note = engine.submit(&current_user.id, &new_note).await?;

    Ok(Success::created(NoteResponse::from_note(note)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditNoteForm {
    title: Option<String>,
    content: Option<String>,
    media: Option<Vec<MediaForm>>,
}

/// Edit an own, still pending note
pub async fn edit<S: Storage>(
    Extension(engine): Extension<ModerationEngine<S>>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<Uuid>,
    Form(form): Form<EditNoteForm>,
) -> Result<Success<NoteResponse>, Error> {
    current_user.role.is_allowed(Role::Author)?;

    let patch = NotePatch {
        title: form.title,
        content: form.content,
        media: form.media.map(MediaForm::into_new_media_multiple),
    };

    let note = engine.edit(&note_id, &current_user.id, &patch).await?;

    Ok(Success::ok(NoteResponse::from_note(note)))
}
