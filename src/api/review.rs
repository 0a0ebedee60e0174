//! Review desk endpoints
//!
//! Reviewers see everything, deleted notes included; these routes are the
//! audit surface and never filter on the soft-delete.

use axum::Extension;
use axum::extract::Query;
use serde::Deserialize;
use uuid::Uuid;

use crate::moderation::ModerationEngine;
use crate::notes::NoteStatus;
use crate::storage::ReviewFilter;
use crate::storage::Storage;
use crate::users::Role;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::Paginated;
use super::PathParameters;
use super::Success;
use super::notes::NoteResponse;
use super::request::default_page;
use super::request::default_page_size;

/// Review listing query, pagination plus the review filters
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuery {
    #[serde(default = "default_page")]
    page: u32,

    #[serde(default = "default_page_size")]
    page_size: u32,

    /// Case-insensitive title keyword
    keyword: Option<String>,

    /// Only notes with this status
    status: Option<NoteStatus>,
}

/// The review desk: all notes, filterable by status and keyword
pub async fn list<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    Query(query): Query<ReviewQuery>,
) -> Result<Success<Paginated<NoteResponse>>, Error> {
    current_user.role.is_allowed(Role::Reviewer)?;

    let filter = ReviewFilter {
        status: query.status,
        keyword: query.keyword.as_deref(),
    };

    let page = super::request::PageQuery {
        page: query.page,
        page_size: query.page_size,
        keyword: None,
    }
    .to_page();

    let (notes, total) = storage
        .find_notes_for_review(&filter, page)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(Paginated {
        total,
        page: query.page,
        page_size: query.page_size,
        data: NoteResponse::from_note_multiple(notes),
    }))
}

/// A single note for review, deleted or not
pub async fn single<S: Storage>(
    Extension(storage): Extension<S>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<Uuid>,
) -> Result<Success<NoteResponse>, Error> {
    current_user.role.is_allowed(Role::Reviewer)?;

    let note = storage
        .find_single_note_by_id_unchecked(&note_id)
        .await
        .map_err(Error::internal_server_error)?
        .ok_or_else(|| Error::not_found("Note not found"))?;

    Ok(Success::ok(NoteResponse::from_note(note)))
}

/// Approve a pending note
pub async fn approve<S: Storage>(
    Extension(engine): Extension<ModerationEngine<S>>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<Uuid>,
) -> Result<Success<NoteResponse>, Error> {
    current_user.role.is_allowed(Role::Reviewer)?;

    let note = engine.approve(&note_id).await?;

    Ok(Success::ok(NoteResponse::from_note(note)))
}

/// Reject form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectForm {
    /// Why the note was rejected, shown to the author
    reject_reason: String,
}

/// Reject a pending note with a reason
pub async fn reject<S: Storage>(
    Extension(engine): Extension<ModerationEngine<S>>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<Uuid>,
    Form(form): Form<RejectForm>,
) -> Result<Success<NoteResponse>, Error> {
    current_user.role.is_allowed(Role::Reviewer)?;

    let note = engine.reject(&note_id, &form.reject_reason).await?;

    Ok(Success::ok(NoteResponse::from_note(note)))
}

/// Soft-delete a note, admins only
pub async fn remove<S: Storage>(
    Extension(engine): Extension<ModerationEngine<S>>,
    current_user: CurrentUser<S>,
    PathParameters(note_id): PathParameters<Uuid>,
) -> Result<Success<NoteResponse>, Error> {
    current_user.role.is_allowed(Role::Admin)?;

    let note = engine.soft_delete(&note_id).await?;

    Ok(Success::ok(NoteResponse::from_note(note)))
}
