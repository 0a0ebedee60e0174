//! Notification inbox endpoints

use axum::Extension;
use axum::extract::Query;
use chrono::naive::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use crate::dispatch::NotificationDispatcher;
use crate::notifications::Notification;
use crate::notifications::NotificationKind;
use crate::storage::Storage;

use super::CurrentUser;
use super::Error;
use super::Paginated;
use super::PathParameters;
use super::Success;
use super::request::PageQuery;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_entity_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

impl NotificationResponse {
    fn from_notification(notification: Notification) -> Self {
        Self {
            id: notification.id,
            kind: notification.kind,
            content: notification.content,
            related_entity_id: notification.related_entity_id,
            is_read: notification.is_read,
            created_at: notification.created_at,
        }
    }
}

/// Count responses for read markers and the unread badge
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

/// The notification inbox of the current user, newest first
pub async fn list<S: Storage>(
    Extension(dispatcher): Extension<NotificationDispatcher<S>>,
    current_user: CurrentUser<S>,
    Query(query): Query<PageQuery>,
) -> Result<Success<Paginated<NotificationResponse>>, Error> {
    let (notifications, total) = dispatcher
        .list(&current_user.id, query.to_page())
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(Paginated {
        total,
        page: query.page,
        page_size: query.page_size,
        data: notifications
            .into_iter()
            .map(NotificationResponse::from_notification)
            .collect(),
    }))
}

/// The unread badge count
pub async fn unread_count<S: Storage>(
    Extension(dispatcher): Extension<NotificationDispatcher<S>>,
    current_user: CurrentUser<S>,
) -> Result<Success<CountResponse>, Error> {
    let count = dispatcher
        .unread_count(&current_user.id)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(CountResponse { count }))
}

/// Mark a single notification as read
///
/// Marking a notification of another user looks exactly like marking one
/// that does not exist
pub async fn mark_read<S: Storage>(
    Extension(dispatcher): Extension<NotificationDispatcher<S>>,
    current_user: CurrentUser<S>,
    PathParameters(notification_id): PathParameters<Uuid>,
) -> Result<Success<CountResponse>, Error> {
    let count = dispatcher
        .mark_read(&notification_id, &current_user.id)
        .await
        .map_err(Error::internal_server_error)?;

    if count == 0 {
        return Err(Error::not_found("Notification not found"));
    }

    Ok(Success::ok(CountResponse { count }))
}

/// Mark all notifications of the current user as read
pub async fn mark_all_read<S: Storage>(
    Extension(dispatcher): Extension<NotificationDispatcher<S>>,
    current_user: CurrentUser<S>,
) -> Result<Success<CountResponse>, Error> {
    let count = dispatcher
        .mark_all_read(&current_user.id)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(CountResponse { count }))
}
