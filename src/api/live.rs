//! The live notification WebSocket
//!
//! The handshake authenticates a `token` query parameter before the upgrade
//! is accepted; an unauthenticated client never reaches the registry. Once
//! upgraded the connection registers with the [`ConnectionRegistry`] and
//! events are forwarded as JSON text frames until either side hangs up.

use axum::Extension;
use axum::extract::Query;
use axum::extract::ws::Message;
use axum::extract::ws::WebSocket;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::response::Response;
use futures_util::SinkExt;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc::unbounded_channel;
use uuid::Uuid;

use crate::live::ConnectionRegistry;
use crate::storage::Storage;

use super::Error;
use super::JwtKeys;
use super::current_user::verify_token;

/// WebSocket handshake query
#[derive(Debug, Deserialize)]
pub struct LiveQuery {
    /// The access token, browsers cannot set headers on WebSocket requests
    token: String,
}

/// Authenticate and upgrade to the live notification channel
///
/// The token is checked before the upgrade itself: an invalid token is a
/// 403 even when the request is not a proper WebSocket handshake
pub async fn upgrade<S: Storage>(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    Extension(jwt_keys): Extension<JwtKeys>,
    Extension(storage): Extension<S>,
    Extension(registry): Extension<ConnectionRegistry>,
    Query(query): Query<LiveQuery>,
) -> Result<Response, Error> {
    // fail closed: no registration happens for an invalid token
    let user = verify_token(&jwt_keys, &storage, &query.token).await?;

    let ws = ws.map_err(|err| Error::bad_request("Invalid WebSocket handshake").with_description(err))?;

    Ok(ws.on_upgrade(move |socket| serve_connection(socket, registry, user.id)))
}

/// Pump live events to the socket until the client disconnects
async fn serve_connection(socket: WebSocket, registry: ConnectionRegistry, user_id: Uuid) {
    let (mut sink, mut stream) = socket.split();

    let (sender, mut receiver) = unbounded_channel();
    let connection_id = registry.register(user_id, sender).await;

    let send_task = tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            let payload = match serde_json::to_string(&event) {
                Ok(payload) => payload,
                Err(err) => {
                    tracing::error!("Could not serialize live event: {err}");
                    continue;
                }
            };

            if sink.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    // drain the receive half to observe the close
    loop {
        match stream.next().await {
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
            Some(Ok(_)) => {} // inbound frames carry no meaning here
        }
    }

    // matched by connection identity, a newer connection stays registered
    registry.deregister(&user_id, &connection_id).await;
    send_task.abort();
}
