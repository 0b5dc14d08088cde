//! User directory, presence heartbeat, and the presence WebSocket.

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket},
        Extension, Query, State, WebSocketUpgrade,
    },
    http::{header, HeaderMap},
    response::Response,
    Json,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::{
    error::AppError,
    models::{
        auth::{MessageResponse, UserIdentity},
        profile::ProfileListItem,
        PageQuery, Paginated,
    },
    services::presence::PresenceTracker,
    state::AppState,
    utils::cookies::{extract_cookie_value, ACCESS_COOKIE_NAME},
};

pub async fn list_users(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<ProfileListItem>>, AppError> {
    let (users, total_count) = state
        .store
        .list_profiles(page.offset(), page.limit())
        .await?;
    Ok(Json(Paginated {
        data: users,
        total_count,
    }))
}

/// HTTP presence heartbeat. Unlike the WebSocket path, failures here surface
/// to the caller.
pub async fn ping(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> Result<Json<MessageResponse>, AppError> {
    let tracker = PresenceTracker::new(state.presence.clone(), state.hub.clone());
    tracker.touch(identity.id).await?;
    tracker.broadcast_online_list().await;
    Ok(Json(MessageResponse::new("pong")))
}

#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    token: Option<String>,
}

enum WsIdentity {
    /// No token presented; admitted as a viewer without a presence entry.
    Anonymous,
    User(UserIdentity),
    /// A token was presented but did not validate.
    Rejected,
}

/// `GET /user/ws/ping`. Identity comes from the `token` query parameter or
/// the access cookie; it is resolved before the upgrade so a rejected token
/// is closed with a policy violation before any application traffic.
pub async fn presence_ws(
    State(state): State<AppState>,
    Query(query): Query<WsAuthQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let token = query.token.or_else(|| {
        headers
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| extract_cookie_value(raw, ACCESS_COOKIE_NAME))
    });

    let identity = match token {
        None => WsIdentity::Anonymous,
        Some(token) => match state.sessions().identity_for_token(&token).await {
            Ok(identity) => WsIdentity::User(identity),
            Err(_) => WsIdentity::Rejected,
        },
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, identity))
}

async fn handle_socket(mut socket: WebSocket, state: AppState, auth: WsIdentity) {
    let identity = match auth {
        WsIdentity::User(identity) => Some(identity),
        WsIdentity::Anonymous => None,
        WsIdentity::Rejected => {
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: "invalid token".into(),
                })))
                .await;
            return;
        }
    };

    let tracker = PresenceTracker::new(state.presence.clone(), state.hub.clone());
    let (conn_id, mut outbound) = state.hub.register();

    if let Some(identity) = &identity {
        if let Err(err) = tracker.touch(identity.id).await {
            tracing::warn!(user_id = %identity.id, "Presence touch on connect failed: {:?}", err);
        }
    }
    tracker.broadcast_online_list().await;

    let (mut sink, mut stream) = socket.split();
    let send_task = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Read loop: literal "ping" refreshes presence, everything else is
    // ignored. Ends on disconnect or transport error.
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) if text.as_str() == "ping" => {
                let Some(identity) = &identity else {
                    continue;
                };
                if let Err(err) = tracker.touch(identity.id).await {
                    tracing::warn!(user_id = %identity.id, "Presence touch failed: {:?}", err);
                }
                tracker.broadcast_online_list().await;
            }
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    // Cleanup runs on every exit path of the loop.
    send_task.abort();
    state.hub.unregister(conn_id);
    if let Some(identity) = &identity {
        if let Err(err) = tracker.remove(identity.id).await {
            tracing::warn!(user_id = %identity.id, "Presence removal failed: {:?}", err);
        }
    }
    tracker.broadcast_online_list().await;
}
