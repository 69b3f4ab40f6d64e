use crate::{
    auth::CurrentUser,
    chat::{auto_reply, ClientEvent, ServerEvent, SUPPORT_ROOM},
    errors::ServiceError,
    events::Event,
    AppState,
};
use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

const GUEST: &str = "Guest";

/// Creates the router for the realtime chat channel
pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}

/// Upgrade to a websocket. Guests are allowed; an authenticated session
/// attaches the caller's user id to persisted messages.
async fn ws_upgrade(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    ws: WebSocketUpgrade,
) -> Response {
    let user_id = user.map(|u| u.user_id);
    ws.on_upgrade(move |socket| drive_socket(socket, state, user_id))
}

/// Per-connection driver: a writer task drains the bounded outbound
/// queue while this task reads, parses, and dispatches client frames.
/// Disconnect (or idle eviction) deterministically releases every room
/// membership, without a leave notice.
async fn drive_socket(socket: WebSocket, state: AppState, user_id: Option<Uuid>) {
    let conn_id = Uuid::new_v4();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(state.chat_hub.queue_capacity());

    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Chat frame serialization failed: {}", e);
                    continue;
                }
            };
            if sink.send(WsMessage::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    let idle = Duration::from_secs(state.config.chat_idle_timeout_secs);
    loop {
        let frame = match tokio::time::timeout(idle, stream.next()).await {
            Err(_) => {
                debug!("Evicting idle chat connection {}", conn_id);
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(_))) => break,
            Ok(Some(Ok(frame))) => frame,
        };

        match frame {
            WsMessage::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => handle_event(&state, conn_id, user_id, &tx, event).await,
                Err(_) => {
                    let _ = tx
                        .send(ServerEvent::Error {
                            message: "Unrecognized event".to_string(),
                        })
                        .await;
                }
            },
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    state.chat_hub.disconnect(conn_id);
    writer.abort();
}

async fn handle_event(
    state: &AppState,
    conn_id: Uuid,
    user_id: Option<Uuid>,
    tx: &mpsc::Sender<ServerEvent>,
    event: ClientEvent,
) {
    match event {
        ClientEvent::JoinChat {
            session_id,
            username,
        } => {
            let username = username.unwrap_or_else(|| GUEST.to_string());
            // Mint a fresh session token when the client has none.
            let session_id = session_id
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string());

            match state.services.chat.history(&session_id).await {
                Ok(messages) => {
                    state
                        .chat_hub
                        .join(&session_id, conn_id, &username, tx.clone());

                    let _ = tx
                        .send(ServerEvent::ChatJoined {
                            session_id: session_id.clone(),
                            username: username.clone(),
                            messages,
                        })
                        .await;

                    state
                        .chat_hub
                        .broadcast(
                            &session_id,
                            ServerEvent::UserJoined {
                                username: username.clone(),
                                message: format!("{} joined the chat", username),
                            },
                            Some(conn_id),
                        )
                        .await;
                }
                Err(e) => send_error(tx, &e).await,
            }
        }

        ClientEvent::LeaveChat {
            session_id,
            username,
        } => {
            let username = username.unwrap_or_else(|| GUEST.to_string());
            match session_id.filter(|s| !s.is_empty()) {
                Some(session_id) => {
                    state.chat_hub.leave(&session_id, conn_id);
                    state
                        .chat_hub
                        .broadcast(
                            &session_id,
                            ServerEvent::UserLeft {
                                username: username.clone(),
                                message: format!("{} left the chat", username),
                            },
                            None,
                        )
                        .await;
                }
                None => {
                    let _ = tx
                        .send(ServerEvent::Error {
                            message: "Session ID is required".to_string(),
                        })
                        .await;
                }
            }
        }

        ClientEvent::SendMessage {
            session_id,
            message,
            username,
            is_support,
        } => {
            let username = username.unwrap_or_else(|| GUEST.to_string());
            let (session_id, text) = match (
                session_id.filter(|s| !s.is_empty()),
                message.filter(|m| !m.is_empty()),
            ) {
                (Some(session_id), Some(text)) => (session_id, text),
                _ => {
                    let _ = tx
                        .send(ServerEvent::Error {
                            message: "Session ID and message are required".to_string(),
                        })
                        .await;
                    return;
                }
            };

            match state
                .services
                .chat
                .record_message(&session_id, user_id, &username, &text, is_support)
                .await
            {
                Ok(stored) => {
                    // Echo to every member including the sender.
                    state
                        .chat_hub
                        .broadcast(&session_id, ServerEvent::NewMessage { message: stored }, None)
                        .await;

                    if !is_support {
                        schedule_auto_reply(state.clone(), session_id, text);
                    }
                }
                Err(e) => send_error(tx, &e).await,
            }
        }

        ClientEvent::Typing {
            session_id,
            username,
            is_typing,
        } => {
            let username = username.unwrap_or_else(|| GUEST.to_string());
            if let Some(session_id) = session_id.filter(|s| !s.is_empty()) {
                state
                    .chat_hub
                    .broadcast(
                        &session_id,
                        ServerEvent::UserTyping {
                            username,
                            is_typing,
                        },
                        Some(conn_id),
                    )
                    .await;
            }
        }

        ClientEvent::SupportRequest {
            session_id,
            username,
        } => {
            let username = username.unwrap_or_else(|| GUEST.to_string());
            let session_id = session_id.unwrap_or_default();

            state
                .chat_hub
                .broadcast(
                    SUPPORT_ROOM,
                    ServerEvent::SupportAlert {
                        session_id: session_id.clone(),
                        username: username.clone(),
                        message: format!("{} requested support", username),
                    },
                    None,
                )
                .await;

            let _ = tx
                .send(ServerEvent::SupportNotified {
                    message: "Support team has been notified. Someone will be with you shortly."
                        .to_string(),
                })
                .await;

            state
                .event_sender
                .send_or_log(Event::SupportRequested { session_id })
                .await;
        }
    }
}

/// Schedules the support bot's reply off the handling path. The task is
/// independent of the sender's connection: the reply is persisted and
/// broadcast to whoever is still in the room even if the sender has
/// dropped by then.
fn schedule_auto_reply(state: AppState, session_id: String, text: String) {
    let delay = Duration::from_millis(state.config.auto_reply_delay_ms);
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        let reply = auto_reply::reply_for(&text);
        match state
            .services
            .chat
            .record_message(&session_id, None, auto_reply::SUPPORT_BOT, reply, true)
            .await
        {
            Ok(stored) => {
                state
                    .chat_hub
                    .broadcast(&session_id, ServerEvent::NewMessage { message: stored }, None)
                    .await;
            }
            Err(e) => warn!("Auto-reply persistence failed: {}", e),
        }
    });
}

async fn send_error(tx: &mpsc::Sender<ServerEvent>, err: &ServiceError) {
    let _ = tx
        .send(ServerEvent::Error {
            message: err.response_message(),
        })
        .await;
}
