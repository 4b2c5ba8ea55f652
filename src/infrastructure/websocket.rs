//! WebSocket handler for editor client connections
//!
//! A connection binds to an actor with `Bind`, then issues remote calls. Each
//! call is answered with `CallResult` or `CallFailed` carrying the same
//! `call_id`.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::application::dispatch::RemoteCall;
use crate::application::dto::CallValue;
use crate::domain::value_objects::{LocationId, UserId};
use crate::infrastructure::session::{ClientId, SessionError};
use crate::infrastructure::state::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let client_id = ClientId::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    tracing::info!(client_id = %client_id, "New WebSocket connection established");

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::error!("Failed to encode server message: {}", e),
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => {
                    if let Some(response) = handle_message(msg, &state, client_id, &tx).await {
                        if tx.send(response).is_err() {
                            break;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(client_id = %client_id, "Failed to parse message: {}", e);
                    let error = ServerMessage::Error {
                        code: "PARSE_ERROR".to_string(),
                        message: format!("Invalid message format: {}", e),
                    };
                    if tx.send(error).is_err() {
                        break;
                    }
                }
            },
            Ok(Message::Close(_)) => {
                tracing::info!(client_id = %client_id, "WebSocket connection closed by client");
                break;
            }
            Err(e) => {
                tracing::error!(client_id = %client_id, "WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    release_client(&state, client_id).await;
    send_task.abort();

    tracing::info!(client_id = %client_id, "WebSocket connection terminated");
}

/// Handle one decoded client message, returning the direct reply if any
///
/// Additional messages (user notices) are pushed through `tx`.
async fn handle_message(
    msg: ClientMessage,
    state: &AppState,
    client_id: ClientId,
    tx: &mpsc::UnboundedSender<ServerMessage>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Heartbeat => Some(ServerMessage::Pong),

        ClientMessage::Bind {
            user_id,
            location_id,
        } => {
            let session = match state.open_session(user_id, location_id).await {
                Ok(session) => session,
                Err(e) => {
                    let error = SessionError::from(e);
                    tracing::error!(client_id = %client_id, "Bind failed: {:#}", error);
                    return Some(ServerMessage::Error {
                        code: error.code().to_string(),
                        message: error.to_string(),
                    });
                }
            };

            let previous = state.sessions.write().await.bind(client_id, session);
            if let Some(previous) = previous {
                previous.lock().await.close().await;
            }

            Some(ServerMessage::Bound {
                session_id: client_id.to_string(),
            })
        }

        ClientMessage::Call {
            call_id,
            method,
            args,
            kwargs,
        } => {
            let lookup = state.sessions.read().await.get(client_id);
            let bound = match lookup {
                Ok(bound) => bound,
                Err(error) => {
                    return Some(ServerMessage::Error {
                        code: error.code().to_string(),
                        message: error.to_string(),
                    });
                }
            };

            let call = RemoteCall {
                kwargs,
                ..RemoteCall::new(method, args)
            };
            let mut session = bound.session.lock().await;
            match state
                .dispatcher
                .dispatch(bound.user_id, Some(&mut *session), &call)
                .await
            {
                Ok(result) => Some(ServerMessage::CallResult { call_id, result }),
                Err(error) => {
                    let message = error.client_message();
                    if error.notifies_user() {
                        let _ = tx.send(ServerMessage::Notify {
                            message: message.clone(),
                        });
                    }
                    Some(ServerMessage::CallFailed {
                        call_id,
                        code: error.code().to_string(),
                        message,
                    })
                }
            }
        }
    }
}

/// Drop a connection's binding and tear its session down
async fn release_client(state: &AppState, client_id: ClientId) {
    let released = state.sessions.write().await.release(client_id);
    if let Some(session) = released {
        session.lock().await.close().await;
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// Messages from an editor client to the server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Bind this connection to an actor standing in a location
    Bind {
        user_id: UserId,
        location_id: LocationId,
    },
    /// One remote call
    Call {
        call_id: u64,
        method: String,
        #[serde(default)]
        args: Vec<CallValue>,
        #[serde(default)]
        kwargs: BTreeMap<String, CallValue>,
    },
    /// Heartbeat ping
    Heartbeat,
}

/// Messages from the server to an editor client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Connection bound; the editing session is idle
    Bound { session_id: String },
    /// Successful call; `result` is `null` when the call has no payload
    CallResult { call_id: u64, result: CallValue },
    CallFailed {
        call_id: u64,
        code: String,
        message: String,
    },
    /// Text to show the user
    Notify { message: String },
    /// Protocol-level failure
    Error { code: String, message: String },
    /// Heartbeat response
    Pong,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::outbound::WorldPort;
    use crate::infrastructure::state::test_support::test_state;

    const USER: UserId = UserId::new(42);
    const LOCATION: LocationId = LocationId::new(30000142);

    fn call(call_id: u64, method: &str, args: Vec<CallValue>) -> ClientMessage {
        call_with(call_id, method, args, &[])
    }

    fn call_with(
        call_id: u64,
        method: &str,
        args: Vec<CallValue>,
        kwargs: &[(&str, CallValue)],
    ) -> ClientMessage {
        ClientMessage::Call {
            call_id,
            method: method.to_string(),
            args,
            kwargs: kwargs
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
        }
    }

    async fn bind(state: &AppState, client_id: ClientId) {
        let (tx, _rx) = mpsc::unbounded_channel();
        let reply = handle_message(
            ClientMessage::Bind {
                user_id: USER,
                location_id: LOCATION,
            },
            state,
            client_id,
            &tx,
        )
        .await;
        assert!(matches!(reply, Some(ServerMessage::Bound { .. })));
    }

    #[test]
    fn test_parse_call_without_arguments() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"Call","call_id":3,"method":"DEGetFactions"}"#)
                .unwrap();

        match msg {
            ClientMessage::Call {
                call_id,
                method,
                args,
                kwargs,
            } => {
                assert_eq!(call_id, 3);
                assert_eq!(method, "DEGetFactions");
                assert!(args.is_empty());
                assert!(kwargs.is_empty());
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_empty_result_serializes_as_null() {
        let json = serde_json::to_value(ServerMessage::CallResult {
            call_id: 1,
            result: CallValue::None,
        })
        .unwrap();

        assert_eq!(json["type"], "CallResult");
        assert!(json["result"].is_null());
    }

    #[tokio::test]
    async fn test_heartbeat() {
        let state = test_state().await;
        let (tx, _rx) = mpsc::unbounded_channel();

        let reply = handle_message(ClientMessage::Heartbeat, &state, ClientId::new(), &tx).await;

        assert!(matches!(reply, Some(ServerMessage::Pong)));
    }

    #[tokio::test]
    async fn test_call_before_bind_is_rejected() {
        let state = test_state().await;
        let (tx, _rx) = mpsc::unbounded_channel();

        let reply = handle_message(call(1, "GetArchetypes", vec![]), &state, ClientId::new(), &tx)
            .await;

        assert!(matches!(reply, Some(ServerMessage::Error { ref code, .. }) if code == "NOT_BOUND"));
    }

    #[tokio::test]
    async fn test_bound_call_returns_result() {
        let state = test_state().await;
        let client_id = ClientId::new();
        bind(&state, client_id).await;
        let (tx, _rx) = mpsc::unbounded_channel();

        let reply = handle_message(call(7, "GetArchetypes", vec![]), &state, client_id, &tx).await;

        match reply {
            Some(ServerMessage::CallResult { call_id, result }) => {
                assert_eq!(call_id, 7);
                assert!(matches!(result, CallValue::Map(ref map) if map.contains_key("lines")));
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_not_editable_is_also_a_notice() {
        let state = test_state().await;
        let client_id = ClientId::new();
        bind(&state, client_id).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        handle_message(
            call_with(1, "EditDungeon", vec![10i64.into()], &[("roomID", 100i64.into())]),
            &state,
            client_id,
            &tx,
        )
        .await;
        let ship_id = {
            let bound = state.sessions.read().await.get(client_id).unwrap();
            let session = bound.session.lock().await;
            session.actor().ship_id
        };

        let reply = handle_message(
            call_with(
                2,
                "EditObjectRadius",
                vec![],
                &[
                    ("objectID", ship_id.value().into()),
                    ("radius", 5.0f64.into()),
                ],
            ),
            &state,
            client_id,
            &tx,
        )
        .await;

        assert!(matches!(
            reply,
            Some(ServerMessage::CallFailed { call_id: 2, ref code, .. }) if code == "NOT_EDITABLE"
        ));
        assert!(matches!(rx.try_recv(), Ok(ServerMessage::Notify { .. })));
    }

    #[tokio::test]
    async fn test_release_tears_down_session() {
        let state = test_state().await;
        let client_id = ClientId::new();
        bind(&state, client_id).await;
        assert_eq!(state.world.entity_count().await, 1);

        release_client(&state, client_id).await;

        assert_eq!(state.world.entity_count().await, 0);
        assert_eq!(state.sessions.read().await.client_count(), 0);
    }

    #[tokio::test]
    async fn test_rebind_closes_previous_session() {
        let state = test_state().await;
        let client_id = ClientId::new();
        bind(&state, client_id).await;
        let first_ship = {
            let bound = state.sessions.read().await.get(client_id).unwrap();
            let session = bound.session.lock().await;
            session.actor().ship_id
        };

        bind(&state, client_id).await;

        assert!(state.world.get(first_ship).await.is_none());
        assert_eq!(state.world.entity_count().await, 1);
    }
}
