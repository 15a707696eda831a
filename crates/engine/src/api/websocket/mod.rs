//! WebSocket handling for GM and player connections.
//!
//! Handles the WebSocket protocol between the engine and its clients.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

mod ws_publish;
mod ws_results;
mod ws_session;

pub mod error_sanitizer;

use rollreq_domain::{ParticipantId, RequestId};
use rollreq_shared::{ClientMessage, ServerMessage};

use super::connections::{ConnectionInfo, ConnectionManager};
use crate::app::App;

/// Buffer size for per-connection message channel.
const CONNECTION_CHANNEL_BUFFER: usize = 256;

/// Combined state for WebSocket handlers.
pub struct WsState {
    pub app: Arc<App>,
    pub connections: Arc<ConnectionManager>,
    /// Live results views, keyed by watching connection and request.
    pub watchers: DashMap<(Uuid, RequestId), CancellationToken>,
}

impl WsState {
    pub fn new(app: Arc<App>) -> Self {
        let connections = app.connections.clone();
        Self {
            app,
            connections,
            watchers: DashMap::new(),
        }
    }
}

/// WebSocket upgrade handler - entry point for new connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<WsState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<WsState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let connection_id = Uuid::new_v4();

    // Create a bounded channel for sending messages to this client
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(CONNECTION_CHANNEL_BUFFER);

    state.connections.register(connection_id, tx.clone()).await;

    tracing::info!(connection_id = %connection_id, "WebSocket connection established");

    // Spawn a task to forward messages from the channel to the WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(msg) => {
                    if let Some(response) =
                        handle_message(msg, &state, connection_id, tx.clone()).await
                    {
                        if tx.try_send(response).is_err() {
                            tracing::warn!(
                                connection_id = %connection_id,
                                "Failed to send response, channel full or closed"
                            );
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(connection_id = %connection_id, error = %e, "Failed to parse message");
                    let error = error_response("PARSE_ERROR", &format!("Invalid message format: {}", e));
                    let _ = tx.try_send(error);
                }
            },
            Ok(Message::Ping(_)) => {
                let _ = tx.try_send(ServerMessage::Pong);
            }
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %connection_id, "WebSocket closed by client");
                break;
            }
            Err(e) => {
                tracing::error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Clean up
    ws_results::stop_watching_all(&state, connection_id);
    state.connections.unregister(connection_id).await;
    send_task.abort();

    tracing::info!(connection_id = %connection_id, "WebSocket connection terminated");
}

/// Dispatch a parsed client message to the appropriate handler.
async fn handle_message(
    msg: ClientMessage,
    state: &WsState,
    connection_id: Uuid,
    sender: mpsc::Sender<ServerMessage>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Heartbeat => Some(ServerMessage::Pong),

        ClientMessage::Join {
            user_id,
            name,
            role,
        } => ws_session::handle_join(state, connection_id, user_id, name, role).await,

        // GM actions
        ClientMessage::PublishRollRequest { groups, recipients } => {
            ws_publish::handle_publish(state, connection_id, groups, recipients).await
        }
        ClientMessage::AnnounceRolls { groups } => {
            ws_publish::handle_announce(state, connection_id, groups).await
        }
        ClientMessage::UpdateStyle { style } => {
            ws_publish::handle_update_style(state, connection_id, style).await
        }

        // Results
        ClientMessage::ReportOutcome { report } => {
            ws_results::handle_report_outcome(state, connection_id, report).await
        }
        ClientMessage::WatchResults { request_id } => {
            ws_results::handle_watch_results(state, connection_id, request_id, sender).await
        }
        ClientMessage::UnwatchResults { request_id } => {
            ws_results::handle_unwatch_results(state, connection_id, request_id)
        }
    }
}

fn error_response(code: &str, message: &str) -> ServerMessage {
    ServerMessage::error(code, message)
}

fn warning_response(code: &str, message: &str) -> ServerMessage {
    ServerMessage::warning(code, message)
}

/// Look up a joined connection, returning an error response if it has not joined.
async fn require_joined(
    state: &WsState,
    connection_id: Uuid,
) -> Result<(ConnectionInfo, ParticipantId), ServerMessage> {
    let info = state
        .connections
        .get(connection_id)
        .await
        .ok_or_else(|| error_response("NOT_CONNECTED", "Connection not found"))?;
    let user_id = info
        .user_id
        .clone()
        .ok_or_else(|| error_response("NOT_JOINED", "Join before sending this message"))?;
    Ok((info, user_id))
}

/// Verify that the connection has GM authorization, returning a warning if not.
fn require_gm(info: &ConnectionInfo) -> Result<(), ServerMessage> {
    if info.is_gm() {
        Ok(())
    } else {
        Err(warning_response(
            "UNAUTHORIZED",
            error_sanitizer::messages::UNAUTHORIZED,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::config::EngineConfig;
    use crate::infrastructure::settings::InMemorySettingsStore;
    use rollreq_domain::{
        RecordId, RollCatalog, RollGroup, RollItem, REQUEST_ID_OPTION, ROLL_ID_OPTION,
    };
    use rollreq_shared::{CheckResultReport, ParticipantRole, SocketMessage, StyleSettings};

    struct Client {
        id: Uuid,
        tx: mpsc::Sender<ServerMessage>,
        rx: mpsc::Receiver<ServerMessage>,
    }

    impl Client {
        async fn send(&self, state: &WsState, msg: ClientMessage) -> Option<ServerMessage> {
            handle_message(msg, state, self.id, self.tx.clone()).await
        }

        async fn next(&mut self) -> ServerMessage {
            tokio::time::timeout(Duration::from_secs(1), self.rx.recv())
                .await
                .expect("timed out")
                .expect("channel closed")
        }
    }

    async fn state() -> WsState {
        let app = App::new(
            Arc::new(InMemorySettingsStore::new()),
            RollCatalog::standard(),
            Arc::new(ConnectionManager::new()),
            &EngineConfig::default(),
        )
        .await
        .unwrap();
        WsState::new(Arc::new(app))
    }

    async fn client(state: &WsState, user: &str, role: ParticipantRole) -> Client {
        let (tx, rx) = mpsc::channel(32);
        let id = Uuid::new_v4();
        state.connections.register(id, tx.clone()).await;
        let client = Client { id, tx, rx };
        let joined = client
            .send(
                state,
                ClientMessage::Join {
                    user_id: ParticipantId::new(user),
                    name: user.to_string(),
                    role,
                },
            )
            .await;
        assert!(matches!(joined, Some(ServerMessage::Joined { .. })));
        client
    }

    fn groups() -> Vec<RollGroup> {
        vec![RollGroup::titled("Trap").with_item(RollItem::check("reflex", 21))]
    }

    fn warning_code(msg: Option<ServerMessage>) -> String {
        match msg {
            Some(ServerMessage::Warning { code, .. }) => code,
            other => panic!("expected warning, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn players_cannot_publish() {
        let state = state().await;
        let player = client(&state, "p1", ParticipantRole::Player).await;
        let response = player
            .send(
                &state,
                ClientMessage::PublishRollRequest {
                    groups: groups(),
                    recipients: None,
                },
            )
            .await;
        assert_eq!(warning_code(response), "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn unjoined_connection_is_rejected() {
        let state = state().await;
        let (tx, _rx) = mpsc::channel(4);
        let id = Uuid::new_v4();
        state.connections.register(id, tx.clone()).await;
        let response = handle_message(
            ClientMessage::AnnounceRolls { groups: groups() },
            &state,
            id,
            tx,
        )
        .await;
        assert!(matches!(
            response,
            Some(ServerMessage::Error { code, .. }) if code == "NOT_JOINED"
        ));
    }

    #[tokio::test]
    async fn publish_preconditions_are_warnings() {
        let state = state().await;
        let gm = client(&state, "gm", ParticipantRole::Gm).await;

        let empty = gm
            .send(
                &state,
                ClientMessage::PublishRollRequest {
                    groups: vec![RollGroup::new()],
                    recipients: None,
                },
            )
            .await;
        assert_eq!(warning_code(empty), "EMPTY_CONTENT");

        let nobody = gm
            .send(
                &state,
                ClientMessage::PublishRollRequest {
                    groups: groups(),
                    recipients: None,
                },
            )
            .await;
        assert_eq!(warning_code(nobody), "NOBODY_REACHABLE");

        let none_chosen = gm
            .send(
                &state,
                ClientMessage::PublishRollRequest {
                    groups: groups(),
                    recipients: Some(Vec::new()),
                },
            )
            .await;
        assert_eq!(warning_code(none_chosen), "NO_RECIPIENTS");

        let offline_only = gm
            .send(
                &state,
                ClientMessage::PublishRollRequest {
                    groups: groups(),
                    recipients: Some(vec![ParticipantId::new("offline-player")]),
                },
            )
            .await;
        assert_eq!(warning_code(offline_only), "NOBODY_REACHABLE");
        assert!(state.app.stores.history.list().await.is_empty());

        let item = RollItem::check("reflex", 21);
        let duplicated = gm
            .send(
                &state,
                ClientMessage::PublishRollRequest {
                    groups: vec![
                        RollGroup::titled("G1").with_item(item.clone()),
                        RollGroup::titled("G2").with_item(item),
                    ],
                    recipients: None,
                },
            )
            .await;
        assert_eq!(warning_code(duplicated), "INVALID_CONTENT");
    }

    #[tokio::test]
    async fn publish_report_and_watch_results() {
        let state = state().await;
        let mut gm = client(&state, "gm", ParticipantRole::Gm).await;
        let mut player = client(&state, "p1", ParticipantRole::Player).await;

        let published = gm
            .send(
                &state,
                ClientMessage::PublishRollRequest {
                    groups: groups(),
                    recipients: None,
                },
            )
            .await;
        let request_id = match published {
            Some(ServerMessage::Published {
                request_id,
                open_results,
                ..
            }) => {
                assert!(open_results);
                request_id
            }
            other => panic!("unexpected response: {other:?}"),
        };

        let item_id = match player.next().await {
            ServerMessage::Socket {
                sender_is_gm: true,
                message: SocketMessage::RollRequest { groups, .. },
                ..
            } => groups[0].items[0].id,
            other => panic!("unexpected message: {other:?}"),
        };

        assert!(gm
            .send(&state, ClientMessage::WatchResults { request_id })
            .await
            .is_none());
        assert!(matches!(gm.next().await, ServerMessage::ResultsUpdated { .. }));

        // The author is always the reporting connection's user.
        let report = CheckResultReport {
            author_id: ParticipantId::new("someone-else"),
            record_id: RecordId::new("msg-1"),
            outcome: Some("failure".into()),
            is_reroll: false,
            options: vec![
                format!("{}{}", ROLL_ID_OPTION, item_id),
                format!("{}{}", REQUEST_ID_OPTION, request_id),
            ],
            deleted: false,
        };
        assert!(player
            .send(&state, ClientMessage::ReportOutcome { report })
            .await
            .is_none());

        match gm.next().await {
            ServerMessage::ResultsUpdated { results, .. } => {
                assert_eq!(results.participants[0].participant_id, ParticipantId::new("p1"));
                assert_eq!(results.participants[0].groups.len(), 1);
            }
            other => panic!("unexpected message: {other:?}"),
        }

        gm.send(&state, ClientMessage::UnwatchResults { request_id })
            .await;
        assert!(state.watchers.is_empty());
    }

    #[tokio::test]
    async fn watching_unknown_request_is_not_found() {
        let state = state().await;
        let gm = client(&state, "gm", ParticipantRole::Gm).await;
        let response = gm
            .send(
                &state,
                ClientMessage::WatchResults {
                    request_id: RequestId::new(),
                },
            )
            .await;
        assert!(matches!(
            response,
            Some(ServerMessage::Error { code, .. }) if code == "NOT_FOUND"
        ));
    }

    #[tokio::test]
    async fn style_update_reaches_other_clients() {
        let state = state().await;
        let gm = client(&state, "gm", ParticipantRole::Gm).await;
        let mut player = client(&state, "p1", ParticipantRole::Player).await;
        let style = StyleSettings {
            outer_container: "border: 1px solid".into(),
            ..StyleSettings::default()
        };

        assert!(gm
            .send(&state, ClientMessage::UpdateStyle { style: style.clone() })
            .await
            .is_none());
        match player.next().await {
            ServerMessage::Socket {
                message: SocketMessage::StyleUpdate { data },
                ..
            } => assert_eq!(data, style),
            other => panic!("unexpected message: {other:?}"),
        }
        assert_eq!(state.app.use_cases.settings.get_style().await.unwrap(), style);
    }

    #[tokio::test]
    async fn disconnect_stops_watchers() {
        let state = state().await;
        let gm = client(&state, "gm", ParticipantRole::Gm).await;
        let request = rollreq_domain::RollRequest::new(groups(), [ParticipantId::new("p1")]);
        let request_id = request.id;
        state.app.stores.requests.insert(request);

        gm.send(&state, ClientMessage::WatchResults { request_id })
            .await;
        assert_eq!(state.watchers.len(), 1);

        ws_results::stop_watching_all(&state, gm.id);
        assert!(state.watchers.is_empty());
    }
}
