//! Connection management for WebSocket clients.
//!
//! Tracks connected clients and who they are. Doubles as the engine's view
//! of the table: relaying socket payloads, posting announcements and
//! listing reachable players all go through here.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use rollreq_domain::ParticipantId;
use rollreq_shared::{Announcement, ParticipantRole, ServerMessage, SocketMessage};

use crate::infrastructure::ports::{
    AnnouncementSink, BroadcastError, ParticipantDirectory, RollBroadcaster,
};

/// Information about a connected client.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Unique ID for this connection
    pub connection_id: Uuid,
    /// Set once the client has joined
    pub user_id: Option<ParticipantId>,
    pub name: String,
    pub role: Option<ParticipantRole>,
}

impl ConnectionInfo {
    pub fn is_gm(&self) -> bool {
        self.role.is_some_and(ParticipantRole::is_gm)
    }

    pub fn is_player(&self) -> bool {
        self.role == Some(ParticipantRole::Player)
    }

    fn is_user(&self, user_id: &ParticipantId) -> bool {
        self.user_id.as_ref() == Some(user_id)
    }
}

/// Manages all active WebSocket connections.
pub struct ConnectionManager {
    /// Map of connection_id -> (ConnectionInfo, sender channel)
    connections: RwLock<HashMap<Uuid, (ConnectionInfo, mpsc::Sender<ServerMessage>)>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new, not yet joined, connection.
    pub async fn register(&self, connection_id: Uuid, sender: mpsc::Sender<ServerMessage>) {
        let info = ConnectionInfo {
            connection_id,
            user_id: None,
            name: String::new(),
            role: None,
        };
        let mut connections = self.connections.write().await;
        connections.insert(connection_id, (info, sender));
        tracing::debug!(connection_id = %connection_id, "Connection registered");
    }

    pub async fn unregister(&self, connection_id: Uuid) {
        let mut connections = self.connections.write().await;
        if connections.remove(&connection_id).is_some() {
            tracing::debug!(connection_id = %connection_id, "Connection unregistered");
        }
    }

    pub async fn get(&self, connection_id: Uuid) -> Option<ConnectionInfo> {
        let connections = self.connections.read().await;
        connections.get(&connection_id).map(|(info, _)| info.clone())
    }

    /// Identify a connection. A user may join from several connections.
    pub async fn join(
        &self,
        connection_id: Uuid,
        user_id: ParticipantId,
        name: String,
        role: ParticipantRole,
    ) -> Result<(), ConnectionError> {
        let mut connections = self.connections.write().await;
        let (info, _) = connections
            .get_mut(&connection_id)
            .ok_or(ConnectionError::NotFound)?;
        tracing::info!(
            connection_id = %connection_id,
            user_id = %user_id,
            role = ?role,
            "Connection joined"
        );
        info.user_id = Some(user_id);
        info.name = name;
        info.role = Some(role);
        Ok(())
    }

    /// Send to every joined connection matching `filter`; returns how many
    /// connections accepted the message.
    async fn send_where(
        &self,
        message: &ServerMessage,
        filter: impl Fn(&ConnectionInfo) -> bool,
    ) -> usize {
        let connections = self.connections.read().await;
        let mut delivered = 0;
        for (info, sender) in connections.values() {
            if info.user_id.is_none() || !filter(info) {
                continue;
            }
            match sender.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!(
                    connection_id = %info.connection_id,
                    error = %e,
                    "Failed to send message"
                ),
            }
        }
        delivered
    }

    async fn is_gm_user(&self, user_id: &ParticipantId) -> bool {
        let connections = self.connections.read().await;
        connections
            .values()
            .any(|(info, _)| info.is_user(user_id) && info.is_gm())
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RollBroadcaster for ConnectionManager {
    async fn emit(
        &self,
        sender: &ParticipantId,
        message: SocketMessage,
    ) -> Result<(), BroadcastError> {
        let addressees = message.addressees().cloned();
        let envelope = ServerMessage::Socket {
            sender_id: sender.clone(),
            sender_is_gm: self.is_gm_user(sender).await,
            message,
        };

        match addressees {
            Some(users) => {
                let delivered = self
                    .send_where(&envelope, |info| {
                        info.user_id.as_ref().is_some_and(|u| users.contains(u))
                    })
                    .await;
                if delivered == 0 && !users.is_empty() {
                    return Err(BroadcastError::Delivery(
                        "no addressed participant is connected".to_string(),
                    ));
                }
                tracing::debug!(addressed = users.len(), delivered, "Roll request relayed");
            }
            None => {
                let delivered = self.send_where(&envelope, |info| !info.is_user(sender)).await;
                tracing::debug!(delivered, "Socket message relayed to everyone");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AnnouncementSink for ConnectionManager {
    async fn create(&self, announcement: Announcement) -> Result<(), BroadcastError> {
        let announcement_id = announcement.id;
        let delivered = self
            .send_where(&ServerMessage::Announcement { announcement }, |_| true)
            .await;
        tracing::info!(announcement_id = %announcement_id, delivered, "Announcement posted");
        Ok(())
    }
}

#[async_trait]
impl ParticipantDirectory for ConnectionManager {
    async fn active_players(&self) -> Vec<ParticipantId> {
        let connections = self.connections.read().await;
        connections
            .values()
            .filter(|(info, _)| info.is_player())
            .filter_map(|(info, _)| info.user_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    async fn display_name(&self, participant: &ParticipantId) -> Option<String> {
        let connections = self.connections.read().await;
        connections
            .values()
            .find(|(info, _)| info.is_user(participant) && !info.name.is_empty())
            .map(|(info, _)| info.name.clone())
    }
}

/// Errors that can occur during connection operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConnectionError {
    #[error("Connection not found")]
    NotFound,
}
