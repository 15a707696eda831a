//! Ports for the world outside the engine: connected clients and the
//! rules system's result stream.

use async_trait::async_trait;
use tokio::sync::broadcast;

use rollreq_domain::{OutcomeEvent, ParticipantId};
use rollreq_shared::{Announcement, SocketMessage};

use super::error::BroadcastError;

// =============================================================================
// Messaging
// =============================================================================

/// Relays socket payloads to connected clients.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RollBroadcaster: Send + Sync {
    async fn emit(&self, sender: &ParticipantId, message: SocketMessage)
        -> Result<(), BroadcastError>;
}

/// Where announcements end up (the chat log).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnnouncementSink: Send + Sync {
    async fn create(&self, announcement: Announcement) -> Result<(), BroadcastError>;
}

// =============================================================================
// Participants
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParticipantDirectory: Send + Sync {
    /// Players (not GMs) currently reachable.
    async fn active_players(&self) -> Vec<ParticipantId>;

    /// Name to show for a participant, if known.
    async fn display_name(&self, participant: &ParticipantId) -> Option<String>;
}

// =============================================================================
// Outcomes
// =============================================================================

/// A live outcome feed plus the events that preceded it.
pub struct OutcomeSubscription {
    /// Most recent events, oldest first.
    pub replay: Vec<OutcomeEvent>,
    pub live: broadcast::Receiver<OutcomeEvent>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OutcomeSource: Send + Sync {
    /// Subscribe to new events, together with up to `replay` past ones.
    /// No event is both replayed and delivered live.
    async fn subscribe(&self, replay: usize) -> OutcomeSubscription;
}
