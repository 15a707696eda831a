//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Settings storage (SQLite, in memory)
//! - Client messaging (WebSocket connections)
//! - Check results (in-process outcome bus)
//! - Clock (for testing)

mod error;
mod external;
mod repos;
mod testing;

pub use error::{BroadcastError, RepoError};

// =============================================================================
// Storage Ports
// =============================================================================
pub use repos::SettingsStore;

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    AnnouncementSink, OutcomeSource, OutcomeSubscription, ParticipantDirectory, RollBroadcaster,
};

pub use testing::ClockPort;

#[cfg(test)]
pub use external::{
    MockAnnouncementSink, MockOutcomeSource, MockParticipantDirectory, MockRollBroadcaster,
};
#[cfg(test)]
pub use repos::MockSettingsStore;
#[cfg(test)]
pub use testing::MockClockPort;
