//! RollReq Shared - Wire types for the engine and its clients
//!
//! This crate contains everything that crosses the socket or leaves the
//! engine as text:
//! - Socket payloads relayed between clients (`roll-request`, `style-update`)
//! - WebSocket envelopes (ClientMessage, ServerMessage)
//! - Check result reports and result snapshots
//! - The transport codec and share links
//!
//! # Design Principles
//!
//! 1. **No business logic** - correlation and publishing live in the engine
//! 2. **Domain vocabulary** - item and group types come from `rollreq-domain`

pub mod codec;
pub mod messages;
pub mod share_link;

pub use codec::{
    decode, decode_with, encode, DecodeError, DecodePolicy, EncodeError, MAX_DECODED_BYTES,
};

// =============================================================================
// WebSocket Message Types
// =============================================================================
pub use messages::{
    accepts_roll_request,
    accepts_style_update,
    // Results
    Announcement,
    CheckResultReport,
    // Main message enums
    ClientMessage,
    GroupResult,
    ParticipantResults,
    ParticipantRole,
    ResultsSnapshot,
    ServerMessage,
    // Relayed payloads
    SocketMessage,
    StyleSettings,
};

pub use share_link::{find_share_links, share_link, ShareLink};
