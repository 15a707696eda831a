//! Use cases - User story orchestration.
//!
//! Each module covers one thing a GM or player does: publish a request,
//! watch its results, share it as a link, or adjust settings.

pub mod publish;
pub mod results;
pub mod settings;
pub mod share;

pub use publish::{AnnounceResult, NoRecipients, PublishError, PublishResult, Publisher};
pub use results::{CorrelationEngine, ResultsHandle, REPLAY_WINDOW};
pub use settings::{SettingsError, SettingsOps};
pub use share::{DecodedLink, ShareError, ShareOps, SharedGroups};
