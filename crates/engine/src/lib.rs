//! RollReq Engine library.
//!
//! This crate contains all server-side code for publishing roll requests
//! and following their results.
//!
//! ## Structure
//!
//! - `stores/` - Publish history and known requests
//! - `use_cases/` - Publishing, results correlation, share links, settings
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP and WebSocket entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod config;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;

pub use app::App;
pub use config::EngineConfig;
