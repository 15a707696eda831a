//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod catalog_file;
pub mod clock;
pub mod outcome_bus;
pub mod ports;
pub mod settings;
