//! Settings use cases.

mod settings_ops;

pub use settings_ops::{SettingsError, SettingsOps, AUTO_CLOSE_KEY, SHOW_RESULTS_KEY};
