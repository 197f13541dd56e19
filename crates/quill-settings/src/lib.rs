//! # quill-settings
//!
//! Configuration loading for the quill server.
//!
//! Settings come from a JSON file (default `config.json`) with `QUILL_*`
//! environment overrides applied on top. Agent and instruction sections are
//! required, as is the `app_config` section; its fields fall back to compiled defaults. Any failure
//! here is fatal at startup.

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{apply_env_overrides, load_settings_from_path, validate};
pub use types::*;
