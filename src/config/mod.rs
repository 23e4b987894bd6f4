// src/config/mod.rs

//! Optional `Sealexec.toml` defaults.
//!
//! - [`model`] holds the serde types.
//! - [`validate`] turns a [`RawConfigFile`] into a checked [`ConfigFile`].
//! - [`loader`] reads and validates a file from disk.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_optional};
pub use model::{ConfigFile, ExecSection, RawConfigFile};
