// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [exec]
/// user = "nobody"
/// pristine = true
/// filename = "secrets.env"
/// pipe_timeout = "30s"
/// ```
///
/// Every field is optional; CLI flags override whatever is set here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub exec: ExecSection,
}

/// `[exec]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecSection {
    /// Target user to drop to before running the command.
    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub pristine: bool,

    #[serde(default)]
    pub background: bool,

    #[serde(default)]
    pub same_process: bool,

    /// FIFO name for file delivery.
    #[serde(default)]
    pub filename: Option<String>,

    /// Duration string (e.g. `"30s"`) bounding the FIFO write.
    #[serde(default)]
    pub pipe_timeout: Option<String>,
}

/// Validated configuration. Only constructed through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub exec: ExecSection,
    pub pipe_timeout: Option<std::time::Duration>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        exec: ExecSection,
        pipe_timeout: Option<std::time::Duration>,
    ) -> Self {
        Self { exec, pipe_timeout }
    }
}
