// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file and return the raw, unvalidated `RawConfigFile`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the config for a run.
///
/// - An explicit path must exist and be valid.
/// - Without one, `Sealexec.toml` in the working directory is used if
///   present; otherwise defaults apply.
pub fn load_optional(explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading config");
        return load_and_validate(path);
    }

    let fallback = default_config_path();
    if fallback.is_file() {
        debug!(path = %fallback.display(), "loading default config");
        return load_and_validate(fallback);
    }

    Ok(ConfigFile::default())
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("Sealexec.toml")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::errors::ExecError;

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = load_optional(Some(Path::new("/nonexistent/Sealexec.toml"))).unwrap_err();
        assert!(matches!(err, ExecError::Io(_)));
    }

    #[test]
    fn explicit_file_is_loaded() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[exec]\npristine = true\n").unwrap();
        let cfg = load_optional(Some(file.path())).unwrap();
        assert!(cfg.exec.pristine);
    }
}
