// src/config/validate.rs

use crate::config::model::{ConfigFile, ExecSection, RawConfigFile};
use crate::errors::{ExecError, Result};
use crate::pipe::validate_name;
use crate::types::parse_duration;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ExecError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_exec_section(&raw.exec)?;
        let pipe_timeout = match raw.exec.pipe_timeout.as_deref() {
            Some(s) => Some(parse_duration(s).map_err(|e| {
                ExecError::Config(format!("[exec].pipe_timeout: {e}"))
            })?),
            None => None,
        };
        Ok(ConfigFile::new_unchecked(raw.exec, pipe_timeout))
    }
}

fn validate_exec_section(exec: &ExecSection) -> Result<()> {
    if let Some(user) = exec.user.as_deref() {
        if user.trim().is_empty() {
            return Err(ExecError::Config(
                "[exec].user must not be empty".to_string(),
            ));
        }
    }

    if let Some(filename) = exec.filename.as_deref() {
        validate_name(filename)
            .map_err(|e| ExecError::Config(format!("[exec].filename: {e}")))?;
    }

    if exec.same_process && exec.background {
        return Err(ExecError::Config(
            "[exec].same_process and [exec].background cannot both be true".to_string(),
        ));
    }

    Ok(())
}
