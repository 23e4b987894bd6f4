// src/platform/unsupported.rs

use std::convert::Infallible;
use std::path::Path;

use tracing::error;

use super::Platform;
use crate::env::Environment;
use crate::errors::{ExecError, Result};
use crate::identity::Identity;
use crate::pipe::Fifo;

/// Gate for hosts lacking the security-relevant primitives.
///
/// Every gated call fails before any side effect. There is no emulation and
/// no weaker fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedPlatform;

impl UnsupportedPlatform {
    fn refuse(operation: &'static str) -> ExecError {
        error!(operation, "refusing operation on unsupported platform");
        ExecError::unsupported(operation)
    }
}

impl Platform for UnsupportedPlatform {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn replace_process_image(&self, _command: &str, _env: &Environment) -> Result<Infallible> {
        Err(Self::refuse("same-process execution"))
    }

    fn create_pipe(&self, _directory: &Path, _filename: &str) -> Result<Fifo> {
        Err(Self::refuse("fifos"))
    }

    fn switch_identity(&self, _username: &str) -> Result<Identity> {
        Err(Self::refuse("user switching"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::Cancel;

    #[test]
    fn process_replacement_is_refused() {
        let err = UnsupportedPlatform
            .replace_process_image("true", &Environment::new())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "same-process execution not available on this platform"
        );
    }

    #[test]
    fn user_switching_is_refused() {
        assert!(matches!(
            UnsupportedPlatform.switch_identity("root"),
            Err(ExecError::UnsupportedPlatform { operation: "user switching" })
        ));
    }

    #[tokio::test]
    async fn refused_pipe_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let err = UnsupportedPlatform
            .create_and_write(dir.path(), "secret", b"token=abc", Cancel::never())
            .await
            .unwrap_err();

        assert!(matches!(err, ExecError::UnsupportedPlatform { operation: "fifos" }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn child_descriptor_is_not_gated() {
        let cmd = UnsupportedPlatform.build_child("echo ok");
        assert!(cmd.as_std().get_args().any(|a| a == "echo ok"));
    }
}
