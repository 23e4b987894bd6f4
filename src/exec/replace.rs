// src/exec/replace.rs

use std::convert::Infallible;
use std::os::unix::process::CommandExt;

use tracing::info;

use super::UNIX_SHELL;
use crate::env::Environment;
use crate::errors::{ExecError, Result};

/// Replace the current process image with `sh -c command`.
///
/// `env` becomes the complete environment of the new image. Only returns
/// when `execve` fails; on success this process is gone.
pub fn replace_process_image(command: &str, env: &Environment) -> Result<Infallible> {
    let mut cmd = std::process::Command::new(UNIX_SHELL);
    cmd.arg("-c").arg(command).env_clear().envs(env.iter());

    info!(
        pid = std::process::id(),
        vars = env.len(),
        "replacing process image"
    );

    let err = cmd.exec();
    Err(ExecError::creation(
        format!("process image for {UNIX_SHELL}"),
        err,
    ))
}
