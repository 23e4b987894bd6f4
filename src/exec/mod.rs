// src/exec/mod.rs

//! Process launching.
//!
//! Two ways to start the target command:
//!
//! - [`LaunchMode::ReplaceProcess`]: the current process image becomes
//!   `sh -c <command>`. Same PID, no parent left behind. Unix only; see
//!   [`replace_process_image`].
//! - [`LaunchMode::SpawnChild`]: a child built by [`build_child`] and started
//!   with [`spawn`] while we keep running.

use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::env::Environment;
use crate::errors::{ExecError, Result};

#[cfg(unix)]
mod replace;

#[cfg(unix)]
pub use replace::replace_process_image;

/// Interpreter used for both launch modes on Unix.
pub const UNIX_SHELL: &str = "/bin/sh";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    ReplaceProcess,
    SpawnChild,
}

/// How a spawned child ended, from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildOutcome {
    Exited(i32),
    Detached { pid: Option<u32> },
}

impl ChildOutcome {
    /// Status code the top-level caller should exit with.
    pub fn exit_code(&self) -> i32 {
        match self {
            ChildOutcome::Exited(code) => *code,
            ChildOutcome::Detached { .. } => 0,
        }
    }
}

/// Build a command that runs `command` through the platform interpreter.
///
/// Pure construction: nothing is started, no environment is attached and
/// stdio is left at its defaults. Available on every platform.
pub fn build_child(command: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd.exe");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new(UNIX_SHELL);
        c.arg("-c").arg(command);
        c
    }
}

/// Start `cmd` with exactly `env` as its environment and our stdio.
pub fn spawn(mut cmd: Command, env: &Environment) -> Result<Child> {
    cmd.env_clear()
        .envs(env.iter())
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let child = cmd
        .spawn()
        .map_err(|e| ExecError::creation("child process", e))?;

    info!(pid = ?child.id(), vars = env.len(), "started child process");
    Ok(child)
}

/// Wait for `child` and translate its status into an exit code.
pub async fn wait_child(mut child: Child) -> Result<ChildOutcome> {
    let pid = child.id();
    let status = child.wait().await?;
    let code = exit_code(status);

    debug!(?pid, exit_code = code, success = status.success(), "child process exited");
    Ok(ChildOutcome::Exited(code))
}

/// Spawn and, unless `background`, wait.
pub async fn run(cmd: Command, env: &Environment, background: bool) -> Result<ChildOutcome> {
    let child = spawn(cmd, env)?;
    if background {
        let pid = child.id();
        info!(?pid, "leaving child running in background");
        return Ok(ChildOutcome::Detached { pid });
    }
    wait_child(child).await
}

/// A child killed by a signal maps to `128 + signal`, the way shells do.
pub(crate) fn exit_code(status: std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}
