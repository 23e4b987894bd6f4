// src/deliver/mod.rs

//! Delivery modes: secrets as environment variables, or as a file path.
//!
//! Both flows share the same ordering rule: if a target user is requested,
//! the identity switch happens first, before any temp dir, FIFO or child
//! exists.
//!
//! - [`exec_with_env`]: decrypted `KEY=VALUE` lines become the child's
//!   environment. With `same_process` the process image is replaced instead
//!   of spawning a child.
//! - [`exec_with_file`]: the plaintext is streamed through a FIFO in a
//!   private temp dir and `{}` in the command is replaced with its path.

mod request;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::env::EnvironmentBuilder;
use crate::errors::{ExecError, Result};
use crate::exec::{self, ChildOutcome, LaunchMode};
use crate::pipe::{Cancel, CancelReason, FALLBACK_FILENAME};
use crate::platform::Platform;

pub use request::ExecRequest;

/// Substituted with the secret file path in `exec_with_file` commands.
pub const PLACEHOLDER: &str = "{}";

const TEMP_DIR_PREFIX: &str = ".sealexec";

fn switch_user_if_requested(platform: &dyn Platform, request: &ExecRequest) -> Result<()> {
    if let Some(user) = request.user.as_deref() {
        let identity = platform.switch_identity(user)?;
        debug!(user = %identity.name, uid = identity.uid, "running as target user");
    }
    Ok(())
}

/// Run the command with the secrets exported as environment variables.
///
/// Returns only when a child was spawned; with `same_process` a successful
/// call never comes back.
pub async fn exec_with_env(platform: &dyn Platform, request: &ExecRequest) -> Result<ChildOutcome> {
    if request.same_process && request.background {
        return Err(ExecError::Config(
            "background is not supported for same-process execution".to_string(),
        ));
    }

    switch_user_if_requested(platform, request)?;

    let env = EnvironmentBuilder::new()
        .pristine(request.pristine)
        .secrets(&request.plaintext)
        .extras(request.extra_env.iter().cloned())
        .build()?;

    let launch = if request.same_process {
        LaunchMode::ReplaceProcess
    } else {
        LaunchMode::SpawnChild
    };
    info!(platform = platform.name(), ?launch, "launching command");

    if launch == LaunchMode::ReplaceProcess {
        match platform.replace_process_image(&request.command, &env)? {}
    }

    exec::run(platform.build_child(&request.command), &env, request.background).await
}

/// Run the command with the secrets readable once from a FIFO path.
pub async fn exec_with_file(platform: &dyn Platform, request: &ExecRequest) -> Result<ChildOutcome> {
    if request.same_process {
        return Err(ExecError::Config(
            "same-process execution is only available for env delivery".to_string(),
        ));
    }

    switch_user_if_requested(platform, request)?;

    let env = EnvironmentBuilder::new()
        .pristine(request.pristine)
        .extras(request.extra_env.iter().cloned())
        .build()?;

    let dir = tempfile::Builder::new()
        .prefix(TEMP_DIR_PREFIX)
        .tempdir()
        .map_err(|e| ExecError::creation("private temp directory", e))?;

    let filename = request.filename.as_deref().unwrap_or(FALLBACK_FILENAME);
    let fifo = platform.create_pipe(dir.path(), filename)?;
    let path = fifo.path().to_path_buf();

    if !request.command.contains(PLACEHOLDER) {
        warn!("command has no {PLACEHOLDER} placeholder; the secret will only be delivered if it opens {}", path.display());
    }
    let command = request
        .command
        .replace(PLACEHOLDER, &path.display().to_string());

    let (cancel_tx, cancel_rx) = oneshot::channel();
    let mut cancel = Cancel::never().with_signal(cancel_rx);
    if let Some(timeout) = request.pipe_timeout {
        cancel = cancel.with_timeout(timeout);
    }
    let mut writer = tokio::spawn(fifo.write_all_owned(request.plaintext.clone(), cancel));

    let mut child = match exec::spawn(platform.build_child(&command), &env) {
        Ok(child) => child,
        Err(e) => {
            let _ = cancel_tx.send(());
            let _ = writer.await;
            return Err(e);
        }
    };
    let pid = child.id();

    if request.background {
        return tokio::select! {
            delivered = &mut writer => {
                join_writer(delivered)?;
                info!(?pid, "secret delivered; leaving child running in background");
                Ok(ChildOutcome::Detached { pid })
            }
            status = child.wait() => {
                let code = exec::exit_code(status?);
                stop_writer(cancel_tx, writer).await?;
                Ok(ChildOutcome::Exited(code))
            }
        };
    }

    let outcome = exec::wait_child(child).await?;
    stop_writer(cancel_tx, writer).await?;
    Ok(outcome)
}

/// Cancel a writer that may still be waiting for its reader and collect its
/// result. Only the cancellation sent here is tolerated; an elapsed pipe
/// deadline means the secret was never delivered and stays an error.
async fn stop_writer(
    cancel_tx: oneshot::Sender<()>,
    writer: JoinHandle<Result<()>>,
) -> Result<()> {
    let _ = cancel_tx.send(());
    match join_writer(writer.await) {
        Err(ExecError::Cancelled(CancelReason::Signal)) => {
            warn!("command exited without reading the secret file");
            Ok(())
        }
        other => other,
    }
}

fn join_writer(joined: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    joined.map_err(|e| ExecError::Other(anyhow::Error::from(e)))?
}
