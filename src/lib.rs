// src/lib.rs

pub mod cli;
pub mod config;
pub mod deliver;
pub mod env;
pub mod errors;
pub mod exec;
pub mod identity;
pub mod logging;
pub mod pipe;
pub mod platform;
pub mod types;

use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::cli::{CliArgs, ExecCommand};
use crate::config::ConfigFile;
use crate::deliver::{ExecRequest, exec_with_env, exec_with_file};
use crate::errors::{ExecError, Result};
use crate::types::DeliveryMode;

/// High-level entry point used by `main.rs`.
///
/// Loads the optional config, reads the plaintext, merges CLI flags over
/// config defaults and runs the requested delivery on the native platform.
/// Returns the exit code the process should end with. With
/// `exec-env --same-process` a successful call never returns.
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = config::load_optional(args.config.as_deref())?;
    let plaintext = read_plaintext(&args.command.common().plaintext)?;
    let request = build_request(&args.command, &cfg, plaintext);

    let platform = platform::native();
    let mode = args.command.mode();
    info!(platform = platform.name(), ?mode, "starting secret delivery");
    debug!(?request, "resolved request");

    let outcome = match mode {
        DeliveryMode::Env => exec_with_env(platform, &request).await?,
        DeliveryMode::File => exec_with_file(platform, &request).await?,
    };
    Ok(outcome.exit_code())
}

/// Merge CLI flags over `[exec]` config defaults.
///
/// Booleans are OR-ed; optional values prefer the CLI.
pub fn build_request(command: &ExecCommand, cfg: &ConfigFile, plaintext: Vec<u8>) -> ExecRequest {
    let common = command.common();
    let exec = &cfg.exec;

    let mut request = ExecRequest {
        command: common.command_line(),
        plaintext,
        user: common.user.clone().or_else(|| exec.user.clone()),
        pristine: common.pristine || exec.pristine,
        background: common.background || exec.background,
        same_process: false,
        filename: None,
        extra_env: common.extra_env.clone(),
        pipe_timeout: None,
    };

    match command {
        ExecCommand::ExecEnv(args) => {
            request.same_process = args.same_process || exec.same_process;
        }
        ExecCommand::ExecFile(args) => {
            request.filename = args.filename.clone().or_else(|| exec.filename.clone());
            request.pipe_timeout = args.pipe_timeout.or(cfg.pipe_timeout);
        }
    }
    request
}

fn read_plaintext(source: &Path) -> Result<Vec<u8>> {
    if source == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin().lock().read_to_end(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read(source).map_err(|e| {
        ExecError::Config(format!("reading plaintext {}: {e}", source.display()))
    })
}
