// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::{DeliveryMode, parse_duration};

/// Command-line arguments for `sealexec`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sealexec",
    version,
    about = "Hand decrypted secrets to a command without writing them to disk.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a config file (TOML).
    ///
    /// Default: `Sealexec.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SEALEXEC_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: ExecCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ExecCommand {
    /// Run a command with the secrets exported as environment variables.
    ExecEnv(EnvArgs),

    /// Run a command that reads the secrets from a file path (`{}`).
    ExecFile(FileArgs),
}

impl ExecCommand {
    pub fn mode(&self) -> DeliveryMode {
        match self {
            ExecCommand::ExecEnv(_) => DeliveryMode::Env,
            ExecCommand::ExecFile(_) => DeliveryMode::File,
        }
    }

    pub fn common(&self) -> &CommonArgs {
        match self {
            ExecCommand::ExecEnv(args) => &args.common,
            ExecCommand::ExecFile(args) => &args.common,
        }
    }
}

/// Flags shared by both delivery modes.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Decrypted plaintext to deliver. `-` reads stdin.
    #[arg(long, value_name = "PATH", default_value = "-")]
    pub plaintext: PathBuf,

    /// Drop to this user before running the command.
    #[arg(long, value_name = "USER")]
    pub user: Option<String>,

    /// Do not inherit the current environment.
    #[arg(long)]
    pub pristine: bool,

    /// Do not wait for the command to finish.
    #[arg(long)]
    pub background: bool,

    /// Extra environment entry for the command (repeatable).
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub extra_env: Vec<String>,

    /// The command to run, handed to the shell as one string.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl CommonArgs {
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

#[derive(Debug, Clone, Args)]
pub struct EnvArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Replace this process with the command instead of spawning a child.
    #[arg(long)]
    pub same_process: bool,
}

#[derive(Debug, Clone, Args)]
pub struct FileArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Name of the FIFO the command reads from.
    #[arg(long, value_name = "NAME")]
    pub filename: Option<String>,

    /// Give up delivering after this long (e.g. `30s`). Default: wait until
    /// the command exits.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub pipe_timeout: Option<Duration>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
