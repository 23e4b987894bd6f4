use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use sealexec::env::Environment;
use sealexec::errors::{ExecError, Result};
use sealexec::identity::Identity;
use sealexec::pipe::Fifo;
use sealexec::platform::Platform;

/// One recorded capability call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SwitchIdentity(String),
    ReplaceProcessImage { command: String, env: Vec<String> },
    CreatePipe { directory: PathBuf, filename: String },
}

/// A fake platform that:
/// - records every gated call in order
/// - pretends to switch identity without touching uid/gid
/// - records process replacement and then fails, since a test process
///   cannot be replaced
/// - creates real FIFOs, so delivery can be exercised end to end
#[derive(Debug, Clone, Default)]
pub struct RecordingPlatform {
    calls: Arc<Mutex<Vec<Call>>>,
}

/// Message of the error returned in place of a real process replacement.
pub const REPLACE_RECORDED: &str = "process replacement recorded";

impl RecordingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Platform for RecordingPlatform {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn replace_process_image(&self, command: &str, env: &Environment) -> Result<Infallible> {
        self.record(Call::ReplaceProcessImage {
            command: command.to_string(),
            env: env.to_pairs(),
        });
        Err(ExecError::Other(anyhow::anyhow!(REPLACE_RECORDED)))
    }

    fn create_pipe(&self, directory: &Path, filename: &str) -> Result<Fifo> {
        self.record(Call::CreatePipe {
            directory: directory.to_path_buf(),
            filename: filename.to_string(),
        });
        Fifo::create(directory, filename)
    }

    fn switch_identity(&self, username: &str) -> Result<Identity> {
        self.record(Call::SwitchIdentity(username.to_string()));
        Ok(Identity {
            name: username.to_string(),
            uid: 65534,
            gid: 65534,
        })
    }
}
