// src/deliver/request.rs

use std::fmt;
use std::time::Duration;

/// Everything one invocation needs. Built once, never mutated afterwards.
#[derive(Clone, Default)]
pub struct ExecRequest {
    /// Shell command line, passed to the interpreter untouched.
    pub command: String,

    /// Decrypted secret material.
    pub plaintext: Vec<u8>,

    /// Drop to this user before anything else happens.
    pub user: Option<String>,

    /// Start from an empty environment instead of inheriting ours.
    pub pristine: bool,

    /// Don't wait for the command to finish.
    pub background: bool,

    /// Replace this process instead of spawning a child (env delivery only).
    pub same_process: bool,

    /// FIFO file name for file delivery.
    pub filename: Option<String>,

    /// Extra `KEY=VALUE` entries applied after the secrets.
    pub extra_env: Vec<String>,

    /// Give up on the FIFO write after this long. `None` waits until the
    /// command exits.
    pub pipe_timeout: Option<Duration>,
}

// Hand-written so the plaintext never ends up in logs.
impl fmt::Debug for ExecRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecRequest")
            .field("command", &self.command)
            .field("plaintext", &format_args!("<{} bytes redacted>", self.plaintext.len()))
            .field("user", &self.user)
            .field("pristine", &self.pristine)
            .field("background", &self.background)
            .field("same_process", &self.same_process)
            .field("filename", &self.filename)
            .field("extra_env", &self.extra_env.len())
            .field("pipe_timeout", &self.pipe_timeout)
            .finish()
    }
}
