// src/platform/mod.rs

//! Capability interface over the OS primitives the exec flow needs.
//!
//! Each host gets one [`Platform`] implementation, chosen at build time by
//! [`native`]:
//!
//! - [`UnixPlatform`] provides every capability.
//! - [`UnsupportedPlatform`] is the gate for hosts without process
//!   replacement, FIFOs or identity switching. Those operations return
//!   [`ExecError::UnsupportedPlatform`] before touching anything. Building a
//!   child descriptor and composing a pipe path stay available, since they
//!   have no security meaning of their own.
//!
//! Delivery code and tests talk to `&dyn Platform`, so a recording fake can
//! stand in for the real thing.
//!
//! [`ExecError::UnsupportedPlatform`]: crate::errors::ExecError::UnsupportedPlatform

use std::convert::Infallible;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use crate::env::Environment;
use crate::errors::Result;
use crate::identity::Identity;
use crate::pipe::{Cancel, Fifo};

#[cfg(unix)]
mod unix;
mod unsupported;

#[cfg(unix)]
pub use unix::UnixPlatform;
pub use unsupported::UnsupportedPlatform;

pub trait Platform: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Replace the running process with `sh -c command`. Never returns on
    /// success.
    fn replace_process_image(&self, command: &str, env: &Environment) -> Result<Infallible>;

    /// Create a private, single-use FIFO at `directory/filename`.
    fn create_pipe(&self, directory: &Path, filename: &str) -> Result<Fifo>;

    /// Resolve `username` and irreversibly switch the process to it.
    fn switch_identity(&self, username: &str) -> Result<Identity>;

    /// Where a reader should open the pipe. No I/O.
    fn resolve_path(&self, directory: &Path, filename: &str) -> PathBuf {
        crate::pipe::resolve_path(directory, filename)
    }

    /// Child descriptor for `command`; see [`crate::exec::build_child`].
    fn build_child(&self, command: &str) -> tokio::process::Command {
        crate::exec::build_child(command)
    }

    /// Create a FIFO and stream `contents` through it to a single reader.
    fn create_and_write<'a>(
        &'a self,
        directory: &'a Path,
        filename: &'a str,
        contents: &'a [u8],
        cancel: Cancel,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let fifo = self.create_pipe(directory, filename)?;
            fifo.write_all(contents, cancel).await
        })
    }
}

/// The implementation for the host this binary was built for.
pub fn native() -> &'static dyn Platform {
    #[cfg(unix)]
    {
        &UnixPlatform
    }
    #[cfg(not(unix))]
    {
        &UnsupportedPlatform
    }
}
