// src/platform/unix.rs

use std::convert::Infallible;
use std::path::Path;

use tracing::info;

use super::Platform;
use crate::env::Environment;
use crate::errors::Result;
use crate::identity::{self, Identity};
use crate::pipe::Fifo;

#[derive(Debug, Clone, Copy, Default)]
pub struct UnixPlatform;

impl Platform for UnixPlatform {
    fn name(&self) -> &'static str {
        "unix"
    }

    fn replace_process_image(&self, command: &str, env: &Environment) -> Result<Infallible> {
        crate::exec::replace_process_image(command, env)
    }

    fn create_pipe(&self, directory: &Path, filename: &str) -> Result<Fifo> {
        Fifo::create(directory, filename)
    }

    fn switch_identity(&self, username: &str) -> Result<Identity> {
        let target = identity::resolve(username)?;
        info!(user = %target.name, uid = target.uid, "dropping privileges");
        identity::switch_to(&target)?;
        Ok(target)
    }
}
