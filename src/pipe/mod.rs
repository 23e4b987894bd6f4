// src/pipe/mod.rs

//! Named-pipe secret delivery.
//!
//! Secrets meant for a command that expects a *file path* are streamed
//! through a FIFO instead of a temporary file, so the bytes only ever live in
//! kernel pipe buffers. A [`Fifo`] is single-use: one writer, one read
//! session, and the path is unlinked as soon as the guard is dropped.
//!
//! - [`resolve_path`] is pure path composition.
//! - [`Fifo::create`] makes the conduit (exclusive, mode `0600`).
//! - [`Fifo::write_all`] waits for a reader, writes, closes and unlinks. It
//!   can be bounded with a [`Cancel`].

mod cancel;

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::{ExecError, Result};

pub use cancel::{Cancel, CancelReason};

/// File name used when the caller does not pick one.
pub const FALLBACK_FILENAME: &str = "tmp-file";

/// Path a reader should open to consume the pipe. Performs no I/O.
pub fn resolve_path(directory: impl AsRef<Path>, filename: &str) -> PathBuf {
    directory.as_ref().join(filename)
}

/// Reject anything that is not a single, plain path component.
pub fn validate_name(filename: &str) -> Result<()> {
    let bad = filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains('/')
        || filename.contains('\0');
    if bad {
        return Err(ExecError::InvalidPipeName(filename.to_string()));
    }
    Ok(())
}

/// Owning guard for a FIFO on disk.
#[derive(Debug)]
pub struct Fifo {
    path: PathBuf,
}

impl Fifo {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Same as `write_all`, for callers that hand the write to `tokio::spawn`.
    pub async fn write_all_owned(self, contents: Vec<u8>, cancel: Cancel) -> Result<()> {
        self.write_all(&contents, cancel).await
    }
}

#[cfg(unix)]
mod unix {
    use std::time::Duration;

    use nix::errno::Errno;
    use nix::sys::stat::Mode;
    use tokio::io::AsyncWriteExt;
    use tokio::net::unix::pipe;

    use super::*;

    /// How often to retry opening the write side while no reader is present.
    const READER_POLL_INTERVAL: Duration = Duration::from_millis(10);

    impl Fifo {
        /// Create a FIFO at `directory/filename` readable and writable by the
        /// owner only. Fails if anything already exists at that path.
        pub fn create(directory: impl AsRef<Path>, filename: &str) -> Result<Fifo> {
            validate_name(filename)?;
            let path = resolve_path(directory, filename);

            nix::unistd::mkfifo(&path, Mode::S_IRUSR | Mode::S_IWUSR).map_err(|errno| {
                ExecError::creation(format!("fifo {}", path.display()), errno.into())
            })?;

            debug!(path = %path.display(), "created fifo");
            Ok(Fifo { path })
        }

        /// Deliver `contents` to the first reader, then close and unlink.
        ///
        /// Suspends until a reader opens the pipe and every byte has been
        /// handed to the kernel. Without a deadline or signal in `cancel`
        /// this waits forever.
        pub async fn write_all(self, contents: &[u8], mut cancel: Cancel) -> Result<()> {
            if cancel.is_unbounded() {
                debug!(path = %self.path.display(), "waiting for fifo reader without deadline");
            }
            let outcome = tokio::select! {
                res = self.deliver(contents) => res,
                reason = cancel.fired() => Err(ExecError::Cancelled(reason)),
            };

            match &outcome {
                Ok(()) => debug!(path = %self.path.display(), bytes = contents.len(), "secret delivered through fifo"),
                Err(e) => warn!(path = %self.path.display(), error = %e, "fifo delivery aborted"),
            }
            outcome
        }

        async fn deliver(&self, contents: &[u8]) -> Result<()> {
            let mut sender = self.wait_for_reader().await?;
            sender
                .write_all(contents)
                .await
                .map_err(|e| self.delivery_error(e))?;
            sender.shutdown().await.map_err(|e| self.delivery_error(e))?;
            Ok(())
        }

        async fn wait_for_reader(&self) -> Result<pipe::Sender> {
            loop {
                match pipe::OpenOptions::new().open_sender(&self.path) {
                    Ok(sender) => return Ok(sender),
                    Err(e) if e.raw_os_error() == Some(Errno::ENXIO as i32) => {
                        tokio::time::sleep(READER_POLL_INTERVAL).await;
                    }
                    Err(e) => return Err(self.delivery_error(e)),
                }
            }
        }

        fn delivery_error(&self, source: std::io::Error) -> ExecError {
            ExecError::PipeDelivery {
                path: self.path.display().to_string(),
                source,
            }
        }
    }
}

#[cfg(not(unix))]
impl Fifo {
    pub fn create(_directory: impl AsRef<Path>, _filename: &str) -> Result<Fifo> {
        Err(ExecError::unsupported("fifos"))
    }

    pub async fn write_all(self, _contents: &[u8], _cancel: Cancel) -> Result<()> {
        Err(ExecError::unsupported("fifos"))
    }
}

impl Drop for Fifo {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to remove fifo");
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::Read;
    use std::os::unix::fs::{FileTypeExt, PermissionsExt};
    use std::time::Duration;

    use tokio::sync::oneshot;

    use super::*;

    #[test]
    fn resolve_path_does_not_touch_the_filesystem() {
        let path = resolve_path("/definitely/not/here", "secret");
        assert_eq!(path, PathBuf::from("/definitely/not/here/secret"));
    }

    #[test]
    fn names_with_separators_are_rejected() {
        for name in ["", ".", "..", "a/b", "../escape"] {
            assert!(
                matches!(validate_name(name), Err(ExecError::InvalidPipeName(_))),
                "{name:?} should be rejected"
            );
        }
        assert!(validate_name("secrets.env").is_ok());
    }

    #[test]
    fn created_fifo_is_owner_only() {
        let dir = tempfile::tempdir().unwrap();
        let fifo = Fifo::create(dir.path(), "s").unwrap();
        let meta = std::fs::metadata(fifo.path()).unwrap();
        assert!(meta.file_type().is_fifo());
        assert_eq!(meta.permissions().mode() & 0o077, 0);
    }

    #[test]
    fn existing_path_is_never_reused() {
        let dir = tempfile::tempdir().unwrap();
        let _first = Fifo::create(dir.path(), "s").unwrap();
        let second = Fifo::create(dir.path(), "s");
        assert!(matches!(second, Err(ExecError::PrimitiveCreation { .. })));
        assert!(dir.path().join("s").exists());
    }

    #[test]
    fn drop_unlinks_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let fifo = Fifo::create(dir.path(), "s").unwrap();
        let path = fifo.path().to_path_buf();
        drop(fifo);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn reader_receives_exact_bytes_once() {
        let dir = tempfile::tempdir().unwrap();
        let fifo = Fifo::create(dir.path(), "payload").unwrap();
        let path = fifo.path().to_path_buf();

        let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let reader_path = path.clone();
        let reader = std::thread::spawn(move || {
            let mut buf = Vec::new();
            std::fs::File::open(&reader_path)
                .unwrap()
                .read_to_end(&mut buf)
                .unwrap();
            buf
        });

        let cancel = Cancel::never().with_timeout(Duration::from_secs(10));
        fifo.write_all(&payload, cancel).await.unwrap();

        assert_eq!(reader.join().unwrap(), payload);
        assert!(!path.exists(), "consumed fifo must not be readable again");
    }

    #[tokio::test]
    async fn deadline_without_reader_cancels_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let fifo = Fifo::create(dir.path(), "nobody-reads").unwrap();
        let path = fifo.path().to_path_buf();

        let cancel = Cancel::never().with_timeout(Duration::from_millis(50));
        let err = fifo.write_all(b"token=abc", cancel).await.unwrap_err();

        assert!(matches!(err, ExecError::Cancelled(CancelReason::Deadline)));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn signal_cancels_pending_write() {
        let dir = tempfile::tempdir().unwrap();
        let fifo = Fifo::create(dir.path(), "s").unwrap();
        let (tx, rx) = oneshot::channel();

        let write = tokio::spawn(fifo.write_all_owned(b"x".to_vec(), Cancel::never().with_signal(rx)));
        tx.send(()).unwrap();

        let err = write.await.unwrap().unwrap_err();
        assert!(matches!(err, ExecError::Cancelled(CancelReason::Signal)));
    }

    #[tokio::test]
    async fn reader_hanging_up_early_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let fifo = Fifo::create(dir.path(), "s").unwrap();
        let reader_path = fifo.path().to_path_buf();

        let reader = std::thread::spawn(move || {
            let mut one = [0u8; 1];
            let mut file = std::fs::File::open(&reader_path).unwrap();
            file.read_exact(&mut one).unwrap();
        });

        let payload = vec![7u8; 1 << 20];
        let cancel = Cancel::never().with_timeout(Duration::from_secs(10));
        let err = fifo.write_all(&payload, cancel).await.unwrap_err();

        reader.join().unwrap();
        assert!(matches!(err, ExecError::PipeDelivery { .. }), "{err:?}");
    }
}
