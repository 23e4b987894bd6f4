// src/pipe/cancel.rs

use std::fmt;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;

/// Which bound stopped a pipe write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Deadline,
    Signal,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Deadline => f.write_str("deadline elapsed"),
            CancelReason::Signal => f.write_str("cancel signal received"),
        }
    }
}

/// Bounds an otherwise indefinite pipe write.
///
/// With neither a deadline nor a signal, [`Cancel::fired`] never resolves.
/// A signal whose sender is dropped without sending is treated as "no
/// cancellation", not as a cancel request.
#[derive(Debug, Default)]
pub struct Cancel {
    deadline: Option<Instant>,
    signal: Option<oneshot::Receiver<()>>,
}

impl Cancel {
    pub fn never() -> Self {
        Self::default()
    }

    /// A timeout too large to represent as an instant leaves the write
    /// without a deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    pub fn with_signal(mut self, signal: oneshot::Receiver<()>) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.deadline.is_none() && self.signal.is_none()
    }

    /// Resolves with a reason once the write should be abandoned.
    pub(crate) async fn fired(&mut self) -> CancelReason {
        let deadline = self.deadline;
        tokio::select! {
            _ = wait_deadline(deadline) => CancelReason::Deadline,
            _ = wait_signal(&mut self.signal) => CancelReason::Signal,
        }
    }
}

async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

async fn wait_signal(signal: &mut Option<oneshot::Receiver<()>>) {
    if let Some(rx) = signal.as_mut() {
        if rx.await.is_ok() {
            return;
        }
        *signal = None;
    }
    std::future::pending().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn timeout_fires() {
        let mut cancel = Cancel::never().with_timeout(Duration::from_millis(5));
        assert_eq!(cancel.fired().await, CancelReason::Deadline);
    }

    #[tokio::test]
    async fn sent_signal_fires() {
        let (tx, rx) = oneshot::channel();
        let mut cancel = Cancel::never().with_signal(rx);
        tx.send(()).unwrap();
        assert_eq!(cancel.fired().await, CancelReason::Signal);
    }

    #[tokio::test]
    async fn dropped_sender_does_not_cancel() {
        let (tx, rx) = oneshot::channel::<()>();
        drop(tx);
        let mut cancel = Cancel::never()
            .with_signal(rx)
            .with_timeout(Duration::from_millis(20));
        assert_eq!(cancel.fired().await, CancelReason::Deadline);
    }

    #[test]
    fn unrepresentable_timeout_means_no_deadline() {
        let cancel = Cancel::never().with_timeout(Duration::from_secs(u64::MAX));
        assert!(cancel.is_unbounded());
    }

    #[test]
    fn default_is_unbounded() {
        assert!(Cancel::never().is_unbounded());
        assert!(!Cancel::never().with_timeout(Duration::from_secs(1)).is_unbounded());
    }
}
