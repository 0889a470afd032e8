//! Mount-completion signaling.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

/// One-shot signal fired by the renderer when base content is attached.
///
/// The reconciler awaits this instead of polling the tree. The wait is
/// bounded: a renderer that never fires the signal stalls the pipeline for
/// at most the configured timeout, after which reconciliation proceeds
/// anyway.
///
/// Cloning shares the underlying signal.
#[derive(Clone, Debug, Default)]
pub struct MountSignal {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    mounted: AtomicBool,
    notify: Notify,
}

impl MountSignal {
    /// Create an unfired signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the content as mounted and wake the waiter.
    pub fn notify_mounted(&self) {
        self.inner.mounted.store(true, Ordering::Release);
        // notify_one stores a permit when nobody is waiting yet, so a fire
        // that races the waiter's registration is never lost.
        self.inner.notify.notify_one();
    }

    /// Whether the signal has fired.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::Acquire)
    }

    /// Wait for the mount signal, up to `timeout`.
    ///
    /// Returns `true` when the content mounted within the window, `false`
    /// on timeout.
    pub async fn wait_mounted(&self, timeout: Duration) -> bool {
        if self.is_mounted() {
            return true;
        }
        if tokio::time::timeout(timeout, self.inner.notify.notified())
            .await
            .is_err()
        {
            return self.is_mounted();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_after_notify_returns_immediately() {
        let signal = MountSignal::new();
        signal.notify_mounted();
        assert!(signal.wait_mounted(Duration::from_millis(1)).await);
    }

    #[tokio::test]
    async fn test_wait_times_out_without_notify() {
        let signal = MountSignal::new();
        assert!(!signal.wait_mounted(Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn test_notify_from_other_task_wakes_waiter() {
        let signal = MountSignal::new();
        let fired = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            fired.notify_mounted();
        });
        assert!(signal.wait_mounted(Duration::from_secs(1)).await);
    }
}
