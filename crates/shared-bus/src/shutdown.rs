//! # Shutdown Signal
//!
//! One trigger, many observers. Every long-running loop in the order core
//! holds a `ShutdownSignal` and selects on [`ShutdownSignal::recv`] next to
//! its work queue.

use tokio::sync::watch;

/// Create a connected trigger/signal pair.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, ShutdownSignal { rx })
}

/// Owning side of the shutdown channel.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Fire the signal. Returns `true` only for the first call.
    pub fn trigger(&self) -> bool {
        self.tx.send_if_modified(|fired| {
            if *fired {
                false
            } else {
                *fired = true;
                true
            }
        })
    }

    /// Whether the signal has fired.
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// A new observer of this trigger.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// Observing side of the shutdown channel.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolve once shutdown has been triggered (immediately if it already
    /// was) or the trigger has been dropped.
    pub async fn recv(&mut self) {
        let _ = self.rx.wait_for(|fired| *fired).await;
    }

    /// Whether shutdown has been triggered.
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_trigger_fires_once() {
        let (trigger, signal) = shutdown_channel();

        assert!(!signal.is_shutdown());
        assert!(trigger.trigger());
        assert!(!trigger.trigger());
        assert!(signal.is_shutdown());
        assert!(trigger.is_triggered());
    }

    #[tokio::test]
    async fn test_recv_after_trigger_resolves_immediately() {
        let (trigger, mut signal) = shutdown_channel();
        trigger.trigger();

        timeout(Duration::from_millis(50), signal.recv())
            .await
            .expect("already-fired signal must resolve");
    }

    #[tokio::test]
    async fn test_every_clone_observes_trigger() {
        let (trigger, signal) = shutdown_channel();
        let mut a = signal.clone();
        let mut b = trigger.signal();

        let waiter = tokio::spawn(async move {
            a.recv().await;
            b.recv().await;
        });
        trigger.trigger();

        timeout(Duration::from_millis(100), waiter)
            .await
            .expect("timeout")
            .expect("join");
    }

    #[tokio::test]
    async fn test_dropped_trigger_releases_waiters() {
        let (trigger, mut signal) = shutdown_channel();
        drop(trigger);

        timeout(Duration::from_millis(50), signal.recv())
            .await
            .expect("dropped trigger must release");
    }
}
