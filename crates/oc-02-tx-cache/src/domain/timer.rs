//! # Timer Set
//!
//! Named timers owned by a single event loop.
//!
//! Every start of a timer mints a fresh generation. Expiries are delivered
//! as [`TimerFired`] messages on [`TimerEvents`], and the owner accepts one
//! only through [`TimerSet::take_fired`], which checks that the generation
//! is still active. An expiry that raced with `stop_timer` or a restart is
//! therefore discarded even if it was already queued.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Expiry notice for one timer instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub name: &'static str,
    pub generation: u64,
}

/// Receiving side for expiries.
#[derive(Debug)]
pub struct TimerEvents {
    rx: mpsc::UnboundedReceiver<TimerFired>,
}

impl TimerEvents {
    pub async fn recv(&mut self) -> Option<TimerFired> {
        self.rx.recv().await
    }
}

struct NamedTimer {
    timeout: Duration,
    /// Live instances by generation.
    active: HashMap<u64, JoinHandle<()>>,
}

impl NamedTimer {
    fn cancel_all(&mut self) {
        for (_, handle) in self.active.drain() {
            handle.abort();
        }
    }
}

pub struct TimerSet {
    timers: HashMap<&'static str, NamedTimer>,
    next_generation: u64,
    fired_tx: mpsc::UnboundedSender<TimerFired>,
}

impl TimerSet {
    pub fn new() -> (Self, TimerEvents) {
        let (fired_tx, rx) = mpsc::unbounded_channel();
        let set = Self {
            timers: HashMap::new(),
            next_generation: 0,
            fired_tx,
        };
        (set, TimerEvents { rx })
    }

    /// Register `name` with its timeout. Re-registering cancels live instances.
    pub fn register(&mut self, name: &'static str, timeout: Duration) {
        if let Some(mut old) = self.timers.insert(
            name,
            NamedTimer {
                timeout,
                active: HashMap::new(),
            },
        ) {
            old.cancel_all();
        }
    }

    /// Cancel any live instance of `name` and start a new one.
    ///
    /// Returns the new generation, or `None` for an unregistered name.
    pub fn start_timer(&mut self, name: &'static str) -> Option<u64> {
        let Some(timer) = self.timers.get_mut(name) else {
            warn!(timer = name, "Start requested for unregistered timer");
            return None;
        };
        timer.cancel_all();

        self.next_generation += 1;
        let generation = self.next_generation;
        let timeout = timer.timeout;
        let fired_tx = self.fired_tx.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = fired_tx.send(TimerFired { name, generation });
        });
        timer.active.insert(generation, handle);

        debug!(timer = name, generation, ?timeout, "Timer started");
        Some(generation)
    }

    /// Cancel every live instance of `name`.
    pub fn stop_timer(&mut self, name: &'static str) {
        if let Some(timer) = self.timers.get_mut(name) {
            timer.cancel_all();
        }
    }

    pub fn stop_all(&mut self) {
        for timer in self.timers.values_mut() {
            timer.cancel_all();
        }
    }

    /// Whether `name` has a live instance.
    pub fn is_active(&self, name: &'static str) -> bool {
        self.timers
            .get(name)
            .is_some_and(|timer| !timer.active.is_empty())
    }

    pub fn timeout(&self, name: &'static str) -> Option<Duration> {
        self.timers.get(name).map(|timer| timer.timeout)
    }

    /// Accept an expiry if its instance is still live, retiring it.
    ///
    /// Returns `false` for stale expiries, which the owner must ignore.
    pub fn take_fired(&mut self, fired: &TimerFired) -> bool {
        let live = self
            .timers
            .get_mut(fired.name)
            .and_then(|timer| timer.active.remove(&fired.generation))
            .is_some();
        if !live {
            debug!(timer = fired.name, generation = fired.generation, "Stale timer event ignored");
        }
        live
    }
}

impl Drop for TimerSet {
    fn drop(&mut self) {
        self.stop_all();
    }
}
