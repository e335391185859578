//! Clock and scheduler seams for the insertion poll loop
//!
//! Production code paces itself with tokio timers. Tests swap in
//! [`ManualClock`] and [`ManualScheduler`] so a poll that would take two
//! seconds of wall time runs instantly and deterministically.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Monotonic time source.
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

/// Suspension point between two polls of the host page.
pub trait Scheduler {
    fn pause(&self) -> impl Future<Output = ()>;
}

/// Clock backed by `tokio::time::Instant`.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Sleeps a fixed interval between polls.
#[derive(Debug, Clone, Copy)]
pub struct TokioScheduler {
    pub interval: Duration,
}

impl Scheduler for TokioScheduler {
    async fn pause(&self) {
        tokio::time::sleep(self.interval).await;
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward. Saturates at `u64::MAX` milliseconds.
    pub fn advance(&self, by: Duration) {
        let step = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        let _ = self
            .millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |m| Some(m.saturating_add(step)));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// Advances a [`ManualClock`] by `step` on every pause.
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    pub clock: ManualClock,
    pub step: Duration,
}

impl Scheduler for ManualScheduler {
    async fn pause(&self) {
        self.clock.advance(self.step);
    }
}
