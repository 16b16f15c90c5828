//! Time source for the simulation cadence and the registry staleness window.
//!
//! Production code uses [`TokioClock`]. Tests substitute [`ManualClock`],
//! which only moves when told to, so tick loops and cache expiry can be
//! driven step by step.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

#[async_trait]
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Manually advanced clock for deterministic tests.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<ManualClockInner>,
}

#[derive(Debug)]
struct ManualClockInner {
    origin: Instant,
    elapsed: Mutex<Duration>,
    advanced: Notify,
    sleepers: AtomicUsize,
    sleepers_changed: Notify,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ManualClockInner {
                origin: Instant::now(),
                elapsed: Mutex::new(Duration::ZERO),
                advanced: Notify::new(),
                sleepers: AtomicUsize::new(0),
                sleepers_changed: Notify::new(),
            }),
        }
    }

    fn elapsed(&self) -> Duration {
        *self.inner.elapsed.lock()
    }

    /// Move time forward and wake every sleeper whose deadline passed.
    pub fn advance(&self, by: Duration) {
        *self.inner.elapsed.lock() += by;
        self.inner.advanced.notify_waiters();
    }

    /// Resolve once at least `count` tasks are parked in [`Clock::sleep`].
    pub async fn wait_for_sleepers(&self, count: usize) {
        loop {
            let changed = self.inner.sleepers_changed.notified();
            tokio::pin!(changed);
            changed.as_mut().enable();
            if self.inner.sleepers.load(Ordering::SeqCst) >= count {
                return;
            }
            changed.await;
        }
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.inner.origin + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        let deadline = self.elapsed() + duration;
        let _parked = SleeperGuard::park(Arc::clone(&self.inner));
        loop {
            let advanced = self.inner.advanced.notified();
            tokio::pin!(advanced);
            advanced.as_mut().enable();
            if self.elapsed() >= deadline {
                return;
            }
            advanced.await;
        }
    }
}

/// Keeps the sleeper count accurate even when the sleeping future is
/// dropped early, e.g. by a `select!` taking its cancellation branch.
struct SleeperGuard {
    inner: Arc<ManualClockInner>,
}

impl SleeperGuard {
    fn park(inner: Arc<ManualClockInner>) -> Self {
        inner.sleepers.fetch_add(1, Ordering::SeqCst);
        inner.sleepers_changed.notify_waiters();
        Self { inner }
    }
}

impl Drop for SleeperGuard {
    fn drop(&mut self) {
        self.inner.sleepers.fetch_sub(1, Ordering::SeqCst);
        self.inner.sleepers_changed.notify_waiters();
    }
}
