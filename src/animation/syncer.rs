//! Frame syncers: the clock animations advance on.
//!
//! DESIGN
//! ======
//! [`TimerFrameSyncer`] runs one shared tokio ticker and broadcasts each tick
//! over a `watch` channel. Every animation waiting for the next frame wakes on
//! the same tick and sees the same timestamp, so animations scheduled together
//! advance in lockstep. [`ImmediateFrameSyncer`] never waits: each call
//! returns a synthetic timestamp one step later than the previous one, which
//! makes frame counts deterministic in tests.

#[cfg(test)]
#[path = "syncer_test.rs"]
mod syncer_test;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Source of animation frames.
#[async_trait::async_trait]
pub trait FrameSyncer: Send + Sync {
    /// Wait for the next frame and return its timestamp.
    async fn next_frame(&self) -> Instant;
}

// =============================================================================
// TIMER
// =============================================================================

/// Timer-driven frames shared by all animations of one engine.
#[derive(Debug)]
pub struct TimerFrameSyncer {
    rx: watch::Receiver<Instant>,
    interval: Duration,
}

impl TimerFrameSyncer {
    /// Spawn the ticker. Must be called from within a tokio runtime; the
    /// ticker stops once the syncer and every pending wait are dropped.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        let (tx, rx) = watch::channel(Instant::now());
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    () = tx.closed() => break,
                    tick = ticker.tick() => {
                        if tx.send(tick.into_std()).is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("frame ticker stopped");
        });
        Self { rx, interval }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[async_trait::async_trait]
impl FrameSyncer for TimerFrameSyncer {
    async fn next_frame(&self) -> Instant {
        let mut rx = self.rx.clone();
        let last = *rx.borrow_and_update();
        if rx.changed().await.is_err() {
            return last.max(Instant::now());
        }
        *rx.borrow_and_update()
    }
}

// =============================================================================
// IMMEDIATE
// =============================================================================

/// Frames that never wait; time advances by `step` per call.
#[derive(Debug)]
pub struct ImmediateFrameSyncer {
    base: Instant,
    step_nanos: u64,
    elapsed_nanos: AtomicU64,
}

impl ImmediateFrameSyncer {
    #[must_use]
    pub fn new(step: Duration) -> Self {
        Self {
            base: Instant::now(),
            step_nanos: u64::try_from(step.as_nanos()).unwrap_or(u64::MAX),
            elapsed_nanos: AtomicU64::new(0),
        }
    }
}

impl Default for ImmediateFrameSyncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::config::DEFAULT_FRAME_INTERVAL_MS))
    }
}

#[async_trait::async_trait]
impl FrameSyncer for ImmediateFrameSyncer {
    async fn next_frame(&self) -> Instant {
        tokio::task::yield_now().await;
        let elapsed = self.elapsed_nanos.fetch_add(self.step_nanos, Ordering::SeqCst);
        self.base + Duration::from_nanos(elapsed.saturating_add(self.step_nanos))
    }
}
