//! Progress value for the in-flight run.
//!
//! The value lives in [0, 100] and never decreases while a run is
//! active. Two mechanisms drive it: milestone targets announced by the
//! orchestrator, smoothed by stepping a fraction of the remaining gap on
//! each tick, and a low-rate creep that nudges the value upward by small
//! random increments during long remote calls so the bar never looks
//! stalled. Creep is capped below the final milestone; completion forces
//! the value to 100.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::events::{emit, Event, EventHandler};

/// Creep never pushes the value past this.
const CREEP_CAP: u32 = 90;
/// Tick interval for smoothing and creep.
const TICK: Duration = Duration::from_millis(120);

/// Shared progress state for one run. Cheap to clone.
#[derive(Clone, Debug, Default)]
pub struct Progress {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Current value in percent.
    current: AtomicU32,
    /// Milestone target in percent.
    target: AtomicU32,
    /// Set on terminal transition; stops the driver task.
    terminal: AtomicBool,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value in [0, 100].
    pub fn value(&self) -> u32 {
        self.inner.current.load(Ordering::Relaxed)
    }

    /// Raise the milestone target. Lower targets are ignored, keeping the
    /// value monotonic across stages.
    pub fn set_target(&self, percent: u32) {
        self.inner
            .target
            .fetch_max(percent.min(100), Ordering::Relaxed);
    }

    /// Force the value to 100 and stop the driver.
    pub fn complete(&self) {
        self.inner.target.store(100, Ordering::Relaxed);
        self.inner.current.fetch_max(100, Ordering::Relaxed);
        self.inner.terminal.store(true, Ordering::Relaxed);
    }

    /// Pin the value where it is and stop the driver. Used on failure.
    pub fn freeze(&self) {
        self.inner.terminal.store(true, Ordering::Relaxed);
    }

    pub fn is_terminal(&self) -> bool {
        self.inner.terminal.load(Ordering::Relaxed)
    }

    /// Spawn the tick task that smooths toward the current target and
    /// creeps during long waits. The task exits once a terminal
    /// transition is recorded; the returned handle lets the orchestrator
    /// abort it early so no periodic task outlives the run.
    pub fn spawn_driver(
        &self,
        handler: Option<Arc<dyn EventHandler>>,
    ) -> tokio::task::JoinHandle<()> {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(TICK);
            loop {
                tick.tick().await;
                if inner.terminal.load(Ordering::Relaxed) {
                    break;
                }

                let current = inner.current.load(Ordering::Relaxed);
                let target = inner.target.load(Ordering::Relaxed);
                let next = if current < target {
                    // Step a quarter of the remaining gap, at least one point.
                    current + ((target - current) / 4).max(1)
                } else if current < CREEP_CAP {
                    (current + fastrand::u32(0..=2)).min(CREEP_CAP)
                } else {
                    current
                };

                if next != current {
                    inner.current.fetch_max(next.min(100), Ordering::Relaxed);
                    emit(
                        &handler,
                        Event::Progress {
                            percent: inner.current.load(Ordering::Relaxed),
                        },
                    );
                }
            }
        })
    }
}
