//! Cosmetic progress simulation.
//!
//! The endpoint reports no progress of its own, so while an attempt is
//! outstanding a [`ProgressSimulator`] ticks the displayed percentage up by a
//! fixed step until it reaches a ceiling.  The simulator is an explicit task:
//! [`ProgressSimulator::stop`] cancels and joins it, so no tick can land
//! after the flow has forced progress to its final value.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::status::StatusSink;

// ---------------------------------------------------------------------------
// Meter
// ---------------------------------------------------------------------------

/// The displayed percentage, shared between the flow and its simulator.
#[derive(Clone)]
pub struct ProgressMeter {
    value: Arc<AtomicU8>,
    sink: Arc<dyn StatusSink>,
}

impl ProgressMeter {
    pub fn new(sink: Arc<dyn StatusSink>) -> Self {
        Self {
            value: Arc::new(AtomicU8::new(0)),
            sink,
        }
    }

    /// Current percentage.
    pub fn get(&self) -> u8 {
        self.value.load(Ordering::SeqCst)
    }

    /// Set the percentage (clamped to 100) and notify the sink.
    pub fn set(&self, percent: u8) {
        let percent = percent.min(100);
        self.value.store(percent, Ordering::SeqCst);
        self.sink.progress(percent);
    }

    /// Add `step` if the value is below `ceiling`, never passing it.
    /// Returns the new value when it changed.
    pub fn advance(&self, step: u8, ceiling: u8) -> Option<u8> {
        let current = self.get();
        if current >= ceiling {
            return None;
        }
        let next = current.saturating_add(step).min(ceiling);
        self.set(next);
        Some(next)
    }
}

impl std::fmt::Debug for ProgressMeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressMeter")
            .field("value", &self.get())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// A running progress simulation.  Dropping it cancels the task.
#[derive(Debug)]
pub struct ProgressSimulator {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ProgressSimulator {
    /// Spawn the simulation on the current runtime.  The first tick fires one
    /// `interval` after start.
    pub fn start(meter: ProgressMeter, interval: Duration, step: u8, ceiling: u8) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        meter.advance(step, ceiling);
                    }
                }
            }
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Cancel the simulation and wait for its task to finish.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            tracing::debug!(error = %e, "progress task ended abnormally");
        }
    }
}

impl Drop for ProgressSimulator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
