use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::DecisionConfig;
use crate::pipeline::engine::DecisionEngine;

/// Lifecycle of the loop. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Cancelling,
    Stopped,
}

impl LoopState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LoopState::Idle,
            1 => LoopState::Running,
            2 => LoopState::Cancelling,
            _ => LoopState::Stopped,
        }
    }
}

/// Loop-level observability counters.
#[derive(Debug, Default)]
struct LoopCounters {
    ticks: AtomicU64,
    decisions: AtomicU64,
    failures: AtomicU64,
    dropped_ticks: AtomicU64,
    snapshots: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopStats {
    pub ticks: u64,
    pub decisions: u64,
    pub failures: u64,
    pub dropped_ticks: u64,
    pub snapshots: u64,
}

/// Drives the decision engine at a fixed cadence.
///
/// One `make_decision()` per tick; a failed cycle is logged and counted, the
/// loop always proceeds to the next tick. Cancellation is cooperative: the
/// token is checked at the top of the scheduling loop and an in-flight
/// decision is allowed to finish.
pub struct DecisionLoop {
    engine: Arc<DecisionEngine>,
    target_fps: f64,
    stats_interval: u64,
    cancel: CancellationToken,
    state: AtomicU8,
    counters: LoopCounters,
}

impl DecisionLoop {
    pub fn new(engine: Arc<DecisionEngine>, config: &DecisionConfig) -> Self {
        Self {
            engine,
            target_fps: config.target_fps,
            stats_interval: config.stats_interval_ticks.max(1),
            cancel: CancellationToken::new(),
            state: AtomicU8::new(LoopState::Idle as u8),
            counters: LoopCounters::default(),
        }
    }

    pub fn state(&self) -> LoopState {
        LoopState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn stats(&self) -> LoopStats {
        LoopStats {
            ticks: self.counters.ticks.load(Ordering::Relaxed),
            decisions: self.counters.decisions.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            dropped_ticks: self.counters.dropped_ticks.load(Ordering::Relaxed),
            snapshots: self.counters.snapshots.load(Ordering::Relaxed),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run until cancelled.
    pub async fn run(&self) {
        self.drive(None).await;
    }

    /// Run for exactly `ticks` scheduling ticks, then stop.
    pub async fn run_for(&self, ticks: u64) {
        self.drive(Some(ticks)).await;
    }

    async fn drive(&self, max_ticks: Option<u64>) {
        self.state.store(LoopState::Running as u8, Ordering::SeqCst);
        // The guard keeps a misconfigured cadence from panicking the ticker.
        let period = Duration::from_secs_f64(1.0 / self.target_fps.max(0.001));
        let drift_limit = period.mul_f64(1.5);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_tick: Option<tokio::time::Instant> = None;
        let mut ticks = 0u64;

        loop {
            if self.cancel.is_cancelled() {
                self.state
                    .store(LoopState::Cancelling as u8, Ordering::SeqCst);
                break;
            }
            if let Some(max) = max_ticks {
                if ticks >= max {
                    break;
                }
            }

            let now = tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.state.store(LoopState::Cancelling as u8, Ordering::SeqCst);
                    break;
                }
                now = ticker.tick() => now,
            };

            // Drift is an observability signal only; each tick reacquires
            // the current latest state, so correctness is unaffected.
            if let Some(previous) = last_tick {
                let gap = now.duration_since(previous);
                if gap > drift_limit {
                    self.counters.dropped_ticks.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(?gap, expected = ?period, "decision tick drifted, frame dropped");
                }
            }
            last_tick = Some(now);

            ticks += 1;
            self.counters.ticks.fetch_add(1, Ordering::Relaxed);

            match self.engine.make_decision() {
                Ok(decision) => {
                    self.counters.decisions.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        top_move = decision.top_move.index,
                        probability = decision.top_move.probability,
                        "decision ready"
                    );
                }
                Err(e) => {
                    // A single bad cycle never halts the loop.
                    self.counters.failures.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!("decision cycle failed: {e}");
                }
            }

            if ticks % self.stats_interval == 0 {
                self.counters.snapshots.fetch_add(1, Ordering::Relaxed);
                let snapshot = self.engine.stats();
                tracing::info!(
                    total_decisions = snapshot.total_decisions,
                    failed_captures = snapshot.failed_captures,
                    avg_inference_ms = snapshot.avg_inference_ms,
                    dropped_ticks = self.counters.dropped_ticks.load(Ordering::Relaxed),
                    "engine statistics"
                );
            }
        }

        self.state.store(LoopState::Stopped as u8, Ordering::SeqCst);
    }
}
