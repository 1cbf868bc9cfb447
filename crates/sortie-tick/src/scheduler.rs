//! Fixed-rate tick scheduler.

use std::time::{Duration, Instant};

use tokio::time::Instant as TokioInstant;
use tracing::{debug, trace, warn};

use crate::{TickConfig, TickPolicy};

/// Returned by [`TickScheduler::wait_for_tick`] each time a period elapses.
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// How many times the scheduler has fired (starts at 1).
    pub fired: u64,
    /// Fixed period length.
    pub dt: Duration,
    /// `true` if the scheduler woke up more than 10% of a period late.
    pub overrun: bool,
    /// Periods dropped because of the overrun policy.
    pub ticks_skipped: u64,
}

/// Runtime metrics.
///
/// Timings refer to the driver work measured between
/// [`TickScheduler::wait_for_tick`] and [`TickScheduler::record_tick_end`].
#[derive(Debug, Clone, Default)]
pub struct TickMetrics {
    /// Total ticks fired.
    pub total_ticks: u64,
    /// Total overruns detected.
    pub total_overruns: u64,
    /// Total periods skipped.
    pub total_skipped: u64,
    /// Exponential moving average of tick work (α = 0.1).
    pub avg_tick_time: Duration,
    /// Longest tick observed.
    pub max_tick_time: Duration,
    /// Last measured work / budget ratio. Above 1.0 means overrun.
    pub budget_utilization: f64,
}

/// Fixed-timestep scheduler driving the global tick.
pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Duration,
    fired: u64,
    next_tick: TokioInstant,
    /// Wall-clock start of the current tick's work; consumed by
    /// `record_tick_end`.
    tick_start: Option<Instant>,
    metrics: TickMetrics,
}

impl TickScheduler {
    /// Creates a scheduler. The first tick fires one period from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();

        debug!(
            rate_hz = config.tick_rate_hz,
            budget_ms = millis(tick_duration),
            policy = ?config.policy,
            "tick scheduler created"
        );

        Self {
            config,
            tick_duration,
            fired: 0,
            next_tick: TokioInstant::now() + tick_duration,
            tick_start: None,
            metrics: TickMetrics::default(),
        }
    }

    /// Scheduler at `tick_rate_hz` with default settings.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Waits until the next tick is due.
    ///
    /// Cancellation-safe: dropping the future before it resolves leaves
    /// the schedule untouched, so it can sit in a `select!` branch.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let deadline = self.next_tick;
        let period = self.tick_duration;

        tokio::time::sleep_until(deadline).await;

        let woke = TokioInstant::now();
        self.fired += 1;
        self.tick_start = Some(Instant::now());

        let late_by = woke.saturating_duration_since(deadline);
        let overrun = late_by > period / 10;
        let behind = (late_by.as_nanos() / period.as_nanos()) as u64;
        let mut ticks_skipped = 0u64;

        self.next_tick = match self.config.policy {
            TickPolicy::Skip => {
                if overrun {
                    ticks_skipped = behind;
                    if behind > 0 {
                        warn!(
                            fired = self.fired,
                            skipped = behind,
                            late_ms = millis(late_by),
                            "tick overrun, skipping ahead"
                        );
                    }
                }
                woke + period
            }
            TickPolicy::CatchUp { max_catchup } => {
                let max_catchup = u64::from(max_catchup);
                if overrun && behind > 0 {
                    ticks_skipped = behind.saturating_sub(max_catchup);
                    warn!(
                        fired = self.fired,
                        behind,
                        catching_up = behind.min(max_catchup),
                        skipping = ticks_skipped,
                        "tick overrun, catching up"
                    );
                }
                if behind <= max_catchup {
                    deadline + period
                } else {
                    woke + period
                }
            }
        };

        let metrics = &mut self.metrics;
        metrics.total_ticks += 1;
        metrics.total_overruns += u64::from(overrun);
        metrics.total_skipped += ticks_skipped;

        trace!(fired = self.fired, overrun, "tick fired");

        TickInfo {
            fired: self.fired,
            dt: period,
            overrun,
            ticks_skipped,
        }
    }

    /// Marks the end of the current tick's work and checks it against
    /// the budget. A no-op if no tick is in flight.
    pub fn record_tick_end(&mut self) {
        let Some(started) = self.tick_start.take() else {
            return;
        };
        let work = started.elapsed();
        let load = work.as_secs_f64() / self.tick_duration.as_secs_f64();
        self.metrics.budget_utilization = load;

        let breach = if load >= self.config.budget_critical_threshold {
            Some("tick over budget")
        } else if load >= self.config.budget_warn_threshold {
            Some("tick close to budget")
        } else {
            None
        };
        if let Some(message) = breach {
            warn!(
                fired = self.fired,
                work_ms = millis(work),
                budget_ms = millis(self.tick_duration),
                load_pct = (load * 1000.0).round() / 10.0,
                "{message}"
            );
        }

        if self.config.metrics_enabled {
            self.metrics.max_tick_time = self.metrics.max_tick_time.max(work);
            self.metrics.avg_tick_time = smoothed(self.metrics.avg_tick_time, work);
        }
    }

    /// Number of times the scheduler has fired.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Current metrics.
    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }

    /// Effective (validated) tick rate.
    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    /// Length of one period.
    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Exponential moving average with α = 0.1.
fn smoothed(avg: Duration, sample: Duration) -> Duration {
    const ALPHA: f64 = 0.1;
    Duration::from_secs_f64(avg.as_secs_f64() * (1.0 - ALPHA) + sample.as_secs_f64() * ALPHA)
}
