//! Fixed-period tick scheduler for the host simulation loop.
//!
//! One scheduler per session client. It stays *disarmed* (pending
//! forever) while the client is a spectator or a non-host participant,
//! and is armed only while the client holds the host lease. This makes
//! it safe to keep in a `tokio::select!` loop unconditionally:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(intent) = intents.recv() => { /* local input */ }
//!         _ = watch.changed() => { /* store notification */ }
//!         info = scheduler.wait_for_tick() => {
//!             // read → integrate → resolve → write
//!         }
//!     }
//! }
//! ```
//!
//! Overruns are handled by skipping: a late tick reschedules from now,
//! never by running catch-up ticks — a slow write must cost at most the
//! periods it already burned.

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

/// Information about a fired tick.
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// The fixed period. Game logic uses this, not wall-clock elapsed
    /// time, so a late tick doesn't move entities further.
    pub dt: Duration,
    /// True when the scheduler woke up significantly late.
    pub overrun: bool,
    /// Whole periods skipped because of the overrun.
    pub ticks_skipped: u64,
}

/// Fixed-period tick scheduler.
pub struct TickScheduler {
    period: Duration,
    initial_jitter: Duration,
    tick_count: u64,
    /// `None` while disarmed.
    next_tick: Option<Instant>,
}

impl TickScheduler {
    /// Creates a disarmed scheduler with the given period.
    ///
    /// `initial_jitter` desynchronizes hosts that arm at the same
    /// instant; the first tick after [`arm`](Self::arm) is delayed by a
    /// random fraction of it.
    pub fn new(period: Duration, initial_jitter: Duration) -> Self {
        debug!(period_ms = period.as_millis() as u64, "tick scheduler created");
        Self {
            period,
            initial_jitter,
            tick_count: 0,
            next_tick: None,
        }
    }

    /// A scheduler with the default 2 ms arming jitter.
    pub fn with_period(period: Duration) -> Self {
        Self::new(period, Duration::from_millis(2))
    }

    /// Starts (or restarts) the tick loop. Idempotent.
    pub fn arm(&mut self) {
        if self.next_tick.is_some() {
            return;
        }
        let jitter = if self.initial_jitter.is_zero() {
            Duration::ZERO
        } else {
            let us = rand::rng().random_range(0..self.initial_jitter.as_micros() as u64);
            Duration::from_micros(us)
        };
        self.next_tick = Some(Instant::now() + self.period + jitter);
        debug!(tick = self.tick_count, "tick scheduler armed");
    }

    /// Stops the tick loop; [`wait_for_tick`](Self::wait_for_tick)
    /// pends until the scheduler is armed again. Idempotent.
    pub fn disarm(&mut self) {
        if self.next_tick.take().is_some() {
            debug!(tick = self.tick_count, "tick scheduler disarmed");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.next_tick.is_some()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Waits until the next tick is due.
    ///
    /// While disarmed this future pends forever; a surrounding
    /// `tokio::select!` keeps servicing its other branches.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let Some(next) = self.next_tick else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        self.tick_count += 1;

        // >10% late counts as an overrun.
        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > self.period / 10;
        let mut ticks_skipped = 0u64;
        if overrun {
            ticks_skipped =
                late_by.as_nanos() as u64 / self.period.as_nanos() as u64;
            if ticks_skipped > 0 {
                warn!(
                    tick = self.tick_count,
                    skipped = ticks_skipped,
                    late_ms = late_by.as_secs_f64() * 1000.0,
                    "tick overrun, skipping ahead"
                );
            }
        }

        // Always schedule from now, not from the missed deadline.
        self.next_tick = Some(now + self.period);

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            dt: self.period,
            overrun,
            ticks_skipped,
        }
    }
}
