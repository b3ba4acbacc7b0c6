//! Accrual Clock
//!
//! Idle income: converts an hourly rate into a whole-number per-second
//! increment and delivers what has been earned once per period until stopped.
//!
//! The increment is derived once at [`AccrualClock::start`]. Each tick carries
//! the points due for the time elapsed so far minus what earlier ticks already
//! delivered, so after `n` whole seconds exactly `n * per_second` points have
//! been handed out whatever the period. Rates below 3600/h floor to zero, in
//! which case ticks still fire but carry nothing. Missed periods are skipped,
//! not caught up.

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::SECONDS_PER_HOUR;

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Whole points earned per second for an hourly rate.
#[inline]
pub fn per_second(rate_per_hour: u64) -> u64 {
    rate_per_hour / SECONDS_PER_HOUR
}

/// Periodic idle-income task.
///
/// Must be started from within a tokio runtime. Dropping the clock stops it.
pub struct AccrualClock {
    period: Duration,
    per_second: u64,
    shutdown_tx: Option<broadcast::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl AccrualClock {
    /// Create a stopped clock firing every `period`.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            per_second: 0,
            shutdown_tx: None,
            handle: None,
        }
    }

    /// Start ticking, replacing any running schedule.
    ///
    /// `on_tick` receives the points earned during each period.
    pub fn start<F>(&mut self, rate_per_hour: u64, mut on_tick: F)
    where
        F: FnMut(u64) + Send + 'static,
    {
        self.stop();

        let increment = per_second(rate_per_hour);
        self.per_second = increment;

        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
        let period = self.period;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut schedule = TickSchedule::new(increment, period);

            loop {
                tokio::select! {
                    _ = ticker.tick() => on_tick(schedule.advance()),
                    _ = shutdown_rx.recv() => break,
                }
            }
        });

        debug!("Accrual clock started: {}/h -> {}/s", rate_per_hour, increment);
        self.shutdown_tx = Some(shutdown_tx);
        self.handle = Some(handle);
    }

    /// Halt further ticks. Safe to call when already stopped.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Accrual clock stopped");
        }
    }

    /// Whether a schedule is active.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Increment computed at the last start.
    pub fn per_second(&self) -> u64 {
        self.per_second
    }

    /// Tick period.
    pub fn period(&self) -> Duration {
        self.period
    }
}

/// Splits a per-second rate across ticks of an arbitrary period.
#[derive(Debug, Clone)]
struct TickSchedule {
    per_second: u128,
    period_nanos: u128,
    ticks: u128,
    delivered: u128,
}

impl TickSchedule {
    fn new(per_second: u64, period: Duration) -> Self {
        Self {
            per_second: u128::from(per_second),
            period_nanos: period.as_nanos(),
            ticks: 0,
            delivered: 0,
        }
    }

    /// Points due for the next tick.
    fn advance(&mut self) -> u64 {
        self.ticks += 1;
        let due = self.per_second * self.ticks * self.period_nanos / NANOS_PER_SECOND;
        let increment = due.saturating_sub(self.delivered);
        self.delivered = due;
        u64::try_from(increment).unwrap_or(u64::MAX)
    }
}

impl Drop for AccrualClock {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_per_second_floors() {
        assert_eq!(per_second(3600), 1);
        assert_eq!(per_second(593_043), 164);
        assert_eq!(per_second(3599), 0);
        assert_eq!(per_second(0), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut clock = AccrualClock::new(Duration::from_secs(1));
        clock.start(3600, move |inc| {
            let _ = tx.send(inc);
        });
        assert!(clock.is_running());
        assert_eq!(clock.per_second(), 1);

        tokio::time::sleep(Duration::from_millis(3500)).await;

        let mut ticks = Vec::new();
        while let Ok(inc) = rx.try_recv() {
            ticks.push(inc);
        }
        assert_eq!(ticks, vec![1, 1, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent_and_halts_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut clock = AccrualClock::new(Duration::from_secs(1));
        clock.start(593_043, move |inc| {
            let _ = tx.send(inc);
        });

        tokio::time::sleep(Duration::from_millis(1500)).await;
        clock.stop();
        clock.stop();
        assert!(!clock.is_running());

        tokio::time::sleep(Duration::from_secs(5)).await;

        let mut ticks = Vec::new();
        while let Ok(inc) = rx.try_recv() {
            ticks.push(inc);
        }
        assert_eq!(ticks, vec![164]);
    }

    #[test]
    fn test_schedule_spreads_rate_over_short_periods() {
        let mut schedule = TickSchedule::new(10, Duration::from_millis(250));
        let ticks: Vec<u64> = (0..8).map(|_| schedule.advance()).collect();
        assert_eq!(ticks, vec![2, 3, 2, 3, 2, 3, 2, 3]);

        let mut schedule = TickSchedule::new(164, Duration::from_secs(1));
        assert_eq!(schedule.advance(), 164);
        assert_eq!(schedule.advance(), 164);

        // Longer periods hand out several seconds at once
        let mut schedule = TickSchedule::new(7, Duration::from_millis(2500));
        assert_eq!(schedule.advance(), 17);
        assert_eq!(schedule.advance(), 18);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_second_period_keeps_hourly_rate() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut clock = AccrualClock::new(Duration::from_millis(250));
        clock.start(36_000, move |inc| {
            let _ = tx.send(inc);
        });

        tokio::time::sleep(Duration::from_millis(1100)).await;
        clock.stop();

        let mut total = 0;
        while let Ok(inc) = rx.try_recv() {
            total += inc;
        }
        assert_eq!(total, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_low_rate_ticks_carry_zero() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut clock = AccrualClock::new(Duration::from_secs(1));
        clock.start(1000, move |inc| {
            let _ = tx.send(inc);
        });

        tokio::time::sleep(Duration::from_millis(2500)).await;
        drop(clock);

        assert_eq!(rx.try_recv(), Ok(0));
        assert_eq!(rx.try_recv(), Ok(0));
    }
}
