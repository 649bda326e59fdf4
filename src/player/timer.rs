//! Single-slot timers owned by the player task.
//!
//! Neither timer spawns anything: the player awaits them from its own
//! `select!` loop, so cancelling is just clearing the slot and nothing can
//! outlive the player.

use std::future::pending;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior, Sleep};

/// Trailing debounce with an upper bound on how long a burst can postpone it.
///
/// Every [Debounce::schedule] pushes the deadline to `now + wait`, but never
/// past `first schedule + max_wait`.
#[derive(Debug)]
pub struct Debounce {
    wait: Duration,
    max_wait: Duration,
    burst_started: Option<Instant>,
    sleep: Pin<Box<Sleep>>,
}

impl Debounce {
    pub fn new(wait: Duration, max_wait: Duration) -> Self {
        Self {
            wait,
            max_wait: max_wait.max(wait),
            burst_started: None,
            sleep: Box::pin(sleep_until(Instant::now())),
        }
    }

    pub fn schedule(&mut self) {
        let now = Instant::now();
        let started = *self.burst_started.get_or_insert(now);
        let deadline = (now + self.wait).min(started + self.max_wait);

        self.sleep.as_mut().reset(deadline);
    }

    /// Returns whether a deadline was pending.
    pub fn cancel(&mut self) -> bool {
        self.burst_started.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.burst_started.is_some()
    }

    /// Resolves at the pending deadline, never when nothing is scheduled.
    pub async fn fired(&mut self) {
        if self.burst_started.is_none() {
            return pending().await;
        }

        self.sleep.as_mut().await;
        self.burst_started = None;
    }
}

/// A fixed-period ticker that can be started and stopped.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    interval: Option<Interval>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    /// (Re)starts ticking; the first tick lands one period from now.
    pub fn start(&mut self) {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.interval = Some(interval);
    }

    pub fn stop(&mut self) {
        self.interval = None;
    }

    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => pending().await,
        }
    }
}
