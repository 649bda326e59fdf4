use std::time::Duration;

use super::timer::Ticker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Countdown {
    #[default]
    Inactive,
    CountingDown { remaining: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Remaining(u32),
    /// The countdown ran out and the sequencer is back to inactive.
    Expired,
}

/// Autoplay countdown between the end of one lecture and the next.
///
/// The sequencer only counts; the player decides what "advance" means.
#[derive(Debug)]
pub struct Sequencer {
    ticks: u32,
    state: Countdown,
    ticker: Ticker,
}

impl Sequencer {
    pub fn new(ticks: u32, period: Duration) -> Self {
        Self {
            ticks,
            state: Countdown::Inactive,
            ticker: Ticker::new(period),
        }
    }

    pub fn state(&self) -> Countdown {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, Countdown::CountingDown { .. })
    }

    pub fn remaining(&self) -> Option<u32> {
        match self.state {
            Countdown::CountingDown { remaining } => Some(remaining),
            Countdown::Inactive => None,
        }
    }

    /// Begins a countdown, replacing any running one. Returns [Tick::Expired]
    /// right away for a zero-length countdown.
    pub fn start(&mut self) -> Tick {
        if self.ticks == 0 {
            self.cancel();
            return Tick::Expired;
        }

        self.state = Countdown::CountingDown {
            remaining: self.ticks,
        };
        self.ticker.start();

        Tick::Remaining(self.ticks)
    }

    /// Returns whether a countdown was running.
    pub fn cancel(&mut self) -> bool {
        let active = self.is_active();

        self.state = Countdown::Inactive;
        self.ticker.stop();

        active
    }

    /// Waits for the next tick of a running countdown. Pending forever while inactive.
    pub async fn next_tick(&mut self) -> Tick {
        self.ticker.tick().await;

        let remaining = self.remaining().unwrap_or_default().saturating_sub(1);

        match remaining {
            0 => {
                self.cancel();
                Tick::Expired
            }
            remaining => {
                self.state = Countdown::CountingDown { remaining };
                Tick::Remaining(remaining)
            }
        }
    }
}
