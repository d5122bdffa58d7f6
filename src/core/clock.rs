//! Clock: single-slot repeating timer
//!
//! Sends one event into the game loop per period. Starting a clock that is
//! already running cancels the pending ticker first, so a slot never holds
//! two tickers. The driver uses one slot each for the round countdown, the
//! XP animation frames and the SUCCESS / FAIL advance delay.

use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Shortest period a ticker runs at; tokio intervals reject zero
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Single-slot ticker bound to the tokio runtime
#[derive(Debug)]
pub struct Clock {
    /// Time between events
    period: Duration,
    /// Running ticker, if any
    handle: Option<JoinHandle<()>>,
}

impl Clock {
    /// Create a stopped clock
    pub fn new(period: Duration) -> Self {
        Self { period, handle: None }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Tick until stopped or the receiver goes away
    pub fn start<E, F>(&mut self, tx: UnboundedSender<E>, make_event: F)
    where
        E: Send + 'static,
        F: FnMut() -> E + Send + 'static,
    {
        self.spawn(tx, None, make_event);
    }

    /// Tick exactly `count` times, then stop
    pub fn start_limited<E, F>(&mut self, tx: UnboundedSender<E>, count: u32, make_event: F)
    where
        E: Send + 'static,
        F: FnMut() -> E + Send + 'static,
    {
        self.spawn(tx, Some(count), make_event);
    }

    /// Cancel the pending ticker. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    fn spawn<E, F>(&mut self, tx: UnboundedSender<E>, limit: Option<u32>, mut make_event: F)
    where
        E: Send + 'static,
        F: FnMut() -> E + Send + 'static,
    {
        self.stop();
        let period = self.period.max(MIN_PERIOD);
        self.handle = Some(tokio::spawn(async move {
            // First event one full period after start
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut sent: u32 = 0;
            loop {
                if limit.is_some_and(|max| sent >= max) {
                    break;
                }
                ticker.tick().await;
                if tx.send(make_event()).is_err() {
                    break;
                }
                sent += 1;
            }
        }));
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// TESTS
// =============================================================================
