//! Human-like pacing between requests and the epoch clock used for
//! JSONP callback ids.

use std::cell::Cell;
use std::time::Duration;

use chrono::Utc;
use log::debug;
use rand::Rng;

/// Source of delays and wall-clock time.
pub trait Pacer {
    /// Block for a random whole number of seconds in `[min_secs, max_secs]`.
    fn pause(&self, min_secs: u64, max_secs: u64);

    /// Milliseconds since the Unix epoch.
    fn epoch_millis(&self) -> i64;

    /// The default 1-2 second pause between page loads.
    fn pause_briefly(&self) {
        self.pause(1, 2);
    }
}

/// Sleeps for real, the way a person clicking through the site would.
#[derive(Debug, Default, Clone, Copy)]
pub struct HumanPacer;

impl Pacer for HumanPacer {
    fn pause(&self, min_secs: u64, max_secs: u64) {
        let secs = rand::rng().random_range(min_secs..=max_secs.max(min_secs));
        debug!("Pausing for {secs} seconds ...");
        std::thread::sleep(Duration::from_secs(secs));
    }

    fn epoch_millis(&self) -> i64 {
        current_timestamp_ms()
    }
}

/// Never sleeps and reports a frozen clock. Counts the pauses it skipped.
#[derive(Debug)]
pub struct NoPacer {
    epoch_ms: i64,
    pauses: Cell<usize>,
}

impl NoPacer {
    pub fn new() -> Self {
        Self::at(current_timestamp_ms())
    }

    /// A pacer whose clock always reads `epoch_ms`.
    pub fn at(epoch_ms: i64) -> Self {
        Self {
            epoch_ms,
            pauses: Cell::new(0),
        }
    }

    /// How many pauses were requested.
    pub fn pauses(&self) -> usize {
        self.pauses.get()
    }
}

impl Default for NoPacer {
    fn default() -> Self {
        Self::new()
    }
}

impl Pacer for NoPacer {
    fn pause(&self, _min_secs: u64, _max_secs: u64) {
        self.pauses.set(self.pauses.get() + 1);
    }

    fn epoch_millis(&self) -> i64 {
        self.epoch_ms
    }
}

pub(crate) fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}
