//! Time conversion and control cycle timing

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::thread;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Paces a fixed period control loop.
#[derive(Debug, Clone)]
pub struct CycleTimer {
    period: Duration,

    cycle_start: Instant,

    num_cycles: u64,

    num_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CycleTimer {
    /// Create a timer whose first cycle starts now.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            cycle_start: Instant::now(),
            num_cycles: 0,
            num_overruns: 0,
        }
    }

    /// Sleep until the end of the current cycle and start the next one.
    ///
    /// If the cycle took longer than the period there is no sleep, and the
    /// overrun is returned.
    pub fn wait(&mut self) -> Option<Duration> {
        let elapsed = self.cycle_start.elapsed();
        self.num_cycles += 1;

        let overrun = if elapsed < self.period {
            thread::sleep(self.period - elapsed);
            None
        }
        else {
            self.num_overruns += 1;
            Some(elapsed - self.period)
        };

        self.cycle_start = Instant::now();

        overrun
    }

    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }

    pub fn num_overruns(&self) -> u64 {
        self.num_overruns
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(duration_to_seconds(chrono::Duration::milliseconds(1500)), Some(1.5));
        assert_eq!(duration_to_seconds(chrono::Duration::max_value()), None);
    }

    #[test]
    fn test_cycle_timer() {
        let mut timer = CycleTimer::new(Duration::from_millis(5));

        // Short cycle is padded out to the period
        let start = Instant::now();
        assert!(timer.wait().is_none());
        assert!(start.elapsed() >= Duration::from_millis(5));

        // Long cycle overruns
        thread::sleep(Duration::from_millis(10));
        let overrun = timer.wait();
        assert!(overrun.is_some());

        assert_eq!(timer.num_cycles(), 2);
        assert_eq!(timer.num_overruns(), 1);
    }
}
