//! Tick timing helpers.
//!
//! Provides an RAII-style profiling scope and rolling tick statistics.

use std::time::{Duration, Instant};

/// A profiling scope that measures elapsed time using RAII.
///
/// The elapsed time is logged at trace level when dropped.
pub struct ProfilerScope {
    start: Instant,
    name: &'static str,
}

impl ProfilerScope {
    /// Creates a new profiling scope.
    pub fn new(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    /// Time since the scope was opened.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Gets elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for ProfilerScope {
    fn drop(&mut self) {
        tracing::trace!("{} took {:.3}ms", self.name, self.elapsed_ms());
    }
}

/// Rolling statistics over recorded tick durations.
#[derive(Debug, Clone, Default)]
pub struct TickTimer {
    ticks: u64,
    total: Duration,
    last: Duration,
}

impl TickTimer {
    /// Creates an empty timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the duration of one tick.
    pub fn record(&mut self, elapsed: Duration) {
        self.ticks += 1;
        self.total += elapsed;
        self.last = elapsed;
    }

    /// Number of recorded ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Duration of the most recent tick.
    pub fn last(&self) -> Duration {
        self.last
    }

    /// Mean tick duration, zero before the first tick.
    pub fn mean(&self) -> Duration {
        if self.ticks == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total.as_nanos() / u128::from(self.ticks);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Mean throughput in ticks per second, zero before any time was recorded.
    pub fn ticks_per_second(&self) -> f64 {
        let secs = self.total.as_secs_f64();
        if secs > 0.0 {
            self.ticks as f64 / secs
        } else {
            0.0
        }
    }

    /// Forgets all recorded ticks.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_profiler_scope_measures_time() {
        let scope = ProfilerScope::new("test");
        thread::sleep(Duration::from_millis(10));
        let elapsed = scope.elapsed_ms();
        assert!(elapsed >= 10.0, "Expected at least 10ms, got {elapsed}");
    }

    #[test]
    fn test_tick_timer_statistics() {
        let mut timer = TickTimer::new();
        assert_eq!(timer.mean(), Duration::ZERO);
        assert_eq!(timer.ticks_per_second(), 0.0);

        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(30));

        assert_eq!(timer.ticks(), 2);
        assert_eq!(timer.last(), Duration::from_millis(30));
        assert_eq!(timer.mean(), Duration::from_millis(20));
        assert!((timer.ticks_per_second() - 50.0).abs() < 1e-9);

        timer.reset();
        assert_eq!(timer.ticks(), 0);
    }
}
