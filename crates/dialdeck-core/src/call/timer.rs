use std::time::{Duration, Instant};

use crate::time::format_elapsed;

/// Elapsed talk time for the connected part of a call.
///
/// The owner calls [`DurationTimer::tick`] as often as it likes; a new value is
/// published at most once per whole second and never while stopped.
#[derive(Debug, Clone, Default)]
pub struct DurationTimer {
    reference: Option<Instant>,
    elapsed: Duration,
    published_secs: u64,
    starts: u32,
}

impl DurationTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restarts from zero and returns the first published value.
    pub fn start(&mut self, now: Instant) -> String {
        self.reference = Some(now);
        self.elapsed = Duration::ZERO;
        self.published_secs = 0;
        self.starts += 1;
        self.display()
    }

    pub fn tick(&mut self, now: Instant) -> Option<String> {
        let reference = self.reference?;
        self.elapsed = now.saturating_duration_since(reference);
        let secs = self.elapsed.as_secs();
        if secs == self.published_secs {
            return None;
        }
        self.published_secs = secs;
        Some(self.display())
    }

    /// Freezes the elapsed value; returns it if the timer was running.
    pub fn stop(&mut self, now: Instant) -> Option<Duration> {
        let reference = self.reference.take()?;
        self.elapsed = now.saturating_duration_since(reference);
        self.published_secs = self.elapsed.as_secs();
        Some(self.elapsed)
    }

    pub fn is_running(&self) -> bool {
        self.reference.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn display(&self) -> String {
        format_elapsed(Duration::from_secs(self.published_secs))
    }

    /// How many times the timer has been started over its lifetime.
    pub fn starts(&self) -> u32 {
        self.starts
    }
}

#[cfg(test)]
mod tests {
    use super::DurationTimer;
    use std::time::{Duration, Instant};

    #[test]
    fn ticks_once_per_whole_second() {
        let base = Instant::now();
        let mut timer = DurationTimer::new();
        assert_eq!(timer.start(base), "00:00");
        assert_eq!(timer.tick(base + Duration::from_millis(400)), None);
        assert_eq!(
            timer.tick(base + Duration::from_millis(1_100)),
            Some("00:01".to_string())
        );
        assert_eq!(timer.tick(base + Duration::from_millis(1_900)), None);
        assert_eq!(
            timer.tick(base + Duration::from_secs(75)),
            Some("01:15".to_string())
        );
    }

    #[test]
    fn stop_freezes_value_until_restart() {
        let base = Instant::now();
        let mut timer = DurationTimer::new();
        timer.start(base);
        let frozen = timer.stop(base + Duration::from_secs(7)).unwrap();
        assert_eq!(frozen, Duration::from_secs(7));
        assert!(!timer.is_running());
        assert_eq!(timer.tick(base + Duration::from_secs(20)), None);
        assert_eq!(timer.display(), "00:07");

        assert_eq!(timer.start(base + Duration::from_secs(30)), "00:00");
        assert_eq!(timer.starts(), 2);
    }

    #[test]
    fn stop_without_start_is_noop() {
        let mut timer = DurationTimer::new();
        assert_eq!(timer.stop(Instant::now()), None);
        assert_eq!(timer.display(), "00:00");
    }
}
