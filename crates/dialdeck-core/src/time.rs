use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, Utc};

/// Source of time for everything that waits or measures inside a call session.
pub trait Clock {
    fn now(&self) -> Instant;
    fn now_utc(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn now_utc(&self) -> i64 {
        now_utc()
    }
}

/// A clock that only moves when told to. Clones share the same offset.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    base_utc: i64,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new(base_utc: i64) -> Self {
        Self {
            base: Instant::now(),
            base_utc,
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }

    fn now_utc(&self) -> i64 {
        self.base_utc + self.offset.get().as_secs() as i64
    }
}

pub fn now_utc() -> i64 {
    Utc::now().timestamp()
}

/// `MM:SS` with zero padding; minutes are not wrapped into hours.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{:02}:{:02}", total / 60, total % 60)
}

pub fn format_timestamp_datetime(ts: i64) -> String {
    let dt = DateTime::<Utc>::from_timestamp(ts, 0)
        .unwrap_or_default()
        .with_timezone(&Local);
    dt.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::{format_elapsed, format_timestamp_datetime, Clock, ManualClock};
    use chrono::{Local, TimeZone, Utc};
    use std::time::Duration;

    #[test]
    fn format_elapsed_pads_minutes_and_seconds() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00");
        assert_eq!(format_elapsed(Duration::from_millis(9_999)), "00:09");
        assert_eq!(format_elapsed(Duration::from_secs(61)), "01:01");
    }

    #[test]
    fn format_elapsed_does_not_wrap_hours() {
        assert_eq!(format_elapsed(Duration::from_secs(3_725)), "62:05");
    }

    #[test]
    fn manual_clock_clones_share_offset() {
        let clock = ManualClock::new(1_700_000_000);
        let other = clock.clone();
        let start = clock.now();
        other.advance(Duration::from_secs(3));
        assert_eq!(clock.now() - start, Duration::from_secs(3));
        assert_eq!(clock.now_utc(), 1_700_000_003);
    }

    #[test]
    fn format_timestamp_datetime_uses_local_time() {
        let local = Local.with_ymd_and_hms(2030, 1, 15, 13, 45, 0).unwrap();
        let ts = local.with_timezone(&Utc).timestamp();
        assert_eq!(format_timestamp_datetime(ts), "2030-01-15 13:45");
    }
}
