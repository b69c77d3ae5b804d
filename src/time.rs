// Wall clock used for start/stop timestamps

pub trait Clock {
    fn unix_millis() -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_millis() -> i64 {
        #[cfg(miri)]
        {
            0
        }
        #[cfg(not(miri))]
        {
            chrono::Utc::now().timestamp_millis()
        }
    }
}

/// Milliseconds since the Unix epoch
pub fn now_unix_millis() -> i64 {
    SystemClock::unix_millis()
}
