#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    /// Current wall-clock time. Status timestamps and event timestamps are
    /// derived from this, so tests can pin it.
    fn now_utc(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
