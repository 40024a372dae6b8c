//! Time source used by moderation timestamps and greetings.

use chrono::{DateTime, Local, Timelike, Utc};
use strum::Display;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Hour of the day in the host's local time zone, `0..24`.
    fn local_hour(&self) -> u32 {
        self.now().with_timezone(&Local).hour()
    }
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Part of the day used to pick a greeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DayPeriod {
    #[strum(serialize = "Good morning")]
    Morning,
    #[strum(serialize = "Good afternoon")]
    Afternoon,
    #[strum(serialize = "Good evening")]
    Evening,
}

impl DayPeriod {
    /// `[0,12)` morning, `[12,18)` afternoon, everything else evening.
    #[must_use]
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..12 => DayPeriod::Morning,
            12..18 => DayPeriod::Afternoon,
            _ => DayPeriod::Evening,
        }
    }
}
