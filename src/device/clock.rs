// CLASSIFICATION: COMMUNITY
// Filename: clock.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Real-time clock. On the board this is a DS3231 on the shared I²C bus;
//! on a host the system clock plus an adjustable offset stands in.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("invalid date/time {0:?}")]
    InvalidDateTime(TimeFields),
}

/// Calendar fields as exchanged with the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFields {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl TimeFields {
    pub fn to_naive(self) -> Result<NaiveDateTime, ClockError> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|d| d.and_hms_opt(self.hour, self.minute, self.second))
            .ok_or(ClockError::InvalidDateTime(self))
    }
}

impl From<NaiveDateTime> for TimeFields {
    fn from(dt: NaiveDateTime) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
        }
    }
}

/// Wall-clock source.
pub trait Rtc {
    fn now(&self) -> NaiveDateTime;
    fn adjust(&mut self, to: NaiveDateTime);
}

/// Host clock shifted by whatever the last [`Rtc::adjust`] asked for.
#[derive(Debug, Clone, Default)]
pub struct SystemRtc {
    offset: TimeDelta,
}

impl Rtc for SystemRtc {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local() + self.offset
    }

    fn adjust(&mut self, to: NaiveDateTime) {
        self.offset = to - Local::now().naive_local();
        info!("rtc: adjusted to {}", to);
    }
}
