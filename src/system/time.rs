//! Time keeping module for PineTime

use chrono::{Duration, NaiveDateTime};
use crosswatch::clock::{self, ClockError};
use embassy_time::Instant;

pub struct TimeReference {
    /// Clock time
    time: NaiveDateTime,
    /// Related system time
    instant: Instant,
}

impl TimeReference {
    /// Create new time reference from NaiveDateTime
    pub fn from_datetime(time: NaiveDateTime) -> Self {
        Self {
            time,
            instant: Instant::now(),
        }
    }

    /// Create new time reference from a UTC epoch, valid at boot
    pub fn from_epoch(epoch: i64, utc_offset: i32) -> Result<Self, ClockError> {
        Ok(Self {
            time: clock::local_from_epoch(epoch, utc_offset)?,
            instant: Instant::from_ticks(0),
        })
    }

    /// Create new time reference from Current Time Service data
    pub fn from_cts_bytes(bytes: &[u8]) -> Result<Self, ClockError> {
        Ok(Self::from_datetime(clock::decode_current_time(bytes)?))
    }
}

pub struct TimeManager {
    reference: TimeReference,
}

impl TimeManager {
    /// Initialize time measurement on boot
    pub fn init(reference: TimeReference) -> Self {
        Self { reference }
    }

    /// Get current local time
    pub fn get_time(&self) -> Option<NaiveDateTime> {
        let elapsed = Instant::now().duration_since(self.reference.instant);
        self.reference
            .time
            .checked_add_signed(Duration::microseconds(elapsed.as_micros() as i64))
    }

    /// Update time reference
    pub fn set_time(&mut self, reference: TimeReference) {
        self.reference = reference;
    }
}
