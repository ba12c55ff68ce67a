//! Wall clock helpers

use core::fmt::{self, Write};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use heapless::String;

use crate::settings::Skin;

/// Clock style of the hour label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HourFormat {
    /// 00-23
    TwentyFour,
    /// 01-12
    Twelve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    /// Current Time data shorter than 9 bytes
    TooShort,
    InvalidDate,
    InvalidTime,
    /// Timestamp outside the representable range
    OutOfRange,
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockError::TooShort => f.write_str("current time data too short"),
            ClockError::InvalidDate => f.write_str("invalid date"),
            ClockError::InvalidTime => f.write_str("invalid time of day"),
            ClockError::OutOfRange => f.write_str("timestamp out of range"),
        }
    }
}

/// Local time for a UTC epoch and a fixed offset in seconds
pub fn local_from_epoch(epoch: i64, offset: i32) -> Result<NaiveDateTime, ClockError> {
    let local = epoch
        .checked_add(offset as i64)
        .ok_or(ClockError::OutOfRange)?;
    DateTime::from_timestamp(local, 0)
        .map(|time| time.naive_utc())
        .ok_or(ClockError::OutOfRange)
}

/// Decode the Bluetooth Current Time characteristic
///
/// Layout: year (u16 LE), month, day, hours, minutes, seconds, day of week,
/// fractions of 1/256 s, adjust reason. The day of week and the adjust reason
/// are ignored.
pub fn decode_current_time(bytes: &[u8]) -> Result<NaiveDateTime, ClockError> {
    if bytes.len() < 9 {
        return Err(ClockError::TooShort);
    }
    let year = u16::from_le_bytes([bytes[0], bytes[1]]) as i32;
    let month = bytes[2] as u32;
    let day = bytes[3] as u32;
    let hour = bytes[4] as u32;
    let min = bytes[5] as u32;
    let sec = bytes[6] as u32;
    let milli = bytes[8] as u32 * 1000 / 256;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(ClockError::InvalidDate)?
        .and_hms_milli_opt(hour, min, sec, milli)
        .ok_or(ClockError::InvalidTime)
}

/// Fires once per wall clock minute
#[derive(Debug, Default)]
pub struct MinuteTicker {
    last: Option<NaiveDateTime>,
}

impl MinuteTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `now` on the first call and whenever the minute changed since
    /// the last time it fired.
    pub fn poll(&mut self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let minute = now.with_second(0)?.with_nanosecond(0)?;
        if self.last == Some(minute) {
            return None;
        }
        self.last = Some(minute);
        Some(now)
    }
}

/// Strings shown for the current minute
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClockText {
    pub hour: String<8>,
    pub minute: String<8>,
    pub date: String<16>,
    pub year: String<8>,
}

impl ClockText {
    pub fn format(now: &NaiveDateTime, hour_format: HourFormat, skin: Skin) -> Self {
        let mut text = Self::default();

        let _ = match hour_format {
            HourFormat::TwentyFour => write!(text.hour, "{:02}", now.hour()),
            HourFormat::Twelve => write!(text.hour, "{:02}", now.hour12().1),
        };
        let _ = write!(text.minute, "{:02}", now.minute());
        let _ = match skin {
            Skin::Blocks => write!(text.date, "{} {:02}", weekday_abbrev(now.weekday()), now.day()),
            Skin::Cross => write!(text.date, "{:02} {}", now.day(), weekday_abbrev(now.weekday())),
        };
        let _ = write!(text.year, "{}", now.year());

        text
    }
}

fn weekday_abbrev(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn formats_both_clock_styles() {
        // Monday
        let now = at(2024, 3, 4, 15, 7, 30);

        let text = ClockText::format(&now, HourFormat::TwentyFour, Skin::Blocks);
        assert_eq!(text.hour.as_str(), "15");
        assert_eq!(text.minute.as_str(), "07");
        assert_eq!(text.date.as_str(), "Mon 04");
        assert_eq!(text.year.as_str(), "2024");

        let text = ClockText::format(&now, HourFormat::Twelve, Skin::Cross);
        assert_eq!(text.hour.as_str(), "03");
        assert_eq!(text.date.as_str(), "04 Mon");
    }

    #[test]
    fn midnight_is_twelve_on_a_twelve_hour_clock() {
        let text = ClockText::format(&at(2023, 12, 31, 0, 0, 0), HourFormat::Twelve, Skin::Blocks);
        assert_eq!(text.hour.as_str(), "12");
        assert_eq!(text.date.as_str(), "Sun 31");
    }

    #[test]
    fn ticker_fires_once_per_minute() {
        let mut ticker = MinuteTicker::new();
        assert!(ticker.poll(at(2024, 1, 1, 10, 0, 59)).is_some());
        assert!(ticker.poll(at(2024, 1, 1, 10, 0, 59)).is_none());
        assert!(ticker.poll(at(2024, 1, 1, 10, 1, 0)).is_some());
        assert!(ticker.poll(at(2024, 1, 1, 10, 1, 30)).is_none());
        // Same minute of another day
        assert!(ticker.poll(at(2024, 1, 2, 10, 1, 30)).is_some());
    }

    #[test]
    fn decodes_current_time_characteristic() {
        let bytes = [0xe8, 0x07, 3, 4, 15, 7, 30, 1, 128, 0];
        let time = decode_current_time(&bytes).unwrap();
        assert_eq!(time, at(2024, 3, 4, 15, 7, 30) + chrono::Duration::milliseconds(500));

        assert_eq!(decode_current_time(&bytes[..5]), Err(ClockError::TooShort));
        let bad_month = [0xe8, 0x07, 13, 4, 15, 7, 30, 1, 0];
        assert_eq!(decode_current_time(&bad_month), Err(ClockError::InvalidDate));
        let bad_hour = [0xe8, 0x07, 3, 4, 24, 7, 30, 1, 0];
        assert_eq!(decode_current_time(&bad_hour), Err(ClockError::InvalidTime));
    }

    #[test]
    fn applies_offset_to_epoch() {
        // 2024-03-04T14:07:30Z
        let local = local_from_epoch(1_709_561_250, 3_600).unwrap();
        assert_eq!(local, at(2024, 3, 4, 15, 7, 30));

        assert_eq!(local_from_epoch(i64::MAX, 3_600), Err(ClockError::OutOfRange));
        assert_eq!(local_from_epoch(i64::MIN, -3_600), Err(ClockError::OutOfRange));
        assert_eq!(local_from_epoch(i64::MAX - 10, 0), Err(ClockError::OutOfRange));
    }
}
