use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid time '{0}', expected zero-padded HH:MM")]
pub struct TimeParseError(pub String);

/// Wall-clock time of day stored as minutes since midnight.
///
/// Parses and renders only the zero-padded 24-hour `HH:MM` form, so string
/// equality and value equality agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self(minutes))
    }

    pub fn from_hm(hours: u8, minutes: u8) -> Option<Self> {
        if hours > 23 || minutes > 59 {
            return None;
        }
        Some(Self(hours as u16 * 60 + minutes as u16))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hours(self) -> u16 {
        self.0 / 60
    }

    pub fn minute_of_hour(self) -> u16 {
        self.0 % 60
    }

    pub fn minutes_until(self, later: TimeOfDay) -> Option<u16> {
        later.0.checked_sub(self.0)
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        let well_formed = bytes.len() == 5
            && bytes[2] == b':'
            && [0, 1, 3, 4].iter().all(|&i| bytes[i].is_ascii_digit());
        if !well_formed {
            return Err(TimeParseError(s.to_string()));
        }

        let hours = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');
        let minutes = (bytes[3] - b'0') * 10 + (bytes[4] - b'0');
        TimeOfDay::from_hm(hours, minutes).ok_or_else(|| TimeParseError(s.to_string()))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hours(), self.minute_of_hour())
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAvailability {
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub available: bool,
}

/// Bookable view of one doctor's day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySchedule {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub slots: Vec<SlotAvailability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Day of week with 0 = Sunday.
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_zero_padded_times() {
        let t: TimeOfDay = "09:30".parse().unwrap();
        assert_eq!(t.minutes(), 570);
        assert_eq!(t.to_string(), "09:30");
        assert_eq!("23:59".parse::<TimeOfDay>().unwrap().minutes(), 1439);
    }

    #[test]
    fn rejects_malformed_times() {
        for bad in ["9:30", "24:00", "12:60", "12-30", "ab:cd", "", "12:300"] {
            assert!(bad.parse::<TimeOfDay>().is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn serde_uses_hh_mm_strings() {
        let slot = TimeSlot {
            start: TimeOfDay::from_hm(9, 0).unwrap(),
            end: TimeOfDay::from_hm(9, 30).unwrap(),
        };
        let json = serde_json::to_value(slot).unwrap();
        assert_eq!(json["start"], "09:00");
        assert!(serde_json::from_str::<TimeOfDay>("\"7:00\"").is_err());
    }

    #[test]
    fn sunday_is_day_zero() {
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_eq!(day_of_week(sunday), 0);
        assert_eq!(day_of_week(monday), 1);
    }
}
