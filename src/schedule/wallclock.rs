use std::fmt;

use chrono::{NaiveTime, Timelike};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// A local wall-clock time, stored as minutes since midnight.
///
/// Appointment times travel as 12-hour strings (`"02:30 PM"`) while blocked
/// ranges and configuration use 24-hour strings (`"14:30"`). Both forms parse
/// into this type so comparisons never touch the string representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WallTime(u32);

impl WallTime {
    /// Builds a constant time; out-of-range parts wrap.
    pub const fn at(hour: u32, minute: u32) -> Self {
        Self((hour % 24) * 60 + minute % 60)
    }

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self(minutes))
    }

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self(hour * 60 + minute))
    }

    pub fn minutes(self) -> u32 {
        self.0
    }

    pub fn hour(self) -> u32 {
        self.0 / 60
    }

    pub fn minute(self) -> u32 {
        self.0 % 60
    }

    /// Parses `"hh:mm AM"` / `"hh:mm PM"`.
    ///
    /// PM adds twelve hours except for 12 PM, and 12 AM becomes hour zero.
    pub fn parse_meridiem(value: &str) -> Option<Self> {
        let (clock, marker) = value.trim().split_once(' ')?;
        let (hour, minute) = split_hm(clock)?;
        if !(1..=12).contains(&hour) {
            return None;
        }
        let hour = match marker.trim().to_ascii_uppercase().as_str() {
            "AM" if hour == 12 => 0,
            "AM" => hour,
            "PM" if hour == 12 => 12,
            "PM" => hour + 12,
            _ => return None,
        };
        Self::from_hm(hour, minute)
    }

    /// Parses `"HH:MM"` in 24-hour form.
    pub fn parse_24h(value: &str) -> Option<Self> {
        let (hour, minute) = split_hm(value.trim())?;
        Self::from_hm(hour, minute)
    }

    /// Accepts either representation; anything carrying an AM/PM marker is
    /// read as 12-hour.
    pub fn parse(value: &str) -> Option<Self> {
        let upper = value.to_ascii_uppercase();
        if upper.contains("AM") || upper.contains("PM") {
            Self::parse_meridiem(value)
        } else {
            Self::parse_24h(value)
        }
    }

    pub fn to_meridiem(self) -> String {
        let (hour, marker) = match self.hour() {
            0 => (12, "AM"),
            h @ 1..=11 => (h, "AM"),
            12 => (12, "PM"),
            h => (h - 12, "PM"),
        };
        format!("{hour:02}:{:02} {marker}", self.minute())
    }

    pub fn to_24h(self) -> String {
        format!("{:02}:{:02}", self.hour(), self.minute())
    }
}

impl From<NaiveTime> for WallTime {
    fn from(time: NaiveTime) -> Self {
        Self(time.hour() * 60 + time.minute())
    }
}

impl fmt::Display for WallTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_meridiem())
    }
}

fn split_hm(value: &str) -> Option<(u32, u32)> {
    let (hour, minute) = value.split_once(':')?;
    if minute.len() != 2 || hour.is_empty() || hour.len() > 2 {
        return None;
    }
    Some((hour.parse().ok()?, minute.parse().ok()?))
}
