use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};

use super::wallclock::WallTime;

/// Opening window and slot grid of the shop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusinessHours {
    pub open: WallTime,
    pub close: WallTime,
    pub slot_interval: u32,
    pub closed_days: Vec<Weekday>,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            open: WallTime::at(9, 0),
            close: WallTime::at(21, 0),
            slot_interval: 30,
            closed_days: vec![Weekday::Sun],
        }
    }
}

impl BusinessHours {
    pub fn is_closed_on(&self, date: NaiveDate) -> bool {
        self.closed_days.contains(&date.weekday())
    }

    /// Every grid start whose full service fits before closing.
    pub fn candidate_starts(&self, duration_minutes: u32) -> Vec<WallTime> {
        let step = self.slot_interval.max(1) as usize;
        let close = self.close.minutes();
        (self.open.minutes()..close)
            .step_by(step)
            .filter(|start| start + duration_minutes <= close)
            .filter_map(WallTime::from_minutes)
            .collect()
    }
}

/// Half-open `[start, end)` span of minutes within one day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval {
    pub start: u32,
    pub end: u32,
}

impl Interval {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn starting_at(start: WallTime, duration_minutes: u32) -> Self {
        Self::new(start.minutes(), start.minutes() + duration_minutes)
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Starts on `date` where a service of `duration_minutes` fits without
/// touching any busy interval. Busy intervals are appointments holding the
/// chair and blocked ranges covering the date; the caller collects both.
pub fn open_slots(
    hours: &BusinessHours,
    date: NaiveDate,
    duration_minutes: u32,
    busy: &[Interval],
) -> Vec<WallTime> {
    if hours.is_closed_on(date) {
        return Vec::new();
    }
    hours
        .candidate_starts(duration_minutes)
        .into_iter()
        .filter(|start| {
            let wanted = Interval::starting_at(*start, duration_minutes);
            !busy.iter().any(|taken| taken.overlaps(&wanted))
        })
        .collect()
}

/// Drops slots that are no longer bookable today.
///
/// Only applies when `date` is the same calendar day as `now`; a slot stays
/// when its time is strictly later than the current hour and minute. Slots
/// that cannot be parsed are dropped from today's list. Order is preserved.
pub fn remaining_today(slots: Vec<String>, date: NaiveDate, now: NaiveDateTime) -> Vec<String> {
    if date != now.date() {
        return slots;
    }
    let current = WallTime::from(now.time());
    slots
        .into_iter()
        .filter(|slot| match WallTime::parse_meridiem(slot) {
            Some(time) => time > current,
            None => {
                log::warn!("Dropping unparseable slot `{slot}`");
                false
            }
        })
        .collect()
}
