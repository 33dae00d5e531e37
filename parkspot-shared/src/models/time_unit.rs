use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of bookable units in one calendar day.
pub const UNITS_PER_DAY: u8 = 48;

/// Length of a single bookable unit.
pub const UNIT_MINUTES: i64 = 30;

/// Identifies one bookable unit of a listing's calendar.
///
/// Ordering is chronological: by date, then by unit number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeUnitKey {
    pub date: NaiveDate,
    pub unit: u8,
}

impl TimeUnitKey {
    pub fn new(date: NaiveDate, unit: u8) -> Option<Self> {
        (unit < UNITS_PER_DAY).then_some(Self { date, unit })
    }

    /// Wall-clock start of the unit.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(NaiveTime::MIN) + Duration::minutes(i64::from(self.unit) * UNIT_MINUTES)
    }

    /// Maps a timestamp onto the unit that starts at it. Returns `None` for
    /// timestamps that are not on a unit boundary.
    pub fn at(instant: NaiveDateTime) -> Option<Self> {
        let time = instant.time();
        if time.second() != 0 || time.nanosecond() != 0 {
            return None;
        }
        let minutes = i64::from(time.hour()) * 60 + i64::from(time.minute());
        if minutes % UNIT_MINUTES != 0 {
            return None;
        }
        let unit = u8::try_from(minutes / UNIT_MINUTES).ok()?;
        Self::new(instant.date(), unit)
    }

    /// The unit immediately following this one, rolling over to the next day.
    pub fn next(&self) -> Option<Self> {
        if self.unit + 1 < UNITS_PER_DAY {
            return Some(Self { date: self.date, unit: self.unit + 1 });
        }
        self.date.succ_opt().map(|date| Self { date, unit: 0 })
    }
}

/// The units of one date, in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub units: Vec<u8>,
}

impl TimeSlot {
    pub fn new(date: NaiveDate, units: Vec<u8>) -> Self {
        Self { date, units }
    }

    /// Groups unit keys by date. Dates come out ascending, units ascending and
    /// deduplicated within each date.
    pub fn group<I>(keys: I) -> Vec<TimeSlot>
    where
        I: IntoIterator<Item = TimeUnitKey>,
    {
        let mut by_date: BTreeMap<NaiveDate, Vec<u8>> = BTreeMap::new();
        for key in keys {
            by_date.entry(key.date).or_default().push(key.unit);
        }
        by_date
            .into_iter()
            .map(|(date, mut units)| {
                units.sort_unstable();
                units.dedup();
                TimeSlot { date, units }
            })
            .collect()
    }

    /// Expands the slot back into keys. Unit numbers out of range are skipped.
    pub fn keys(&self) -> impl Iterator<Item = TimeUnitKey> + '_ {
        self.units
            .iter()
            .filter_map(move |unit| TimeUnitKey::new(self.date, *unit))
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }
}

/// A requested booking interval as supplied by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }
}

/// A half-open run of consecutive units, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnitRange {
    pub start: TimeUnitKey,
    pub end: TimeUnitKey,
}

impl UnitRange {
    pub fn contains(&self, key: &TimeUnitKey) -> bool {
        self.start <= *key && *key < self.end
    }

    pub fn len(&self) -> usize {
        let minutes = (self.end.starts_at() - self.start.starts_at()).num_minutes();
        usize::try_from(minutes / UNIT_MINUTES).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overlaps(&self, other: &UnitRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn keys(&self) -> impl Iterator<Item = TimeUnitKey> {
        let end = self.end;
        std::iter::successors(Some(self.start), |key| key.next()).take_while(move |key| *key < end)
    }
}
