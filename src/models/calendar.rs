//! Slot units and the slot space.
//!
//! The slot space is every (date, time slot) pair inside the configured
//! window that is not excluded by the weekend rule or a holiday.
//!
//! # Time Model
//! Dates are calendar dates (`chrono::NaiveDate`), no timezone. A
//! [`SlotUnit`] without a time slot stands for the whole day.
//!
//! # Precedence
//! Exclusions override the window. A date is schedulable iff:
//! - `window_start <= date <= window_end`, AND
//! - it is not a Saturday or Sunday when `skip_weekends` is set, AND
//! - it is not listed in `holidays`.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::config::SchedulingConfig;
use crate::error::ScheduleError;

/// The atomic schedulable unit.
///
/// Two units sharing a date are "same-day" regardless of time slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotUnit {
    /// Exam date.
    pub date: NaiveDate,
    /// Time slot label. `None` = whole day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_slot: Option<String>,
}

impl SlotUnit {
    /// Creates a whole-day unit.
    pub fn whole_day(date: NaiveDate) -> Self {
        Self {
            date,
            time_slot: None,
        }
    }

    /// Creates a unit for one time slot of a date.
    pub fn with_slot(date: NaiveDate, time_slot: impl Into<String>) -> Self {
        Self {
            date,
            time_slot: Some(time_slot.into()),
        }
    }

    /// Whether both units fall on the same date.
    #[inline]
    pub fn same_day(&self, other: &Self) -> bool {
        self.date == other.date
    }

    /// Absolute distance in calendar days.
    #[inline]
    pub fn days_between(&self, other: &Self) -> i64 {
        (other.date - self.date).num_days().abs()
    }
}

impl fmt::Display for SlotUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.time_slot {
            Some(slot) => write!(f, "{} {}", self.date.format("%Y-%m-%d"), slot),
            None => write!(f, "{}", self.date.format("%Y-%m-%d")),
        }
    }
}

/// Ordered set of schedulable slot units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSpace {
    units: Vec<SlotUnit>,
    time_slots: Option<Vec<String>>,
}

impl SlotSpace {
    /// Enumerates the slot space for a configuration.
    ///
    /// Units are ordered by date, then by the configured time-slot order.
    ///
    /// # Errors
    /// [`ScheduleError::EmptyWindow`] if no unit survives, including
    /// `window_start > window_end`.
    pub fn generate(config: &SchedulingConfig) -> Result<Self, ScheduleError> {
        let holidays: BTreeSet<NaiveDate> = config.holidays.iter().copied().collect();
        let time_slots = config.time_slots.clone().filter(|s| !s.is_empty());

        let mut units = Vec::new();
        for date in config
            .window_start
            .iter_days()
            .take_while(|d| *d <= config.window_end)
        {
            if config.skip_weekends && is_weekend(date) {
                continue;
            }
            if holidays.contains(&date) {
                continue;
            }
            match &time_slots {
                Some(slots) => units.extend(slots.iter().map(|s| SlotUnit::with_slot(date, s))),
                None => units.push(SlotUnit::whole_day(date)),
            }
        }

        if units.is_empty() {
            return Err(ScheduleError::EmptyWindow {
                start: config.window_start,
                end: config.window_end,
            });
        }

        Ok(Self { units, time_slots })
    }

    /// All units in order.
    pub fn units(&self) -> &[SlotUnit] {
        &self.units
    }

    /// Number of units.
    #[inline]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Always `false` for a generated space.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Whether units carry time slots.
    pub fn uses_time_slots(&self) -> bool {
        self.time_slots.is_some()
    }

    /// Distinct schedulable dates in order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.units.iter().map(|u| u.date).collect();
        dates.dedup();
        dates
    }

    /// Whether a unit belongs to this space.
    pub fn contains(&self, unit: &SlotUnit) -> bool {
        let Some(rank) = self.rank(unit.time_slot.as_deref()) else {
            return false;
        };
        self.units
            .binary_search_by(|u| self.order_key(u).cmp(&(unit.date, rank)))
            .is_ok()
    }

    /// Position of a time-slot label in the configured order.
    ///
    /// Whole-day units rank 0 when no time slots are configured.
    pub fn rank(&self, time_slot: Option<&str>) -> Option<usize> {
        match (&self.time_slots, time_slot) {
            (None, None) => Some(0),
            (Some(slots), Some(label)) => slots.iter().position(|s| s == label),
            _ => None,
        }
    }

    fn order_key(&self, unit: &SlotUnit) -> (NaiveDate, usize) {
        (
            unit.date,
            self.rank(unit.time_slot.as_deref()).unwrap_or(usize::MAX),
        )
    }
}

/// Saturday or Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_slot_unit_distance() {
        let a = SlotUnit::whole_day(d(2025, 6, 2));
        let b = SlotUnit::with_slot(d(2025, 6, 5), "AM");
        assert_eq!(a.days_between(&b), 3);
        assert_eq!(b.days_between(&a), 3);
        assert!(!a.same_day(&b));
        assert!(b.same_day(&SlotUnit::with_slot(d(2025, 6, 5), "PM")));
    }

    #[test]
    fn test_slot_unit_display() {
        assert_eq!(SlotUnit::whole_day(d(2025, 6, 2)).to_string(), "2025-06-02");
        assert_eq!(
            SlotUnit::with_slot(d(2025, 6, 2), "8:30-10:30").to_string(),
            "2025-06-02 8:30-10:30"
        );
    }

    #[test]
    fn test_weekdays_only() {
        // 2025-06-02 is a Monday; window runs to Sunday 2025-06-08
        let cfg = SchedulingConfig::new(d(2025, 6, 2), d(2025, 6, 8));
        let space = SlotSpace::generate(&cfg).unwrap();
        assert_eq!(space.len(), 5);
        assert_eq!(space.dates().first(), Some(&d(2025, 6, 2)));
        assert_eq!(space.dates().last(), Some(&d(2025, 6, 6)));
        assert!(!space.uses_time_slots());
    }

    #[test]
    fn test_weekends_kept() {
        let cfg = SchedulingConfig::new(d(2025, 6, 2), d(2025, 6, 8)).with_skip_weekends(false);
        assert_eq!(SlotSpace::generate(&cfg).unwrap().len(), 7);
    }

    #[test]
    fn test_holiday_excluded() {
        let cfg = SchedulingConfig::new(d(2025, 6, 2), d(2025, 6, 6)).with_holiday(d(2025, 6, 4));
        let space = SlotSpace::generate(&cfg).unwrap();
        assert_eq!(space.len(), 4);
        assert!(!space.dates().contains(&d(2025, 6, 4)));
    }

    #[test]
    fn test_time_slots_crossed() {
        let cfg = SchedulingConfig::new(d(2025, 6, 2), d(2025, 6, 3)).with_time_slots(["AM", "PM"]);
        let space = SlotSpace::generate(&cfg).unwrap();
        assert_eq!(space.len(), 4);
        assert_eq!(space.units()[0], SlotUnit::with_slot(d(2025, 6, 2), "AM"));
        assert_eq!(space.units()[1], SlotUnit::with_slot(d(2025, 6, 2), "PM"));
        assert_eq!(space.dates().len(), 2);
        assert_eq!(space.rank(Some("PM")), Some(1));
    }

    #[test]
    fn test_contains() {
        let cfg = SchedulingConfig::new(d(2025, 6, 2), d(2025, 6, 3)).with_time_slots(["AM", "PM"]);
        let space = SlotSpace::generate(&cfg).unwrap();
        assert!(space.contains(&SlotUnit::with_slot(d(2025, 6, 3), "PM")));
        assert!(!space.contains(&SlotUnit::with_slot(d(2025, 6, 3), "EVE")));
        assert!(!space.contains(&SlotUnit::whole_day(d(2025, 6, 3))));
        assert!(!space.contains(&SlotUnit::with_slot(d(2025, 6, 4), "AM")));
    }

    #[test]
    fn test_inverted_window_is_empty() {
        let cfg = SchedulingConfig::new(d(2025, 6, 6), d(2025, 6, 2));
        assert!(matches!(
            SlotSpace::generate(&cfg),
            Err(ScheduleError::EmptyWindow { .. })
        ));
    }

    #[test]
    fn test_weekend_only_window_is_empty() {
        let cfg = SchedulingConfig::new(d(2025, 6, 7), d(2025, 6, 8));
        let err = SlotSpace::generate(&cfg).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::EmptyWindow {
                start: d(2025, 6, 7),
                end: d(2025, 6, 8),
            }
        );
    }
}
