//! One year of active and inactive days, one bitmask per month.

use crate::error::{CalendarError, Result};
use crate::mask::{self, Polarity};
use chrono::{Datelike, NaiveDate};
use serde_json::Value;
use std::collections::BTreeMap;

/// Year to month slots, the shape calendars are exported and imported with.
///
/// Serialized as `{"2024": [mask, null, ...]}`.
pub type Snapshot = BTreeMap<i32, [Option<u32>; 12]>;

/// Active days of a single year.
///
/// Each of the 12 slots is either unset (no policy defined for that month) or a bitmask where bit
/// `day - 1` marks `day` as active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    year: i32,
    active_days: [Option<u32>; 12],
}

impl Calendar {
    /// Create a calendar for `year` with every month unset.
    pub fn new(year: i32) -> Calendar {
        Calendar {
            year,
            active_days: [None; 12],
        }
    }

    /// Create a calendar from raw month slots, no bit range validation is performed.
    pub fn with_active_days(year: i32, active_days: [Option<u32>; 12]) -> Calendar {
        Calendar { year, active_days }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn active_days(&self) -> &[Option<u32>; 12] {
        &self.active_days
    }

    /// Mark a day as active, an unset month is considered empty beforehand.
    pub fn set_day_active(&mut self, month_index: u32, day: u32) -> Result<()> {
        let mask = mask::day_mask(self.year, month_index, day, Polarity::Active)?;
        self.apply_mask(month_index, mask, Polarity::Active);
        Ok(())
    }

    /// Mark a day as inactive.
    ///
    /// When the month is unset, it ends up with every other day active.
    pub fn set_day_inactive(&mut self, month_index: u32, day: u32) -> Result<()> {
        let mask = mask::day_mask(self.year, month_index, day, Polarity::Inactive)?;
        self.apply_mask(month_index, mask, Polarity::Inactive);
        Ok(())
    }

    /// Returns true if the day is active, fails if its month was never specified.
    ///
    /// ```
    /// use activecal::calendar::Calendar;
    ///
    /// let mut cal = Calendar::new(2024);
    /// assert!(cal.is_active(0, 3).is_err());
    ///
    /// cal.set_day_active(0, 3).unwrap();
    /// assert!(cal.is_active(0, 3).unwrap());
    /// assert!(!cal.is_active(0, 4).unwrap());
    /// ```
    pub fn is_active(&self, month_index: u32, day: u32) -> Result<bool> {
        mask::check_month_index(month_index)?;
        let month = self.active_days[month_index as usize]
            .ok_or(CalendarError::UnspecifiedMonth { month_index })?;
        let mask = mask::day_mask(self.year, month_index, day, Polarity::Active)?;
        Ok(mask & month != 0)
    }

    /// Same as [`Calendar::is_active`], addressed by date.
    pub fn is_active_date(&self, date: NaiveDate) -> Result<bool> {
        if date.year() != self.year {
            return Err(CalendarError::YearMismatch {
                expected: self.year,
                found: date.year(),
            });
        }
        self.is_active(date.month0(), date.day())
    }

    /// Count active days over the specified months. Bits past the end of a month are ignored.
    pub fn count_active(&self) -> u32 {
        (0..12)
            .zip(self.active_days.iter())
            .filter_map(|(month_index, month)| {
                let valid = mask::all_active_mask(self.year, month_index).unwrap_or(0);
                month.map(|bits| (bits & valid).count_ones())
            })
            .sum()
    }

    /// Merge a precomputed day mask into a month. `month_index` must already be validated.
    pub(crate) fn apply_mask(&mut self, month_index: u32, mask: u32, polarity: Polarity) {
        let slot = &mut self.active_days[month_index as usize];
        *slot = Some(match (polarity, *slot) {
            (Polarity::Active, current) => current.unwrap_or(0) | mask,
            (Polarity::Inactive, Some(current)) => current & mask,
            // an unset month keeps the other days of the inactive mask
            (Polarity::Inactive, None) => mask,
        });
    }

    /// Overwrite a whole month. `month_index` must already be validated.
    pub(crate) fn set_month(&mut self, month_index: u32, mask: u32) {
        self.active_days[month_index as usize] = Some(mask);
    }

    pub fn to_snapshot(&self) -> Snapshot {
        BTreeMap::from([(self.year, self.active_days)])
    }

    /// Export as `{"<year>": [...]}`.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_snapshot())?)
    }

    /// Read every calendar of a snapshot document. Malformed entries are skipped with a warning.
    ///
    /// ```
    /// use activecal::calendar::Calendar;
    ///
    /// let cals = Calendar::from_json(r#"{"2024": [1, null], "oops": []}"#).unwrap();
    /// assert_eq!(cals.len(), 1);
    /// assert_eq!(cals[0].year(), 2024);
    /// assert_eq!(cals[0].active_days()[0], Some(1));
    /// ```
    pub fn from_json(json: &str) -> Result<Vec<Calendar>> {
        Calendar::from_snapshot_value(serde_json::from_str(json)?)
    }

    /// Same as [`Calendar::from_json`] for an already parsed document. Calendars come back in
    /// ascending year order.
    pub fn from_snapshot_value(value: Value) -> Result<Vec<Calendar>> {
        let Value::Object(entries) = value else {
            return Err(CalendarError::Json(serde::de::Error::custom(
                "expected an object keyed by year",
            )));
        };
        let mut calendars = Vec::with_capacity(entries.len());
        for (key, days) in entries {
            match parse_entry(&key, days) {
                Ok(calendar) => calendars.push(calendar),
                Err(reason) => log::warn!("skipping snapshot entry {key:?}: {reason}"),
            }
        }
        // object keys are ordered as strings
        calendars.sort_by_key(Calendar::year);
        Ok(calendars)
    }
}

fn parse_entry(key: &str, days: Value) -> std::result::Result<Calendar, String> {
    let year: i32 = key
        .trim()
        .parse()
        .map_err(|e| format!("invalid year: {e}"))?;
    let slots: Vec<Option<u32>> =
        serde_json::from_value(days).map_err(|e| format!("invalid month slots: {e}"))?;
    if slots.len() > 12 {
        return Err(format!("{} month slots, expected at most 12", slots.len()));
    }
    let mut active_days = [None; 12];
    active_days[..slots.len()].copy_from_slice(&slots);
    Ok(Calendar::with_active_days(year, active_days))
}
