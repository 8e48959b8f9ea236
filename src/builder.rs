//! Fluent construction of per-year calendars.

use crate::calendar::{Calendar, Snapshot};
use crate::error::{CalendarError, Result};
use crate::mask::{self, Polarity};
use chrono::{Datelike, NaiveDate, Weekday};
use serde_json::Value;
use std::env::{self, VarError};

/// Environment variable conventionally holding a JSON snapshot, see
/// [`CalendarBuilder::load_from_env`].
pub const DEFAULT_SNAPSHOT_VAR: &str = "ACTIVECAL_SNAPSHOT";

/// Owns one [`Calendar`] per year, kept in ascending year order.
///
/// Every method referencing a year creates its calendar on first use.
///
/// ```
/// use activecal::builder::CalendarBuilder;
///
/// let mut builder = CalendarBuilder::new();
/// builder
///     .init_year_weekends_inactive(2024)?
///     .set_day_inactive(2024, 0, 1)?
///     .set_range_inactive(2024, 11, 24, 26)?;
///
/// let cal = builder.build(2024);
/// assert!(!cal.is_active(0, 1)?);
/// assert!(cal.is_active(0, 2)?);
/// # Ok::<(), activecal::error::CalendarError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct CalendarBuilder {
    calendars: Vec<Calendar>,
}

impl CalendarBuilder {
    pub fn new() -> CalendarBuilder {
        CalendarBuilder::default()
    }

    /// Builder holding every well-formed entry of a JSON snapshot.
    pub fn from_json(json: &str) -> Result<CalendarBuilder> {
        let mut builder = CalendarBuilder::new();
        builder.load_json(json)?;
        Ok(builder)
    }

    fn position(&self, year: i32) -> Option<usize> {
        self.calendars.iter().position(|c| c.year() == year)
    }

    /// Insert while keeping the ascending year order, returns the new index.
    fn insert(&mut self, calendar: Calendar) -> usize {
        let index = self
            .calendars
            .partition_point(|c| c.year() < calendar.year());
        self.calendars.insert(index, calendar);
        index
    }

    /// Get the calendar of `year`, creating an unset one if it does not exist yet.
    pub fn get_or_create(&mut self, year: i32) -> &mut Calendar {
        let index = match self.position(year) {
            Some(index) => index,
            None => {
                log::debug!("creating calendar for {year}");
                self.insert(Calendar::new(year))
            }
        };
        &mut self.calendars[index]
    }

    /// Make sure a calendar exists for `year` without touching its months.
    pub fn add_year(&mut self, year: i32) -> &mut Self {
        self.get_or_create(year);
        self
    }

    /// Take ownership of a pre-built calendar.
    pub fn load(&mut self, calendar: Calendar) -> Result<&mut Self> {
        let year = calendar.year();
        if self.position(year).is_some() {
            return Err(CalendarError::DuplicateYear { year });
        }
        log::debug!("loading calendar for {year}");
        self.insert(calendar);
        Ok(self)
    }

    fn load_or_skip(&mut self, calendars: impl IntoIterator<Item = Calendar>) {
        for calendar in calendars {
            if let Err(e) = self.load(calendar) {
                log::warn!("skipping snapshot entry: {e}");
            }
        }
    }

    /// Load a snapshot, as returned by [`CalendarBuilder::to_snapshot`]. Years that already exist
    /// are skipped with a warning.
    pub fn load_snapshot(&mut self, snapshot: Snapshot) -> &mut Self {
        self.load_or_skip(
            snapshot
                .into_iter()
                .map(|(year, active_days)| Calendar::with_active_days(year, active_days)),
        );
        self
    }

    /// Load every entry of a parsed snapshot document.
    ///
    /// Malformed entries and years that already exist are skipped with a warning, only a document
    /// that is not an object fails.
    pub fn load_value(&mut self, snapshot: Value) -> Result<&mut Self> {
        self.load_or_skip(Calendar::from_snapshot_value(snapshot)?);
        Ok(self)
    }

    /// Same as [`CalendarBuilder::load_value`] from JSON text.
    pub fn load_json(&mut self, json: &str) -> Result<&mut Self> {
        self.load_value(serde_json::from_str(json)?)
    }

    /// Load the JSON snapshot held by the environment variable `var`, if it is set.
    pub fn load_from_env(&mut self, var: &str) -> Result<&mut Self> {
        match env::var(var) {
            Ok(json) => self.load_json(&json),
            Err(VarError::NotPresent) => Ok(self),
            Err(VarError::NotUnicode(_)) => {
                log::warn!("ignoring {var}: not valid unicode");
                Ok(self)
            }
        }
    }

    pub fn init_year_all_inactive(&mut self, year: i32) -> &mut Self {
        let calendar = self.get_or_create(year);
        for month_index in 0..12 {
            calendar.set_month(month_index, 0);
        }
        self
    }

    /// Fails without creating the calendar when `year` cannot be represented.
    pub fn init_year_all_active(&mut self, year: i32) -> Result<&mut Self> {
        let mut months = [0; 12];
        for (month_index, month) in (0..12).zip(months.iter_mut()) {
            *month = mask::all_active_mask(year, month_index)?;
        }
        let calendar = self.get_or_create(year);
        for (month_index, month) in (0..12).zip(months) {
            calendar.set_month(month_index, month);
        }
        Ok(self)
    }

    /// Every month of `year` with weekdays active and weekends inactive.
    pub fn init_year_weekends_inactive(&mut self, year: i32) -> Result<&mut Self> {
        for month_index in 0..12 {
            self.init_month_weekends_inactive(year, month_index)?;
        }
        Ok(self)
    }

    pub fn init_month_all_inactive(&mut self, year: i32, month_index: u32) -> Result<&mut Self> {
        mask::check_month_index(month_index)?;
        self.get_or_create(year).set_month(month_index, 0);
        Ok(self)
    }

    pub fn init_month_all_active(&mut self, year: i32, month_index: u32) -> Result<&mut Self> {
        let mask = mask::all_active_mask(year, month_index)?;
        self.get_or_create(year).set_month(month_index, mask);
        Ok(self)
    }

    pub fn init_month_weekends_inactive(
        &mut self,
        year: i32,
        month_index: u32,
    ) -> Result<&mut Self> {
        let mut mask = mask::all_active_mask(year, month_index)?;
        for day in 1..=mask::days_in_month(year, month_index)? {
            let date = NaiveDate::from_ymd_opt(year, month_index + 1, day).ok_or(
                CalendarError::DateOutOfRange {
                    year,
                    month_index,
                    day,
                },
            )?;
            if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                mask ^= mask::day_mask(year, month_index, day, Polarity::Active)?;
            }
        }
        self.get_or_create(year).set_month(month_index, mask);
        Ok(self)
    }

    /// Validates before touching any calendar, so a failed call creates nothing.
    fn set_day(&mut self, year: i32, month_index: u32, day: u32, polarity: Polarity) -> Result<()> {
        let mask = mask::day_mask(year, month_index, day, polarity)?;
        self.get_or_create(year).apply_mask(month_index, mask, polarity);
        Ok(())
    }

    pub fn set_day_active(&mut self, year: i32, month_index: u32, day: u32) -> Result<&mut Self> {
        self.set_day(year, month_index, day, Polarity::Active)?;
        Ok(self)
    }

    pub fn set_day_inactive(&mut self, year: i32, month_index: u32, day: u32) -> Result<&mut Self> {
        self.set_day(year, month_index, day, Polarity::Inactive)?;
        Ok(self)
    }

    pub fn set_day_active_from_date(&mut self, date: NaiveDate) -> Result<&mut Self> {
        self.set_day_active(date.year(), date.month0(), date.day())
    }

    pub fn set_day_inactive_from_date(&mut self, date: NaiveDate) -> Result<&mut Self> {
        self.set_day_inactive(date.year(), date.month0(), date.day())
    }

    fn set_range(
        &mut self,
        year: i32,
        month_index: u32,
        start: u32,
        end: u32,
        polarity: Polarity,
    ) -> Result<&mut Self> {
        if start > end {
            return Err(CalendarError::InvalidRange { start, end });
        }
        // days preceding an invalid one stay applied
        for day in start..=end {
            self.set_day(year, month_index, day, polarity)?;
        }
        Ok(self)
    }

    /// Activate the days `start..=end` of one month.
    pub fn set_range_active(
        &mut self,
        year: i32,
        month_index: u32,
        start: u32,
        end: u32,
    ) -> Result<&mut Self> {
        self.set_range(year, month_index, start, end, Polarity::Active)
    }

    /// Deactivate the days `start..=end` of one month.
    pub fn set_range_inactive(
        &mut self,
        year: i32,
        month_index: u32,
        start: u32,
        end: u32,
    ) -> Result<&mut Self> {
        self.set_range(year, month_index, start, end, Polarity::Inactive)
    }

    /// All calendars, in ascending year order.
    pub fn build_all(&self) -> &[Calendar] {
        &self.calendars
    }

    pub fn build(&mut self, year: i32) -> &Calendar {
        self.get_or_create(year)
    }

    pub fn to_snapshot(&self) -> Snapshot {
        self.calendars
            .iter()
            .map(|c| (c.year(), *c.active_days()))
            .collect()
    }

    /// Export every calendar as one compact JSON object keyed by year.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_snapshot())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn years(builder: &CalendarBuilder) -> Vec<i32> {
        builder.build_all().iter().map(Calendar::year).collect()
    }

    #[test]
    fn test_get_or_create_same_calendar() {
        let mut builder = CalendarBuilder::new();
        let first = builder.get_or_create(2023) as *const Calendar;
        let second = builder.get_or_create(2023) as *const Calendar;
        assert!(std::ptr::eq(first, second));
        assert_eq!(builder.build_all().len(), 1);

        builder.get_or_create(2023).set_day_active(2, 5).unwrap();
        builder.add_year(2020);
        assert_eq!(true, builder.build(2023).is_active(2, 5).unwrap());
    }

    #[test]
    fn test_sorted_by_year() {
        let mut builder = CalendarBuilder::new();
        builder.add_year(2023).add_year(2021).add_year(2022);
        assert_eq!(years(&builder), [2021, 2022, 2023]);

        builder.load(Calendar::new(1999)).unwrap();
        builder
            .init_year_all_active(2022)
            .unwrap()
            .init_year_all_inactive(2030);
        assert_eq!(years(&builder), [1999, 2021, 2022, 2023, 2030]);
    }

    #[test]
    fn test_load_duplicate_year() {
        let mut builder = CalendarBuilder::new();
        builder.add_year(2021);
        assert!(matches!(
            builder.load(Calendar::new(2021)),
            Err(CalendarError::DuplicateYear { year: 2021 })
        ));
        assert_eq!(builder.build_all().len(), 1);
    }

    #[test]
    fn test_init_year() {
        let mut builder = CalendarBuilder::new();
        builder
            .init_year_all_inactive(2023)
            .init_year_all_active(2024)
            .unwrap();
        assert_eq!(builder.build(2023).active_days(), &[Some(0); 12]);
        assert_eq!(builder.build(2023).count_active(), 0);
        assert_eq!(builder.build(2024).count_active(), 366);
        assert_eq!(builder.build(2024).active_days()[1], Some((1 << 29) - 1));
    }

    #[test]
    fn test_init_month() {
        let mut builder = CalendarBuilder::new();
        builder
            .init_month_all_active(2023, 3)
            .unwrap()
            .init_month_all_inactive(2023, 4)
            .unwrap();
        let cal = builder.build(2023);
        assert_eq!(cal.active_days()[3], Some((1 << 30) - 1));
        assert_eq!(cal.active_days()[4], Some(0));
        assert_eq!(cal.active_days()[5], None);

        assert!(matches!(
            builder.init_month_all_active(2023, 12),
            Err(CalendarError::InvalidMonthIndex { month_index: 12 })
        ));
        assert!(builder.init_month_all_inactive(2023, 12).is_err());
        assert!(builder.init_month_weekends_inactive(2023, 12).is_err());
    }

    #[test]
    fn test_init_month_weekends_inactive_leap_february() {
        let mut builder = CalendarBuilder::new();
        builder.init_month_weekends_inactive(2024, 1).unwrap();
        let cal = builder.build(2024);
        // Feb 2024 starts on a Thursday
        let weekends = [3, 4, 10, 11, 17, 18, 24, 25];
        for day in 1..=29 {
            assert_eq!(!weekends.contains(&day), cal.is_active(1, day).unwrap());
        }
        assert_eq!(cal.count_active(), 21);
        assert_eq!(cal.active_days()[1].unwrap() >> 29, 0);
    }

    #[test]
    fn test_init_year_weekends_inactive() {
        let mut builder = CalendarBuilder::new();
        builder.init_year_weekends_inactive(2023).unwrap();
        let cal = builder.build(2023);
        assert_eq!(cal.count_active(), 260);
        let mut date = from_ymd(2023, 1, 1);
        while date.year() == 2023 {
            let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
            assert_eq!(!weekend, cal.is_active_date(date).unwrap());
            date = date.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_set_day() {
        let mut builder = CalendarBuilder::new();
        builder
            .init_year_all_inactive(2023)
            .set_day_active(2023, 6, 4)
            .unwrap()
            .set_day_active(2023, 6, 4)
            .unwrap();
        assert_eq!(builder.build(2023).active_days()[6], Some(1 << 3));

        builder.set_day_inactive(2023, 6, 4).unwrap();
        assert_eq!(builder.build(2023).active_days()[6], Some(0));
    }

    #[test]
    fn test_builder_and_calendar_setters_agree() {
        let mut builder = CalendarBuilder::new();
        builder
            .set_day_active(2023, 0, 9)
            .unwrap()
            .set_day_inactive(2023, 1, 14)
            .unwrap();
        let mut cal = Calendar::new(2023);
        cal.set_day_active(0, 9).unwrap();
        cal.set_day_inactive(1, 14).unwrap();
        assert_eq!(builder.build(2023), &cal);
    }

    #[test]
    fn test_set_day_invalid_creates_nothing() {
        let mut builder = CalendarBuilder::new();
        assert!(matches!(
            builder.set_day_active(2023, 12, 1),
            Err(CalendarError::InvalidMonthIndex { .. })
        ));
        assert!(matches!(
            builder.set_day_inactive(2023, 1, 29),
            Err(CalendarError::DayOutOfRange { .. })
        ));
        assert!(builder.set_day_active(2023, 0, 0).is_err());
        assert!(builder.build_all().is_empty());
    }

    #[test]
    fn test_set_from_date() {
        let mut builder = CalendarBuilder::new();
        builder
            .init_year_all_active(2022)
            .unwrap()
            .set_day_inactive_from_date(from_ymd(2022, 12, 25))
            .unwrap()
            .set_day_active_from_date(from_ymd(2023, 1, 2))
            .unwrap();
        assert_eq!(false, builder.build(2022).is_active(11, 25).unwrap());
        assert_eq!(true, builder.build(2022).is_active(11, 24).unwrap());
        assert_eq!(true, builder.build(2023).is_active(0, 2).unwrap());
    }

    #[test]
    fn test_set_range() {
        let mut builder = CalendarBuilder::new();
        builder
            .init_month_all_inactive(2023, 0)
            .unwrap()
            .set_range_active(2023, 0, 5, 10)
            .unwrap()
            .init_month_all_active(2023, 1)
            .unwrap()
            .set_range_inactive(2023, 1, 27, 28)
            .unwrap();
        let cal = builder.build(2023);
        assert_eq!(cal.active_days()[0], Some(0b11_1111 << 4));
        assert_eq!(cal.active_days()[1], Some((1 << 26) - 1));

        builder.set_range_active(2023, 2, 7, 7).unwrap();
        assert_eq!(builder.build(2023).active_days()[2], Some(1 << 6));
    }

    #[test]
    fn test_set_range_invalid() {
        let mut builder = CalendarBuilder::new();
        assert!(matches!(
            builder.set_range_active(2023, 0, 10, 5),
            Err(CalendarError::InvalidRange { start: 10, end: 5 })
        ));
        assert!(builder.set_range_inactive(2023, 0, 10, 5).is_err());
        assert!(builder.build_all().is_empty());

        // applied up to the last valid day
        assert!(matches!(
            builder.set_range_active(2023, 1, 27, 30),
            Err(CalendarError::DayOutOfRange { day: 29, .. })
        ));
        assert_eq!(builder.build(2023).active_days()[1], Some(0b11 << 26));
    }

    #[test]
    fn test_json_round_trip() {
        let mut builder = CalendarBuilder::new();
        builder
            .init_year_weekends_inactive(2024)
            .unwrap()
            .set_day_inactive(2024, 0, 1)
            .unwrap()
            .set_day_active(2021, 5, 12)
            .unwrap();
        let json = builder.to_json().unwrap();
        assert!(json.starts_with(r#"{"2021":[null,null,null,null,null,2048,"#));

        let reloaded = CalendarBuilder::from_json(&json).unwrap();
        assert_eq!(reloaded.build_all(), builder.build_all());
        assert_eq!(reloaded.to_json().unwrap(), json);
    }

    #[test]
    fn test_load_json_skips_bad_entries() {
        let mut builder = CalendarBuilder::new();
        builder.init_year_all_active(2022).unwrap();
        builder
            .load_json(r#"{"2023": [0], "2022": [0], "x": [1], "2020": [1, 2]}"#)
            .unwrap();
        assert_eq!(years(&builder), [2020, 2022, 2023]);
        // the existing calendar wins over the duplicate entry
        assert_eq!(builder.build(2022).count_active(), 365);
        assert_eq!(builder.build(2020).active_days()[1], Some(2));

        assert!(matches!(
            builder.load_json("[2023]"),
            Err(CalendarError::Json(_))
        ));
        assert!(builder.load_json("not json").is_err());
    }

    #[test]
    fn test_load_snapshot_round_trip() {
        let mut builder = CalendarBuilder::new();
        builder
            .init_year_weekends_inactive(2023)
            .unwrap()
            .set_day_active(2021, mask::MARCH, 8)
            .unwrap();
        let snapshot = builder.to_snapshot();

        let mut reloaded = CalendarBuilder::new();
        reloaded.add_year(2021).load_snapshot(snapshot.clone());
        // the existing 2021 calendar is kept
        assert_eq!(reloaded.build(2021).active_days(), &[None; 12]);
        assert_eq!(reloaded.build(2023), builder.build(2023));

        let mut fresh = CalendarBuilder::new();
        fresh.load_snapshot(snapshot.clone());
        assert_eq!(fresh.to_snapshot(), snapshot);
    }

    #[test]
    fn test_year_out_of_range() {
        let mut builder = CalendarBuilder::new();
        assert!(matches!(
            builder.init_year_all_active(i32::MAX),
            Err(CalendarError::DateOutOfRange { year: i32::MAX, .. })
        ));
        assert!(builder.init_year_weekends_inactive(i32::MIN).is_err());
        assert!(builder.init_month_all_active(i32::MAX, mask::MAY).is_err());
        assert!(builder.set_day_active(i32::MAX, mask::MAY, 1).is_err());
        assert!(builder.build_all().is_empty());
    }

    #[test]
    fn test_month_constants_in_builder() {
        let mut builder = CalendarBuilder::new();
        builder
            .init_month_all_inactive(2024, mask::JANUARY)
            .unwrap()
            .set_day_active(2024, mask::JANUARY, 1)
            .unwrap()
            .init_month_weekends_inactive(2024, mask::FEBRUARY)
            .unwrap();
        let cal = builder.build(2024);
        assert_eq!(cal.active_days()[0], Some(1));
        assert_eq!(false, cal.is_active(mask::FEBRUARY, 3).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_load_from_env_not_unicode() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let var = "ACTIVECAL_TEST_LOAD_FROM_ENV_NOT_UNICODE";
        env::set_var(var, OsStr::from_bytes(b"{\"2025\": [\xff]}"));
        let mut builder = CalendarBuilder::new();
        builder.load_from_env(var).unwrap();
        assert!(builder.build_all().is_empty());
        env::remove_var(var);
    }

    #[test]
    fn test_load_from_env() {
        let var = "ACTIVECAL_TEST_LOAD_FROM_ENV";
        let mut builder = CalendarBuilder::new();
        env::remove_var(var);
        builder.load_from_env(var).unwrap();
        assert!(builder.build_all().is_empty());

        env::set_var(var, r#"{"2025": [1]}"#);
        builder.load_from_env(var).unwrap();
        assert_eq!(years(&builder), [2025]);

        env::set_var(var, "{");
        assert!(builder.load_from_env(var).is_err());
        env::remove_var(var);
    }

    #[test]
    fn test_builder_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<CalendarBuilder>();
    }
}
