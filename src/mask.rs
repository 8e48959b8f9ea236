//! Month bitmask helpers.
//!
//! A month is stored as a `u32` where bit `k` stands for day `k + 1`. Months are addressed by a
//! 0-based index (`0` is January, `11` is December).

use crate::error::{CalendarError, Result};
use chrono::{Datelike, NaiveDate};

pub const JANUARY: u32 = 0;
pub const FEBRUARY: u32 = 1;
pub const MARCH: u32 = 2;
pub const APRIL: u32 = 3;
pub const MAY: u32 = 4;
pub const JUNE: u32 = 5;
pub const JULY: u32 = 6;
pub const AUGUST: u32 = 7;
pub const SEPTEMBER: u32 = 8;
pub const OCTOBER: u32 = 9;
pub const NOVEMBER: u32 = 10;
pub const DECEMBER: u32 = 11;

/// Whether a mask selects a single day or everything but that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Only the bit of the day is set; OR it into a month to activate the day.
    Active,
    /// Every valid bit except the day's is set; AND it into a month to deactivate the day.
    Inactive,
}

pub(crate) fn check_month_index(month_index: u32) -> Result<()> {
    if month_index > 11 {
        return Err(CalendarError::InvalidMonthIndex { month_index });
    }
    Ok(())
}

/// Number of days in the month at `month_index` of `year`, fails for years chrono cannot
/// represent.
///
/// ```
/// use activecal::mask::{days_in_month, DECEMBER, FEBRUARY};
///
/// assert_eq!(days_in_month(2024, FEBRUARY).unwrap(), 29);
/// assert_eq!(days_in_month(2023, FEBRUARY).unwrap(), 28);
/// assert_eq!(days_in_month(2023, DECEMBER).unwrap(), 31);
/// assert!(days_in_month(2023, 12).is_err());
/// ```
pub fn days_in_month(year: i32, month_index: u32) -> Result<u32> {
    check_month_index(month_index)?;
    let month = month_index + 1;
    NaiveDate::from_ymd_opt(year, month + 1, 1)
        .or_else(|| NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1))
        .and_then(|next_month| next_month.pred_opt())
        .map(|last_day| last_day.day())
        .ok_or(CalendarError::DateOutOfRange {
            year,
            month_index,
            day: 1,
        })
}

/// Mask with the low `days_in_month` bits set, i.e. every day of the month active.
pub fn all_active_mask(year: i32, month_index: u32) -> Result<u32> {
    Ok(low_bits(days_in_month(year, month_index)?))
}

/// Mask isolating `day` in the month at `month_index`, see [`Polarity`].
///
/// ```
/// use activecal::mask::{day_mask, Polarity};
///
/// assert_eq!(day_mask(2023, 0, 3, Polarity::Active).unwrap(), 0b100);
/// assert_eq!(day_mask(2023, 1, 1, Polarity::Inactive).unwrap(), 0x0fff_fffe);
/// ```
pub fn day_mask(year: i32, month_index: u32, day: u32, polarity: Polarity) -> Result<u32> {
    let days_in_month = days_in_month(year, month_index)?;
    if !(1..=days_in_month).contains(&day) {
        return Err(CalendarError::DayOutOfRange { day, days_in_month });
    }
    let bit = 1 << (day - 1);
    Ok(match polarity {
        Polarity::Active => bit,
        Polarity::Inactive => low_bits(days_in_month) & !bit,
    })
}

// `days` never exceeds 31
fn low_bits(days: u32) -> u32 {
    (1 << days) - 1
}
