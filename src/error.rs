//! Error type shared by the mask helpers, [`Calendar`](crate::calendar::Calendar) and
//! [`CalendarBuilder`](crate::builder::CalendarBuilder).

/// Error type for all fallible calendar operations.
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    /// Month index outside `0..=11`.
    #[error("month index {month_index} out of range, expected 0..=11")]
    InvalidMonthIndex { month_index: u32 },

    /// Day outside `1..=days_in_month`.
    #[error("day {day} out of range, expected 1..={days_in_month}")]
    DayOutOfRange { day: u32, days_in_month: u32 },

    /// The date cannot be represented, e.g. when computing its weekday.
    #[error("date {year}, month index {month_index}, day {day} cannot be represented")]
    DateOutOfRange {
        year: i32,
        month_index: u32,
        day: u32,
    },

    /// Date query against the calendar of another year.
    #[error("date in year {found} queried on the calendar of year {expected}")]
    YearMismatch { expected: i32, found: i32 },

    /// A day range with `start > end`.
    #[error("start day {start} must not be after end day {end}")]
    InvalidRange { start: u32, end: u32 },

    /// Query on a month that has no active days defined yet.
    #[error("unspecified active days for month index {month_index}")]
    UnspecifiedMonth { month_index: u32 },

    /// Loading a calendar for a year the builder already holds.
    #[error("a calendar for year {year} already exists")]
    DuplicateYear { year: i32 },

    /// A snapshot document that is not a JSON object.
    #[error("invalid snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CalendarError>;
