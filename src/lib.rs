//! Per-year calendars of active and inactive days (e.g. business days), stored as one `u32`
//! bitmask per month and built through a fluent [`CalendarBuilder`](builder::CalendarBuilder).

pub mod builder;
pub mod calendar;
pub mod error;
pub mod mask;
