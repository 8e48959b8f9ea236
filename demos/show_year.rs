use activecal::builder::CalendarBuilder;
use chrono::{Datelike, Duration, NaiveDate};
/// example to list the inactive days of a year with weekends and a few holidays off
use std::env::args;
fn main() {
    let args: Vec<String> = args().collect();
    if args.len() < 2 {
        panic!("Usage: {} year", args[0]);
    }
    let year: i32 = args[1].parse().unwrap();
    let mut builder = CalendarBuilder::new();
    builder
        .init_year_weekends_inactive(year)
        .unwrap()
        .set_day_inactive(year, 0, 1)
        .unwrap()
        .set_day_inactive(year, 6, 4)
        .unwrap()
        .set_day_inactive(year, 11, 25)
        .unwrap();
    let cal = builder.build(year);
    let mut date = NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
    let mut inactive: Vec<NaiveDate> = Vec::new();
    while date.year() == year {
        if !cal.is_active_date(date).unwrap() {
            inactive.push(date);
        }
        date = date + Duration::days(1);
    }
    println!("active days: {}", cal.count_active());
    println!("inactive days: {:?}", inactive);
}
