use activecal::builder::CalendarBuilder;
fn main() {
    let mut builder = CalendarBuilder::new();
    builder
        .init_year_weekends_inactive(2024)
        .unwrap()
        .set_day_inactive(2024, 0, 1)
        .unwrap()
        .set_range_inactive(2024, 11, 24, 26)
        .unwrap();
    println!("{}", builder.to_json().unwrap());
}
