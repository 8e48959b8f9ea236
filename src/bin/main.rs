use activecal::builder::{CalendarBuilder, DEFAULT_SNAPSHOT_VAR};
use std::env::args;

/// Print a JSON snapshot with weekends inactive for years `first` to `last`, on top of any
/// snapshot found in `ACTIVECAL_SNAPSHOT`.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = args().collect();
    if args.len() < 2 {
        return Err(format!("Usage: {} first [last]", args[0]).into());
    }
    let first: i32 = args[1].parse()?;
    let last: i32 = match args.get(2) {
        Some(last) => last.parse()?,
        None => first,
    };
    let mut builder = CalendarBuilder::new();
    builder.load_from_env(DEFAULT_SNAPSHOT_VAR)?;
    for year in first..=last {
        if builder.build_all().iter().any(|c| c.year() == year) {
            continue;
        }
        builder.init_year_weekends_inactive(year)?;
    }
    println!("{}", builder.to_json()?);
    Ok(())
}
