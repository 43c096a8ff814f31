use std::fmt::Display;

use chrono::{DateTime, Duration, TimeZone};

/// Stopwatch style `HH:MM:SS`. Hours are not wrapped, a 30 hour total prints as `30:00:00`.
pub fn format_clock(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Coarse format used in statistics: `7 h 30 min`.
pub fn format_hours(duration: Duration) -> String {
    let total = duration.num_minutes().max(0);
    format!("{} h {} min", total / 60, total % 60)
}

/// Wall-clock time of an instant in the provided time zone.
pub fn format_time_of_day<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    time.format("%H:%M:%S").to_string()
}

pub fn format_money(amount: f64) -> String {
    format!("{amount:.2}")
}
