use std::{fmt::Display, str::FromStr};

use anyhow::{anyhow, Context};
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// A calendar month. Reports and selected days are stored per month, so this is also the unit
/// of most file names in the application directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        // Validates the pair through chrono instead of trusting the range check alone.
        NaiveDate::from_ymd_opt(year, month, 1)?;
        Some(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("YearMonth is validated on construction")
    }

    pub fn last_day(&self) -> NaiveDate {
        (28..=31)
            .rev()
            .find_map(|day| self.day(day))
            .unwrap_or_else(|| self.first_day())
    }

    pub fn length(&self) -> u32 {
        self.last_day().day()
    }

    pub fn day(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    pub fn next(&self) -> Option<Self> {
        self.shift(1)
    }

    pub fn previous(&self) -> Option<Self> {
        self.shift(-1)
    }

    /// Month `months` away from this one, `None` outside of the dates chrono supports.
    pub fn shift(&self, months: i32) -> Option<Self> {
        let index = i64::from(self.year) * 12 + i64::from(self.month) - 1 + i64::from(months);
        let year = i32::try_from(index.div_euclid(12)).ok()?;
        Self::new(year, index.rem_euclid(12) as u32 + 1)
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.first_day()
            .iter_days()
            .take(self.length() as usize)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::from_date(date) == *self
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| anyhow!("Expected month in YYYY-MM format, got {s}"))?;
        let year = year
            .parse::<i32>()
            .with_context(|| format!("Invalid year in {s}"))?;
        let month = month
            .parse::<u32>()
            .with_context(|| format!("Invalid month in {s}"))?;
        YearMonth::new(year, month).ok_or_else(|| anyhow!("{s} is not a valid month"))
    }
}

/// This is the standard way of naming a monthly record file in workhours.
pub fn month_to_record_name(month: YearMonth) -> String {
    month.to_string()
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Iterates months touched by the inclusive date range.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = YearMonth> {
    let last = YearMonth::from_date(end);
    std::iter::successors(Some(YearMonth::from_date(start)), move |month| {
        month.next().filter(|next| *next <= last)
    })
    .take_while(move |month| *month <= last)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{is_weekend, months_between, week_start, YearMonth};

    #[test]
    fn month_lengths() {
        assert_eq!(YearMonth::new(2024, 2).unwrap().length(), 29);
        assert_eq!(YearMonth::new(2025, 2).unwrap().length(), 28);
        assert_eq!(YearMonth::new(2025, 4).unwrap().length(), 30);
        assert_eq!(YearMonth::new(2025, 12).unwrap().length(), 31);
    }

    #[test]
    fn month_navigation_wraps_years() {
        let december = YearMonth::new(2024, 12).unwrap();
        assert_eq!(december.next(), YearMonth::new(2025, 1));
        assert_eq!(december.next().and_then(|m| m.previous()), Some(december));
        assert_eq!(december.shift(-24), YearMonth::new(2022, 12));
        assert_eq!(december.shift(14), YearMonth::new(2026, 2));
    }

    #[test]
    fn navigation_past_supported_dates_is_none() {
        let april = YearMonth::new(2025, 4).unwrap();
        assert_eq!(april.shift(i32::MAX), None);
        assert_eq!(april.shift(i32::MIN), None);
        let last = YearMonth::from_date(chrono::NaiveDate::MAX);
        assert_eq!(last.next(), None);
        assert_eq!(last.last_day(), chrono::NaiveDate::MAX);
    }

    #[test]
    fn month_parsing() {
        assert_eq!(
            "2025-04".parse::<YearMonth>().unwrap(),
            YearMonth::new(2025, 4).unwrap()
        );
        assert!("2025-13".parse::<YearMonth>().is_err());
        assert!("april".parse::<YearMonth>().is_err());
        assert_eq!(YearMonth::new(2025, 4).unwrap().to_string(), "2025-04");
    }

    #[test]
    fn week_starts_on_monday() {
        let sunday = NaiveDate::from_ymd_opt(2025, 4, 6).unwrap();
        assert_eq!(week_start(sunday), NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
        let monday = NaiveDate::from_ymd_opt(2025, 4, 7).unwrap();
        assert_eq!(week_start(monday), monday);
    }

    #[test]
    fn weekend_detection() {
        assert!(is_weekend(NaiveDate::from_ymd_opt(2025, 4, 5).unwrap()));
        assert!(!is_weekend(NaiveDate::from_ymd_opt(2025, 4, 4).unwrap()));
    }

    #[test]
    fn months_between_spans_boundaries() {
        let months = months_between(
            NaiveDate::from_ymd_opt(2024, 12, 30).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
        )
        .collect::<Vec<_>>();
        assert_eq!(
            months,
            vec![
                YearMonth::new(2024, 12).unwrap(),
                YearMonth::new(2025, 1).unwrap()
            ]
        );
    }
}
