use std::fmt::Display;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, ValueEnum};
use now::DateTimeNow;

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

pub const DATE_HELP: &str = "Day to look at. Examples are \"yesterday\", \"last monday\", \"15/03/2025\". Today by default";

pub const DATE_STYLE_HELP: &str =
    "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year";

/// Turns user input into a local calendar day. Missing input means the day of `now`.
pub fn parse_day(
    expression: Option<&str>,
    style: DateStyle,
    now: DateTime<Local>,
) -> Result<NaiveDate> {
    let Some(expression) = expression else {
        return Ok(now.date_naive());
    };
    match parse_date_string(expression, now.beginning_of_day(), style.into()) {
        Ok(v) => Ok(v.with_timezone(&Local).date_naive()),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {expression}: {e}"),
            )
            .into()),
    }
}
