use std::fmt::Display;

use anyhow::Result;
use chrono::{DateTime, Months, NaiveDate, TimeZone};
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

/// Which days the graph and the summary cover. By default everything since the month of the first
/// record.
#[derive(Debug, Clone, clap::Args)]
pub struct RangeArgs {
    #[arg(
        long = "start",
        short,
        help = "First shown day. Examples are \"yesterday\", \"3 weeks ago\", \"15/03/2025\""
    )]
    start_date: Option<String>,
    #[arg(
        long,
        conflicts_with = "start_date",
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Show only the last N months, including the current one"
    )]
    months: Option<u32>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

impl RangeArgs {
    /// Resolves the first shown day relative to `now`. None leaves the choice to the log.
    pub fn parse_start<Tz: TimeZone>(&self, now: DateTime<Tz>) -> Result<Option<NaiveDate>>
    where
        Tz::Offset: Copy,
    {
        if let Some(months) = self.months {
            let start = now
                .beginning_of_month()
                .date_naive()
                .checked_sub_months(Months::new(months - 1));
            return match start {
                Some(v) => Ok(Some(v)),
                None => Err(validation_error(format!("Can't go {months} months back"))),
            };
        }

        match &self.start_date {
            Some(s) => match parse_date_string(s, now, self.date_style.into()) {
                Ok(v) => Ok(Some(v.date_naive())),
                Err(e) => Err(validation_error(format!("Failed to validate start date {e}"))),
            },
            None => Ok(None),
        }
    }
}

fn validation_error(message: String) -> anyhow::Error {
    Args::command()
        .error(clap::error::ErrorKind::ValueValidation, message)
        .into()
}
