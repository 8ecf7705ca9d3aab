use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Post;
use crate::error::AppError;

/// A calendar month in UTC, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, AppError> {
        let invalid = || AppError::Validation(format!("Invalid period: {:04}-{:02}", year, month));

        if !(1..=9999).contains(&year) {
            return Err(invalid());
        }

        let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };

        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(invalid)?;
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(invalid)?;

        Ok(Self { start, end })
    }

    /// The period a given instant falls in.
    pub fn containing(at: DateTime<Utc>) -> Self {
        let naive = at.naive_utc();
        let start = naive
            .date()
            .with_day(1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or(naive);
        let (next_year, next_month) = if start.month() == 12 {
            (start.year() + 1, 1)
        } else {
            (start.year(), start.month() + 1)
        };
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or(NaiveDateTime::MAX);
        Self { start, end }
    }

    pub fn year(&self) -> i32 {
        self.start.year()
    }

    pub fn month(&self) -> u32 {
        self.start.month()
    }

    /// Inclusive lower bound.
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Exclusive upper bound.
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let naive = at.naive_utc();
        naive >= self.start && naive < self.end
    }

    /// A period is locked once it has fully elapsed; its winner is final.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        now.naive_utc() >= self.end
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for Period {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::Validation(format!("Period must be YYYY-MM, got '{}'", s));

        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Period::new(year, month)
    }
}

impl TryFrom<String> for Period {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyWinner {
    pub id: i64,
    pub period: Period,
    pub post_id: i64,
    pub vote_count: i64,
    pub computed_at: DateTime<Utc>,
}

impl MonthlyWinner {
    /// Computed after its period closed, so no later vote can change it.
    pub fn is_final(&self) -> bool {
        self.computed_at.naive_utc() >= self.period.end()
    }
}

/// A stored winner joined with its post, as returned to admins.
#[derive(Debug, Clone, Serialize)]
pub struct WinnerOutcome {
    pub period: Period,
    pub post: Post,
    pub vote_count: i64,
    pub computed_at: DateTime<Utc>,
    pub locked: bool,
}
