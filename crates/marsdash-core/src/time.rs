//! Date helpers: inclusive ranges, request date parsing, month ends

use chrono::{Datelike, Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Wire format for every date the dashboard reads or writes
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(rename = "start_date")]
    pub start: NaiveDate,
    #[serde(rename = "end_date")]
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `end < start`
    pub fn new(start: NaiveDate, end: NaiveDate) -> CoreResult<Self> {
        if end < start {
            return Err(CoreError::invalid_range(format!(
                "end date {} is before start date {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse a range from request strings
    pub fn parse(start: &str, end: &str) -> CoreResult<Self> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        *date >= self.start && *date <= self.end
    }

    /// Number of days covered, both ends included
    pub fn len(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Offset of `date` from the start, if inside the range
    pub fn offset_of(&self, date: &NaiveDate) -> Option<usize> {
        if self.contains(date) {
            Some((*date - self.start).num_days() as usize)
        } else {
            None
        }
    }

    /// Every day of the range in ascending order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.len())
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| CoreError::invalid_range(format!("'{}' is not a YYYY-MM-DD date: {}", value, e)))
}

/// Last day of `date`'s month: take the 28th, add four days, step back by
/// the day-of-month of the result.
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    // The 28th exists in every month and +4 always lands in the next one
    let day_28 = date.with_day(28).unwrap_or(date);
    let next_month = day_28 + Days::new(4);
    next_month - Days::new(next_month.day() as u64)
}

/// Tomorrow in local time
pub fn tomorrow() -> NaiveDate {
    Local::now().date_naive() + Days::new(1)
}
