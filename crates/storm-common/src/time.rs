//! SPC date handling and hour-of-day utilities.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{StormError, StormResult};

/// Number of hour bins in a UTC day.
pub const HOURS_PER_DAY: usize = 24;

const SECONDS_PER_HOUR: i64 = 3600;
const SECONDS_PER_DAY: i64 = 86_400;
const SPC_DATE_FORMAT: &str = "%Y%m%d";

/// Ordinal position of a date within the requested range.
pub type DateIndex = usize;

/// A storm-tracking "SPC date" label (`YYYYMMDD`).
///
/// Tracking files are bucketed by SPC date. The label is treated as an
/// opaque ordinal day; consecutive dates are one calendar day apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpcDate(NaiveDate);

impl SpcDate {
    /// Parse a `YYYYMMDD` string.
    pub fn parse(s: &str) -> StormResult<Self> {
        let trimmed = s.trim();
        if trimmed.len() != 8 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(StormError::InvalidDate(s.to_string()));
        }
        NaiveDate::parse_from_str(trimmed, SPC_DATE_FORMAT)
            .map(SpcDate)
            .map_err(|_| StormError::InvalidDate(s.to_string()))
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> StormResult<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(SpcDate)
            .ok_or_else(|| StormError::InvalidDate(format!("{:04}{:02}{:02}", year, month, day)))
    }

    /// The next calendar day.
    pub fn succ(&self) -> Self {
        SpcDate(self.0 + Duration::days(1))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    /// Storage path component (`YYYY/YYYYMMDD`).
    pub fn storage_path(&self) -> String {
        format!("{:04}/{}", self.0.year(), self)
    }
}

impl fmt::Display for SpcDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(SPC_DATE_FORMAT))
    }
}

impl TryFrom<String> for SpcDate {
    type Error = StormError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SpcDate::parse(&value)
    }
}

impl From<SpcDate> for String {
    fn from(date: SpcDate) -> Self {
        date.to_string()
    }
}

/// Inclusive range of SPC dates, indexed by [`DateIndex`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    dates: Vec<SpcDate>,
}

impl DateRange {
    /// All SPC dates from `first` through `last`, inclusive.
    pub fn new(first: SpcDate, last: SpcDate) -> StormResult<Self> {
        if first > last {
            return Err(StormError::InvalidDateRange {
                first: first.to_string(),
                last: last.to_string(),
            });
        }

        let mut dates = Vec::new();
        let mut current = first;
        while current <= last {
            dates.push(current);
            current = current.succ();
        }
        Ok(Self { dates })
    }

    /// Parse both ends from `YYYYMMDD` strings.
    pub fn parse(first: &str, last: &str) -> StormResult<Self> {
        Self::new(SpcDate::parse(first)?, SpcDate::parse(last)?)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn get(&self, index: DateIndex) -> Option<SpcDate> {
        self.dates.get(index).copied()
    }

    pub fn first(&self) -> Option<SpcDate> {
        self.dates.first().copied()
    }

    pub fn last(&self) -> Option<SpcDate> {
        self.dates.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DateIndex, SpcDate)> + '_ {
        self.dates.iter().copied().enumerate()
    }

    pub fn as_slice(&self) -> &[SpcDate] {
        &self.dates
    }
}

/// UTC hour of day (0-23) for a Unix timestamp in seconds.
///
/// Negative timestamps wrap into the previous day.
pub fn utc_hour_of_day(unix_time_sec: i64) -> usize {
    (unix_time_sec.rem_euclid(SECONDS_PER_DAY) / SECONDS_PER_HOUR) as usize
}

/// Encode a storm ID and the hour of a valid time as `"{storm_id}_{HH}"`.
pub fn storm_hour_key(storm_id: &str, unix_time_sec: i64) -> String {
    format!("{}_{:02}", storm_id, utc_hour_of_day(unix_time_sec))
}

/// Parse the hour from a key made by [`storm_hour_key`].
///
/// Only the text after the last underscore is read, so storm IDs that
/// themselves contain underscores still parse.
pub fn parse_hour_key(key: &str) -> StormResult<usize> {
    let (_, hour) = key
        .rsplit_once('_')
        .ok_or_else(|| StormError::InvalidHourKey(key.to_string()))?;
    let hour: usize = hour
        .parse()
        .map_err(|_| StormError::InvalidHourKey(key.to_string()))?;
    if hour >= HOURS_PER_DAY {
        return Err(StormError::InvalidHourKey(key.to_string()));
    }
    Ok(hour)
}

/// Parse many storm-hour keys into hours, preserving order.
pub fn parse_hour_keys<S: AsRef<str>>(keys: &[S]) -> StormResult<Vec<usize>> {
    keys.iter().map(|k| parse_hour_key(k.as_ref())).collect()
}
