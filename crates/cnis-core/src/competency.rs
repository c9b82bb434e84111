use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A literal token that could not be read as a calendar value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid month/year token: {0:?}")]
    Competency(String),
    #[error("invalid date token: {0:?}")]
    Date(String),
}

/// A calendar month/year ("competência") used to index salary contributions.
///
/// Renders as `MM/YYYY`. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Competency {
    // Field order matters: derived `Ord` compares year first.
    year: i32,
    month: u32,
}

impl Competency {
    /// Returns `None` when `month` is outside `1..=12`.
    pub fn new(month: u32, year: i32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// The following month. December wraps to January of the next year.
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for Competency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:04}", self.month, self.year)
    }
}

/// Parses exactly `MM/YYYY`. Anything else is rejected, never repaired.
impl FromStr for Competency {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || TokenError::Competency(s.to_string());
        let (month, year) = s.split_once('/').ok_or_else(err)?;
        if month.len() != 2 || year.len() != 4 || !all_digits(month) || !all_digits(year) {
            return Err(err());
        }
        let month: u32 = month.parse().map_err(|_| err())?;
        let year: i32 = year.parse().map_err(|_| err())?;
        Competency::new(month, year).ok_or_else(err)
    }
}

impl Serialize for Competency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Competency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A full day/month/year date as printed on the statement (`DD/MM/YYYY`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CnisDate(NaiveDate);

impl CnisDate {
    /// Returns `None` for dates that do not exist on the calendar (e.g. 31/02).
    pub fn new(day: u32, month: u32, year: i32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(CnisDate)
    }

    pub fn competency(&self) -> Competency {
        Competency {
            year: self.0.year(),
            month: self.0.month(),
        }
    }
}

impl fmt::Display for CnisDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}/{:02}/{:04}",
            self.0.day(),
            self.0.month(),
            self.0.year()
        )
    }
}

/// Parses exactly `DD/MM/YYYY` and checks the date exists.
impl FromStr for CnisDate {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || TokenError::Date(s.to_string());
        let mut parts = s.split('/');
        let (Some(day), Some(month), Some(year), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(err());
        };
        if day.len() != 2
            || month.len() != 2
            || year.len() != 4
            || !all_digits(day)
            || !all_digits(month)
            || !all_digits(year)
        {
            return Err(err());
        }
        let day: u32 = day.parse().map_err(|_| err())?;
        let month: u32 = month.parse().map_err(|_| err())?;
        let year: i32 = year.parse().map_err(|_| err())?;
        CnisDate::new(day, month, year).ok_or_else(err)
    }
}

impl Serialize for CnisDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CnisDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
