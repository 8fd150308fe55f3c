use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, Month, OffsetDateTime};

use crate::ValidationError;

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Calendar date serialized as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IsoDate(Date);

impl IsoDate {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Self::parse_field("date", input)
    }

    /// Parses `input`, naming `field` in the error.
    pub fn parse_field(field: &str, input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        // Upstreams sometimes append a time component.
        let date_part = trimmed.get(..10).unwrap_or(trimmed);
        Date::parse(date_part, ISO_DATE)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                field: field.to_owned(),
                value: input.to_owned(),
            })
    }

    pub fn from_ymd(year: i32, month: u8, day: u8) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidDate {
            field: String::from("date"),
            value: format!("{year:04}-{month:02}-{day:02}"),
        };
        let month = Month::try_from(month).map_err(|_| invalid())?;
        Date::from_calendar_date(year, month, day)
            .map(Self)
            .map_err(|_| invalid())
    }

    pub fn today() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    pub const fn from_date(date: Date) -> Self {
        Self(date)
    }

    pub const fn into_inner(self) -> Date {
        self.0
    }

    pub fn checked_add_days(self, days: i64) -> Option<Self> {
        self.0.checked_add(Duration::days(days)).map(Self)
    }

    pub fn next_day(self) -> Option<Self> {
        self.0.next_day().map(Self)
    }

    /// Inclusive number of days between `self` and `end`.
    pub fn days_until(self, end: Self) -> i64 {
        (end.0 - self.0).whole_days() + 1
    }
}

impl Display for IsoDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

impl TryFrom<String> for IsoDate {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<IsoDate> for String {
    fn from(value: IsoDate) -> Self {
        value.to_string()
    }
}

/// Checks that an optional `start`/`end` pair is ordered.
pub fn ensure_date_range(
    start: Option<IsoDate>,
    end: Option<IsoDate>,
) -> Result<(), ValidationError> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(ValidationError::InvalidDateRange {
            start: start.to_string(),
            end: end.to_string(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates_and_trims_time_component() {
        let date = IsoDate::parse("2024-03-15 16:00:00").expect("date should parse");
        assert_eq!(date.to_string(), "2024-03-15");
    }

    #[test]
    fn rejects_non_iso_input_naming_the_field() {
        let err = IsoDate::parse_field("start_date", "03/15/2024").expect_err("must fail");
        assert_eq!(
            err,
            ValidationError::InvalidDate {
                field: String::from("start_date"),
                value: String::from("03/15/2024"),
            }
        );
    }

    #[test]
    fn inclusive_day_count() {
        let start = IsoDate::from_ymd(2024, 1, 30).expect("valid");
        let end = IsoDate::from_ymd(2024, 2, 2).expect("valid");
        assert_eq!(start.days_until(end), 4);
        assert_eq!(start.checked_add_days(3), Some(end));
    }

    #[test]
    fn range_must_be_ordered() {
        let early = IsoDate::from_ymd(2024, 1, 1).ok();
        let late = IsoDate::from_ymd(2024, 1, 2).ok();
        assert!(ensure_date_range(early, late).is_ok());
        assert!(ensure_date_range(late, early).is_err());
        assert!(ensure_date_range(None, early).is_ok());
    }
}
