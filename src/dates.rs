//! Parsing of date values found in statements.

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DateError {
    #[error("date {value:?} matches neither RFC 3339 nor format {format:?}")]
    Unparseable { value: String, format: String },
    #[error("ambiguous combination of date time {datetime} and timezone {timezone}")]
    AmbiguousTime {
        datetime: NaiveDateTime,
        timezone: &'static str,
    },
    #[error("nonexistent combination of date time {datetime} and timezone {timezone}")]
    NonexistentTime {
        datetime: NaiveDateTime,
        timezone: &'static str,
    },
}

/// Parses `value` as an RFC 3339 timestamp, or else as a local date time or
/// date in `format` (dates are taken at midnight) within `tz`.
pub fn parse(value: &str, format: &str, tz: Tz) -> Result<DateTime<FixedOffset>, DateError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt);
    }
    let naive = NaiveDateTime::parse_from_str(value, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| DateError::Unparseable {
            value: value.to_string(),
            format: format.to_string(),
        })?;
    localize(naive, tz)
}

fn localize(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<FixedOffset>, DateError> {
    match tz.from_local_datetime(&naive) {
        LocalResult::None => Err(DateError::NonexistentTime {
            datetime: naive,
            timezone: tz.name(),
        }),
        LocalResult::Ambiguous(_, _) => Err(DateError::AmbiguousTime {
            datetime: naive,
            timezone: tz.name(),
        }),
        LocalResult::Single(dt) => Ok(dt.with_timezone(&dt.offset().fix())),
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("2024-03-01T00:00:00+00:00", "%Y-%m-%d", Tz::UTC => Ok("2024-03-01T00:00:00+00:00".to_string()) ; "rfc3339 ignores format")]
    #[test_case("2024-03-01", "%Y-%m-%d", Tz::UTC => Ok("2024-03-01T00:00:00+00:00".to_string()))]
    #[test_case("01-03-2024", "%d-%m-%Y", Tz::Europe__Amsterdam => Ok("2024-03-01T00:00:00+01:00".to_string()))]
    #[test_case("20240701", "%Y%m%d", Tz::Europe__Amsterdam => Ok("2024-07-01T00:00:00+02:00".to_string()) ; "summer time")]
    #[test_case("2024-03-01 13:45", "%Y-%m-%d %H:%M", Tz::UTC => Ok("2024-03-01T13:45:00+00:00".to_string()) ; "with time")]
    #[test_case("2024-03-31 02:30", "%Y-%m-%d %H:%M", Tz::Europe__Amsterdam => Err(DateError::NonexistentTime {
        datetime: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap().and_hms_opt(2, 30, 0).unwrap(),
        timezone: "Europe/Amsterdam",
    }) ; "skipped hour")]
    #[test_case("yesterday", "%Y-%m-%d", Tz::UTC => Err(DateError::Unparseable {
        value: "yesterday".to_string(),
        format: "%Y-%m-%d".to_string(),
    }))]
    fn parse_dates(value: &str, format: &str, tz: Tz) -> Result<String, DateError> {
        parse(value, format, tz).map(|dt| dt.to_rfc3339())
    }

    #[test]
    fn ambiguous_time() {
        let got = parse("2024-10-27 02:30", "%Y-%m-%d %H:%M", Tz::Europe__Amsterdam);
        assert!(matches!(got, Err(DateError::AmbiguousTime { .. })), "got {:?}", got);
    }
}
