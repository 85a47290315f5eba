//! UTC calendar helpers shared by the time buckets and the reports.
//!
//! All frame timestamps are seconds since the Unix epoch and are always
//! decomposed in UTC.
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use super::error::CalendarError;

/// Convert epoch seconds into a UTC date-time
pub fn utc(timestamp_s: i64) -> Result<OffsetDateTime, CalendarError> {
    Ok(OffsetDateTime::from_unix_timestamp(timestamp_s)?)
}

/// `YYYY-MM`
pub fn month_label(timestamp_s: i64) -> Result<String, CalendarError> {
    Ok(utc(timestamp_s)?.format(format_description!("[year]-[month]"))?)
}

/// `YYYY-MM-DD`
pub fn day_label(timestamp_s: i64) -> Result<String, CalendarError> {
    Ok(utc(timestamp_s)?.format(format_description!("[year]-[month]-[day]"))?)
}

/// `YYYY-MM-DD-HHMMSS`, the Pixelman style timestamp used for hour names,
/// month boundary labels and summary file names.
pub fn timestamp_label(timestamp_s: i64) -> Result<String, CalendarError> {
    Ok(utc(timestamp_s)?.format(format_description!(
        "[year]-[month]-[day]-[hour][minute][second]"
    ))?)
}

/// Parse a `YYYY-MM-DD-HHMMSS` label as a UTC instant
pub fn parse_timestamp_label(label: &str) -> Result<i64, CalendarError> {
    let datetime = PrimitiveDateTime::parse(
        label,
        format_description!("[year]-[month]-[day]-[hour][minute][second]"),
    )?;
    Ok(datetime.assume_utc().unix_timestamp())
}

/// Parse a `YYYY-MM-DD` day and return its UTC midnight
pub fn parse_day(day: &str) -> Result<i64, CalendarError> {
    let date = Date::parse(day, format_description!("[year]-[month]-[day]"))?;
    Ok(date.midnight().assume_utc().unix_timestamp())
}

/// Caption for a `YYYY-MM` month id, i.e. `January 2012`
pub fn month_caption(month_id: &str) -> Result<String, CalendarError> {
    let date = Date::parse(
        &format!("{month_id}-01"),
        format_description!("[year]-[month]-[day]"),
    )?;
    Ok(format!("{} {}", date.month(), date.year()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let t = 1325376000 + 3661;
        assert_eq!(month_label(t).unwrap(), "2012-01");
        assert_eq!(day_label(t).unwrap(), "2012-01-01");
        assert_eq!(timestamp_label(t).unwrap(), "2012-01-01-010101");
    }

    #[test]
    fn test_parsing() {
        assert_eq!(parse_day("2012-01-01").unwrap(), 1325376000);
        assert_eq!(
            parse_timestamp_label("2012-02-01-000000").unwrap(),
            1328054400
        );
        assert!(parse_day("2012-13-01").is_err());
    }

    #[test]
    fn test_month_caption() {
        assert_eq!(month_caption("2012-03").unwrap(), "March 2012");
    }
}
