//! Timestamp parsing for the relative/partial formats the timeline renders.
//!
//! The mobile site shows post times in six shapes, from "刚刚" (just now)
//! through "n分钟前"/"n小时前" (n minutes/hours ago), "昨天 hh:mm"
//! (yesterday), "mm-dd hh:mm" (current year implied) to a full
//! "yyyy-mm-dd[ hh:mm]". Relative forms are resolved against the wall
//! clock at extraction time and truncated to minute granularity, so the
//! same rendered string parsed later yields a different absolute time.
//! That is inherent to the source format, not something to paper over.

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unrecognized timestamp format: `{0}`")]
    UnrecognizedFormat(String),
    #[error("invalid number in relative timestamp `{input}`")]
    BadNumber { input: String },
    #[error("invalid date/time in `{input}`: {message}")]
    BadDateTime { input: String, message: String },
}

/// Parse a rendered timestamp string against the current local time.
pub fn parse(time_str: &str) -> Result<NaiveDateTime, ParseError> {
    parse_at(time_str, Local::now().naive_local())
}

/// Parse a rendered timestamp string against an explicit "now".
///
/// Split out from [`parse`] so tests control the clock.
pub fn parse_at(time_str: &str, now: NaiveDateTime) -> Result<NaiveDateTime, ParseError> {
    let time_str = time_str.trim();
    let minute_now = truncate_to_minute(now);

    if time_str.contains("刚刚") {
        return Ok(minute_now);
    }
    if let Some(prefix) = time_str.strip_suffix("分钟前") {
        let minutes = parse_delta(prefix, time_str)?;
        return Ok(minute_now - Duration::minutes(minutes));
    }
    if let Some(prefix) = time_str.strip_suffix("小时前") {
        let hours = parse_delta(prefix, time_str)?;
        return Ok(minute_now - Duration::hours(hours));
    }
    if let Some(rest) = time_str.strip_prefix("昨天") {
        let time = NaiveTime::parse_from_str(rest.trim(), "%H:%M").map_err(|e| {
            ParseError::BadDateTime {
                input: time_str.to_string(),
                message: e.to_string(),
            }
        })?;
        return Ok((now.date() - Duration::days(1)).and_time(time));
    }
    // "mm-dd hh:mm": a single dash means the year is implied.
    if time_str.matches('-').count() == 1 {
        let with_year = format!("{}-{}", now.date().year(), time_str);
        return parse_absolute(&with_year, time_str);
    }
    // "yyyy-mm-dd" or "yyyy-mm-dd hh:mm"; a bare date means midnight.
    if time_str.contains(':') {
        parse_absolute(time_str, time_str)
    } else {
        let date = NaiveDate::parse_from_str(time_str, "%Y-%m-%d")
            .map_err(|_| ParseError::UnrecognizedFormat(time_str.to_string()))?;
        Ok(date.and_time(NaiveTime::MIN))
    }
}

fn parse_delta(prefix: &str, input: &str) -> Result<i64, ParseError> {
    prefix.trim().parse().map_err(|_| ParseError::BadNumber {
        input: input.to_string(),
    })
}

fn parse_absolute(s: &str, original: &str) -> Result<NaiveDateTime, ParseError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
        .map_err(|_| ParseError::UnrecognizedFormat(original.to_string()))
}

fn truncate_to_minute(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(14, 37, 42)
            .unwrap()
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn just_now_truncates_to_minute() {
        assert_eq!(parse_at("刚刚", now()).unwrap(), at(2024, 3, 15, 14, 37));
    }

    #[test]
    fn minutes_ago() {
        assert_eq!(
            parse_at("5分钟前", now()).unwrap(),
            at(2024, 3, 15, 14, 32)
        );
    }

    #[test]
    fn hours_ago() {
        assert_eq!(parse_at("3小时前", now()).unwrap(), at(2024, 3, 15, 11, 37));
    }

    #[test]
    fn yesterday_with_time() {
        assert_eq!(
            parse_at("昨天 08:15", now()).unwrap(),
            at(2024, 3, 14, 8, 15)
        );
    }

    #[test]
    fn month_day_assumes_current_year() {
        assert_eq!(
            parse_at("01-05 09:30", now()).unwrap(),
            at(2024, 1, 5, 9, 30)
        );
    }

    #[test]
    fn full_date_with_time() {
        assert_eq!(
            parse_at("2022-11-02 21:00", now()).unwrap(),
            at(2022, 11, 2, 21, 0)
        );
    }

    #[test]
    fn bare_date_is_midnight() {
        assert_eq!(parse_at("2024-01-05", now()).unwrap(), at(2024, 1, 5, 0, 0));
    }

    #[test]
    fn wall_clock_parse_is_close_to_now() {
        let parsed = parse("刚刚").unwrap();
        let delta = Local::now().naive_local() - parsed;
        assert!(delta >= Duration::zero() && delta < Duration::minutes(1) + Duration::seconds(1));
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(matches!(
            parse_at("not a time", now()),
            Err(ParseError::UnrecognizedFormat(_))
        ));
        assert!(matches!(
            parse_at("x分钟前", now()),
            Err(ParseError::BadNumber { .. })
        ));
        assert!(parse_at("昨天 25:99", now()).is_err());
    }
}
