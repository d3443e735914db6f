//! Date and time-of-day parsing and rendering.
//!
//! Accepted inputs:
//!
//! - Dates: `YYYY-MM-DD`, only the first 10 characters are considered, so an
//!   ISO timestamp such as `2024-06-10T00:00:00Z` is accepted as its date part.
//! - Times: 12-hour `HH:MM AM/PM` is tried first, then 24-hour `HH:MM`.
//!
//! Rendering always uses the 12-hour clock, e.g. `09:00 AM – 10:00 AM`.

use crate::error::{BookingError, Result};
use chrono::{Days, NaiveDate, NaiveTime};

/// Number of days in a listing window.
pub const WEEK_LENGTH: u64 = 7;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: [&str; 2] = ["%I:%M %p", "%H:%M"];
const DISPLAY_TIME_FORMAT: &str = "%I:%M %p";
const RANGE_SEPARATOR: &str = " \u{2013} ";

/// Parse a calendar date.
///
/// # Errors
///
/// Returns [`BookingError::Validation`] if the input does not start with a
/// valid `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let head = input.char_indices().nth(10).map_or(input, |(end, _)| &input[..end]);
    NaiveDate::parse_from_str(head, DATE_FORMAT).map_err(|_| {
        BookingError::Validation("Invalid date format (expected YYYY-MM-DD)".into())
    })
}

/// Parse a time of day in either supported format; first match wins.
///
/// # Errors
///
/// Returns [`BookingError::Validation`] if neither format matches.
pub fn parse_time(input: &str) -> Result<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(input, format).ok())
        .ok_or_else(|| {
            BookingError::Validation("Invalid time format (use 'HH:MM' or 'HH:MM AM/PM')".into())
        })
}

/// Render `start – end` on the 12-hour clock.
#[must_use]
pub fn format_time_range(start: NaiveTime, end: NaiveTime) -> String {
    format!(
        "{}{RANGE_SEPARATOR}{}",
        start.format(DISPLAY_TIME_FORMAT),
        end.format(DISPLAY_TIME_FORMAT)
    )
}

/// The seven consecutive dates starting at `start`.
///
/// Dates past the end of the calendar are dropped rather than wrapped.
#[must_use]
pub fn week_of(start: NaiveDate) -> Vec<NaiveDate> {
    (0..WEEK_LENGTH)
        .map_while(|offset| start.checked_add_days(Days::new(offset)))
        .collect()
}

/// Last day of the week starting at `start`, inclusive.
#[must_use]
pub fn week_end(start: NaiveDate) -> NaiveDate {
    start
        .checked_add_days(Days::new(WEEK_LENGTH - 1))
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn parse_date_uses_first_ten_characters() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert_eq!(parse_date("2024-06-10").unwrap(), expected);
        assert_eq!(parse_date("2024-06-10T08:30:00.000Z").unwrap(), expected);
    }

    #[test]
    fn parse_date_rejects_garbage() {
        for input in ["", "10/06/2024", "2024-13-01", "tomorrow", "2024-02-30"] {
            assert!(
                matches!(parse_date(input), Err(BookingError::Validation(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn parse_time_accepts_both_clocks() {
        assert_eq!(parse_time("14:00").unwrap(), time(14, 0));
        assert_eq!(parse_time("02:00 PM").unwrap(), time(14, 0));
        assert_eq!(parse_time("12:15 AM").unwrap(), time(0, 15));
        assert_eq!(parse_time("09:30").unwrap(), time(9, 30));
    }

    #[test]
    fn parse_time_rejects_compact_forms() {
        for input in ["2pm", "14", "14:00:00", "25:00", "13:00 PM", ""] {
            assert!(
                matches!(parse_time(input), Err(BookingError::Validation(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn time_range_uses_en_dash_and_twelve_hour_clock() {
        assert_eq!(
            format_time_range(time(9, 0), time(10, 0)),
            "09:00 AM \u{2013} 10:00 AM"
        );
        assert_eq!(
            format_time_range(time(13, 30), time(0, 0)),
            "01:30 PM \u{2013} 12:00 AM"
        );
    }

    #[test]
    fn week_of_spans_seven_ascending_days() {
        let start = NaiveDate::from_ymd_opt(2024, 12, 28).unwrap();
        let week = week_of(start);
        assert_eq!(week.len(), 7);
        assert_eq!(week[0], start);
        assert_eq!(week[6], NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
        assert_eq!(week_end(start), week[6]);
        assert!(week.windows(2).all(|pair| pair[0] < pair[1]));
    }

    proptest! {
        #[test]
        fn twelve_and_twenty_four_hour_inputs_agree(hour in 0u32..24, minute in 0u32..60) {
            let twelve_hour = match hour {
                0 => format!("12:{minute:02} AM"),
                1..=11 => format!("{hour:02}:{minute:02} AM"),
                12 => format!("12:{minute:02} PM"),
                _ => format!("{:02}:{minute:02} PM", hour - 12),
            };
            let twenty_four_hour = format!("{hour:02}:{minute:02}");

            prop_assert_eq!(parse_time(&twelve_hour).unwrap(), time(hour, minute));
            prop_assert_eq!(parse_time(&twenty_four_hour).unwrap(), time(hour, minute));
        }
    }
}
