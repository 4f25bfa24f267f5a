//! Window tokens: `"2h"`, `"7d"`, `"1w"`.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::error::RangeParseError;

pub const DEFAULT_TOKEN: &str = "2h";

/// A resolved `(start, now)` pair. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub now: NaiveDateTime,
}

impl TimeWindow {
    fn spanning(now: NaiveDateTime, span: Duration) -> Option<Self> {
        now.checked_sub_signed(span).map(|start| Self { start, now })
    }

    pub fn default_at(now: NaiveDateTime) -> Self {
        Self {
            start: now - Duration::hours(2),
            now,
        }
    }
}

/// Strict resolution.
///
/// An unknown or missing unit suffix yields the 2-hour default. A
/// recognised unit with a count that is not a non-negative base-10 integer
/// is an error.
pub fn resolve(token: &str, now: NaiveDateTime) -> Result<TimeWindow, RangeParseError> {
    let Some(unit) = token.chars().last() else {
        return Ok(TimeWindow::default_at(now));
    };
    let per_unit: fn(i64) -> Option<Duration> = match unit {
        'h' => Duration::try_hours,
        'd' => Duration::try_days,
        'w' => Duration::try_weeks,
        _ => return Ok(TimeWindow::default_at(now)),
    };

    let digits = &token[..token.len() - unit.len_utf8()];
    let count: i64 = digits
        .parse()
        .map_err(|_| RangeParseError::Malformed(digits.to_string()))?;
    if count < 0 {
        return Err(RangeParseError::Negative(count));
    }

    per_unit(count)
        .and_then(|span| TimeWindow::spanning(now, span))
        .ok_or_else(|| RangeParseError::Overflow(token.to_string()))
}

/// Resolution used by the query boundary: every parse failure falls back
/// to the 2-hour default, same as an unrecognised unit.
pub fn resolve_or_default(token: &str, now: NaiveDateTime) -> TimeWindow {
    match resolve(token, now) {
        Ok(window) => window,
        Err(e) => {
            tracing::warn!(token, error = %e, "unusable window token, using {DEFAULT_TOKEN}");
            TimeWindow::default_at(now)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap()
    }

    #[test]
    fn resolves_each_unit() {
        assert_eq!(resolve("2h", t()).unwrap().start, t() - Duration::hours(2));
        assert_eq!(resolve("3d", t()).unwrap().start, t() - Duration::days(3));
        assert_eq!(resolve("1w", t()).unwrap().start, t() - Duration::days(7));
        assert_eq!(resolve("3d", t()).unwrap().now, t());
    }

    #[test]
    fn unknown_or_missing_unit_defaults() {
        let default = t() - Duration::hours(2);
        assert_eq!(resolve("xyz", t()).unwrap().start, default);
        assert_eq!(resolve("15m", t()).unwrap().start, default);
        assert_eq!(resolve("", t()).unwrap().start, default);
        assert_eq!(resolve("12", t()).unwrap().start, default);
    }

    #[test]
    fn zero_count_is_an_empty_window() {
        assert_eq!(resolve("0d", t()).unwrap().start, t());
    }

    #[test]
    fn malformed_count_is_an_error() {
        assert_eq!(
            resolve("abch", t()),
            Err(RangeParseError::Malformed("abc".into()))
        );
        assert_eq!(resolve("h", t()), Err(RangeParseError::Malformed(String::new())));
        assert_eq!(
            resolve("1.5d", t()),
            Err(RangeParseError::Malformed("1.5".into()))
        );
    }

    #[test]
    fn negative_count_is_rejected() {
        assert_eq!(resolve("-3d", t()), Err(RangeParseError::Negative(-3)));
    }

    #[test]
    fn huge_count_overflows() {
        assert!(matches!(
            resolve("99999999999999w", t()),
            Err(RangeParseError::Overflow(_))
        ));
    }

    #[test]
    fn hardened_resolution_falls_back() {
        let default = t() - Duration::hours(2);
        assert_eq!(resolve_or_default("abch", t()).start, default);
        assert_eq!(resolve_or_default("-1w", t()).start, default);
        assert_eq!(resolve_or_default("1w", t()).start, t() - Duration::weeks(1));
    }
}
