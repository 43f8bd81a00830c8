//! Calendar-month arithmetic in UTC.
//!
//! All month timestamps in actgen are the first instant of a calendar month.

use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, Months, NaiveDate, TimeZone, Utc};

/// First instant of the month containing `t`.
#[must_use]
pub fn start_of_month(t: DateTime<Utc>) -> DateTime<Utc> {
    let first = NaiveDate::from_ymd_opt(t.year(), t.month(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0));
    match first {
        Some(naive) => Utc.from_utc_datetime(&naive),
        // Day 1 of a month that `t` already lies in always exists.
        None => t,
    }
}

/// Start of the month `months_ago` months before the month containing `now`.
pub fn start_of_months_ago(months_ago: u32, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    start_of_month(now)
        .checked_sub_months(Months::new(months_ago))
        .ok_or(Error::Timestamp { months_ago, now })
}

/// Last representable second of the month containing `t`.
pub fn end_of_month(t: DateTime<Utc>) -> Result<DateTime<Utc>> {
    start_of_month(t)
        .checked_add_months(Months::new(1))
        .map(|next| next - chrono::Duration::seconds(1))
        .ok_or(Error::Timestamp {
            months_ago: 0,
            now: t,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 17, 42).unwrap()
    }

    #[test]
    fn start_of_month_truncates() {
        assert_eq!(start_of_month(at(2024, 2, 29, 23)).to_rfc3339(), "2024-02-01T00:00:00+00:00");
    }

    #[test]
    fn months_ago_crosses_years() {
        let now = at(2024, 2, 10, 5);
        let t = start_of_months_ago(3, now).unwrap();
        assert_eq!(t.to_rfc3339(), "2023-11-01T00:00:00+00:00");
        assert_eq!(start_of_months_ago(0, now).unwrap(), start_of_month(now));
    }

    #[test]
    fn end_of_month_handles_leap_years() {
        let e = end_of_month(at(2024, 2, 3, 0)).unwrap();
        assert_eq!(e.to_rfc3339(), "2024-02-29T23:59:59+00:00");
        let e = end_of_month(at(2023, 12, 31, 0)).unwrap();
        assert_eq!(e.to_rfc3339(), "2023-12-31T23:59:59+00:00");
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn months_ago_is_start_of_month(
            y in 1990i32..2100,
            m in 1u32..=12,
            d in 1u32..=28,
            back in 0u32..240,
        ) {
            let now = at(y, m, d, 12);
            let t = start_of_months_ago(back, now).unwrap();
            prop_assert_eq!(t.day(), 1);
            prop_assert_eq!(start_of_month(t), t);
            let months = (now.year() - t.year()) * 12 + now.month() as i32 - t.month() as i32;
            prop_assert_eq!(months, back as i32);
        }
    }
}
