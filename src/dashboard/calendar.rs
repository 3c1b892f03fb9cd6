//! Business-day restriction for dated tables.
//!
//! A business day is Monday to Friday. There is no holiday calendar.

use super::frame::date_values;
use super::schema::DATE;
use crate::error::Result;
use chrono::{Datelike as _, NaiveDate, Weekday};
use polars::prelude::*;

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Monday–Friday days in `[start, end]`; 0 for an inverted range.
pub fn count_business_days(start: NaiveDate, end: NaiveDate) -> usize {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| is_business_day(*d))
        .count()
}

/// Calendar days in `[start, end]`; 0 for an inverted range.
pub fn calendar_days(start: NaiveDate, end: NaiveDate) -> usize {
    usize::try_from((end - start).num_days() + 1).unwrap_or(0)
}

/// Days the mean-per-day KPI divides by.
pub fn days_in_range(start: NaiveDate, end: NaiveDate, business_days_only: bool) -> usize {
    if business_days_only {
        count_business_days(start, end)
    } else {
        calendar_days(start, end)
    }
}

/// Keeps rows whose `date` is a business day inside `[start, end]` when
/// `enabled`; otherwise returns the table unchanged. Null dates are dropped
/// when filtering.
pub fn filter_business_days(
    df: &DataFrame,
    start: NaiveDate,
    end: NaiveDate,
    enabled: bool,
) -> Result<DataFrame> {
    if !enabled {
        return Ok(df.clone());
    }

    let mask: BooleanChunked = date_values(df, DATE)?
        .into_iter()
        .map(|d| d.is_some_and(|d| d >= start && d <= end && is_business_day(d)))
        .collect();
    let filtered = df.filter(&mask)?;

    tracing::debug!(
        before = df.height(),
        after = filtered.height(),
        "Applied business-day filter"
    );
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::frame::date_column;

    fn day(d: u32) -> NaiveDate {
        // March 2024: the 4th is a Monday
        NaiveDate::from_ymd_opt(2024, 3, d).expect("valid date")
    }

    #[test]
    fn test_counts_business_days() {
        assert_eq!(count_business_days(day(4), day(10)), 5);
        assert_eq!(count_business_days(day(9), day(10)), 0);
        assert_eq!(count_business_days(day(10), day(4)), 0);
        assert_eq!(calendar_days(day(4), day(10)), 7);
        assert_eq!(calendar_days(day(10), day(4)), 0);
        assert_eq!(days_in_range(day(4), day(10), true), 5);
    }

    #[test]
    fn test_filter_drops_weekends_and_out_of_range() -> anyhow::Result<()> {
        let dates = [Some(day(1)), Some(day(4)), Some(day(9)), Some(day(11)), None];
        let df = DataFrame::new(vec![date_column(DATE, &dates)?])?;

        let filtered = filter_business_days(&df, day(2), day(10), true)?;
        assert_eq!(date_values(&filtered, DATE)?, vec![Some(day(4))]);

        let untouched = filter_business_days(&df, day(2), day(10), false)?;
        assert_eq!(untouched.height(), 5);
        Ok(())
    }
}
