//! Small helpers for moving values between Polars columns and Rust.

use crate::error::{LeadlensError, Result};
use chrono::{Datelike as _, NaiveDate};
use polars::prelude::*;

/// `NaiveDate::num_days_from_ce` of 1970-01-01, the epoch Polars counts `Date` from.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(EPOCH_DAYS_FROM_CE)?)
}

/// Builds a `Date` column from optional calendar dates.
pub fn date_column(name: &str, values: &[Option<NaiveDate>]) -> Result<Column> {
    let days: Vec<Option<i32>> = values.iter().map(|d| d.map(date_to_days)).collect();
    let series = Series::new(name.into(), days).cast(&DataType::Date)?;
    Ok(Column::from(series))
}

pub fn date_values(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDate>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Int32)?;
    Ok(series
        .i32()?
        .into_iter()
        .map(|d| d.and_then(days_to_date))
        .collect())
}

pub fn str_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_owned))
        .collect())
}

pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

pub fn i64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    Ok(series.i64()?.into_iter().collect())
}

/// Maps every value of a string column through `f`, keeping nulls as nulls.
pub fn map_str_column<F>(df: &DataFrame, name: &str, target: &str, f: F) -> Result<Column>
where
    F: Fn(&str) -> Option<String>,
{
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let mapped: StringChunked = series
        .str()?
        .into_iter()
        .map(|v| v.and_then(&f))
        .collect();
    Ok(Column::from(mapped.into_series().with_name(target.into())))
}

pub fn require_columns(df: &DataFrame, table: &str, required: &[&str]) -> Result<()> {
    let present = df.get_column_names();
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !present.iter().any(|p| p.as_str() == **name))
        .map(|name| (*name).to_owned())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(LeadlensError::MissingColumns {
            table: table.to_owned(),
            columns: missing,
        })
    }
}

/// Rows where every key column is non-null. Grouping drops null keys, matching
/// how the exports were always aggregated.
pub fn keys_present(keys: &[&str]) -> Expr {
    keys.iter()
        .fold(lit(true), |acc, key| acc.and(col(*key).is_not_null()))
}

pub fn key_exprs(keys: &[&str]) -> Vec<Expr> {
    keys.iter().map(|key| col(*key)).collect()
}

/// Outer join on identically named keys, keys coalesced into one column.
pub fn full_join(left: LazyFrame, right: LazyFrame, keys: &[&str]) -> LazyFrame {
    left.join(
        right,
        key_exprs(keys),
        key_exprs(keys),
        JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns),
    )
}

/// `"<covenant> - <product>"`, the label every segment chart uses.
pub fn segment_label(covenant: &str, product: &str) -> Expr {
    concat_str([col(covenant), lit(" - "), col(product)], "", false).alias("segment")
}

pub fn row_limit(top_n: usize) -> IdxSize {
    IdxSize::try_from(top_n).unwrap_or(IdxSize::MAX)
}

/// `numerator / denominator`, or 0 when the denominator is not positive.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 && numerator.is_finite() && denominator.is_finite() {
        numerator / denominator
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_round_trip() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid date");
        assert_eq!(date_to_days(epoch), 0);
        let d = NaiveDate::from_ymd_opt(2024, 3, 4).expect("valid date");
        assert_eq!(days_to_date(date_to_days(d)), Some(d));
    }

    #[test]
    fn test_date_column_keeps_nulls() -> anyhow::Result<()> {
        let d = NaiveDate::from_ymd_opt(2024, 3, 4);
        let column = date_column("date", &[d, None])?;
        assert_eq!(column.dtype(), &DataType::Date);
        assert_eq!(column.null_count(), 1);

        let df = DataFrame::new(vec![column])?;
        assert_eq!(date_values(&df, "date")?, vec![d, None]);
        Ok(())
    }

    #[test]
    fn test_require_columns_lists_missing() -> anyhow::Result<()> {
        let df = df!["a" => [1i64], "b" => [2i64]]?;
        assert!(require_columns(&df, "t", &["a", "b"]).is_ok());

        let err = require_columns(&df, "t", &["a", "c", "d"]).expect_err("c and d missing");
        match err {
            LeadlensError::MissingColumns { table, columns } => {
                assert_eq!(table, "t");
                assert_eq!(columns, vec!["c".to_owned(), "d".to_owned()]);
            }
            other => panic!("unexpected error {other}"),
        }
        Ok(())
    }

    #[test]
    fn test_ratio_guards_denominator() {
        assert_eq!(ratio(150.0, 100.0), 1.5);
        assert_eq!(ratio(1.0, 0.0), 0.0);
        assert_eq!(ratio(1.0, -3.0), 0.0);
        assert_eq!(ratio(f64::NAN, 2.0), 0.0);
    }
}
