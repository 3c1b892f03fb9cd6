use super::COUNT;
use crate::dashboard::frame::{date_values, i64_values};
use crate::dashboard::schema::DATE;
use crate::dashboard::types::{CohortEvent, CohortMatrix, CohortRow};
use crate::error::{Result, ResultExt as _};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

const ELAPSED: &str = "elapsed_days";

/// Share of each creation-date cohort that reached `event` after each number
/// of days.
///
/// Cohort size counts every lead created that day. Only cohorts with at least
/// one event appear as rows; cells without events are 0.
pub fn cohort_conversion(leads: &DataFrame, event: CohortEvent) -> Result<CohortMatrix> {
    let event_column = event.column();

    let sizes = leads
        .clone()
        .lazy()
        .filter(col(DATE).is_not_null())
        .group_by([col(DATE)])
        .agg([len().cast(DataType::Int64).alias(COUNT)])
        .collect()
        .context("Failed to size cohorts")?;

    let events = leads
        .clone()
        .lazy()
        .filter(col(DATE).is_not_null().and(col(event_column).is_not_null()))
        .with_column(
            (col(event_column).cast(DataType::Int32).cast(DataType::Int64)
                - col(DATE).cast(DataType::Int32).cast(DataType::Int64))
            .alias(ELAPSED),
        )
        .group_by([col(DATE), col(ELAPSED)])
        .agg([len().cast(DataType::Int64).alias(COUNT)])
        .collect()
        .with_context(|| format!("Failed to count {event} events per cohort"))?;

    let cohort_sizes: BTreeMap<NaiveDate, i64> = date_values(&sizes, DATE)?
        .into_iter()
        .zip(i64_values(&sizes, COUNT)?)
        .filter_map(|(date, n)| Some((date?, n?)))
        .collect();

    let mut cells: BTreeMap<NaiveDate, BTreeMap<i64, i64>> = BTreeMap::new();
    let mut elapsed_days = BTreeSet::new();
    let event_rows = date_values(&events, DATE)?
        .into_iter()
        .zip(i64_values(&events, ELAPSED)?)
        .zip(i64_values(&events, COUNT)?);
    for ((cohort, elapsed), n) in event_rows {
        if let (Some(cohort), Some(elapsed), Some(n)) = (cohort, elapsed, n) {
            elapsed_days.insert(elapsed);
            cells.entry(cohort).or_default().insert(elapsed, n);
        }
    }
    let elapsed_days: Vec<i64> = elapsed_days.into_iter().collect();

    let rows = cells
        .into_iter()
        .rev()
        .map(|(cohort, counts)| {
            let size = cohort_sizes.get(&cohort).copied().unwrap_or(0);
            let rates = elapsed_days
                .iter()
                .map(|days| {
                    let n = counts.get(days).copied().unwrap_or(0);
                    if size > 0 {
                        100.0 * n as f64 / size as f64
                    } else {
                        0.0
                    }
                })
                .collect();
            CohortRow {
                cohort,
                size: usize::try_from(size).unwrap_or(0),
                rates,
            }
        })
        .collect();

    Ok(CohortMatrix {
        event,
        elapsed_days,
        rows,
    })
}
