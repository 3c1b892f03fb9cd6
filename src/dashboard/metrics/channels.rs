use super::LEADS;
use crate::dashboard::frame::{date_column, date_values, i64_values, keys_present, str_values};
use crate::dashboard::schema::{DATE, ORIGIN, TOTAL_SERIES};
use crate::error::{Result, ResultExt as _};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeMap;

/// Daily lead counts per channel (`origin`).
///
/// For each date only the `top_n` busiest channels are kept, ties broken by
/// channel name, followed by a [`TOTAL_SERIES`] row carrying that day's total
/// over all channels. Output columns: `date`, `origin`, `leads`.
pub fn leads_time_series(leads: &DataFrame, top_n: usize) -> Result<DataFrame> {
    let counts = leads
        .clone()
        .lazy()
        .filter(keys_present(&[DATE, ORIGIN]))
        .group_by([col(DATE), col(ORIGIN)])
        .agg([len().cast(DataType::Int64).alias(LEADS)])
        .sort(
            [DATE, LEADS, ORIGIN],
            SortMultipleOptions::default().with_order_descending_multi([false, true, false]),
        )
        .collect()
        .context("Failed to count leads per day and channel")?;

    let dates = date_values(&counts, DATE)?;
    let origins = str_values(&counts, ORIGIN)?;
    let totals = i64_values(&counts, LEADS)?;

    let mut per_day: BTreeMap<NaiveDate, Vec<(String, i64)>> = BTreeMap::new();
    for ((date, origin), n) in dates.into_iter().zip(origins).zip(totals) {
        if let (Some(date), Some(origin), Some(n)) = (date, origin, n) {
            per_day.entry(date).or_default().push((origin, n));
        }
    }

    let mut out_dates = Vec::new();
    let mut out_origins = Vec::new();
    let mut out_leads = Vec::new();
    for (date, channels) in per_day {
        let day_total: i64 = channels.iter().map(|(_, n)| n).sum();
        for (origin, n) in channels.into_iter().take(top_n) {
            out_dates.push(Some(date));
            out_origins.push(origin);
            out_leads.push(n);
        }
        out_dates.push(Some(date));
        out_origins.push(TOTAL_SERIES.to_owned());
        out_leads.push(day_total);
    }

    Ok(DataFrame::new(vec![
        date_column(DATE, &out_dates)?,
        Column::new(ORIGIN.into(), out_origins),
        Column::new(LEADS.into(), out_leads),
    ])?)
}
