use super::COUNT;
use crate::dashboard::schema::{DATE, DATE_CONTRACTING, DATE_LOST, DATE_NEGOTIATION, DATE_PAID};
use crate::dashboard::types::FunnelStage;
use crate::error::Result;
use polars::prelude::*;

/// Funnel stages in order, with the date column that marks membership.
pub const FUNNEL_STAGES: [(&str, &str); 5] = [
    ("LEAD", DATE),
    ("NEGOCIAÇÃO", DATE_NEGOTIATION),
    ("CONTRATAÇÃO", DATE_CONTRACTING),
    ("PAGO", DATE_PAID),
    ("PERDA", DATE_LOST),
];

/// Counts every lead that has a timestamp for each stage.
///
/// A lead is counted in every stage it has a date for, so the stages are not
/// exclusive. When the first stage is empty its count is treated as 1 for the
/// `pct_of_first` denominator.
pub fn funnel(leads: &DataFrame) -> Result<Vec<FunnelStage>> {
    let mut counts = Vec::with_capacity(FUNNEL_STAGES.len());
    for (stage, column) in FUNNEL_STAGES {
        let column = leads.column(column)?;
        counts.push((stage, column.len() - column.null_count()));
    }

    let first = counts.first().map_or(0, |(_, n)| *n).max(1) as f64;
    let mut previous: Option<usize> = None;
    let stages = counts
        .into_iter()
        .map(|(stage, count)| {
            let pct_of_previous = previous.map(|prev| {
                if prev > 0 {
                    count as f64 / prev as f64 * 100.0
                } else {
                    0.0
                }
            });
            previous = Some(count);
            FunnelStage {
                stage: stage.to_owned(),
                count,
                pct_of_first: count as f64 / first * 100.0,
                pct_of_previous,
            }
        })
        .collect();
    Ok(stages)
}

/// Columns: `stage`, `count`, `pct_of_first`, `pct_of_previous` (null first).
pub fn funnel_frame(stages: &[FunnelStage]) -> Result<DataFrame> {
    let names: Vec<&str> = stages.iter().map(|s| s.stage.as_str()).collect();
    let counts: Vec<u64> = stages.iter().map(|s| s.count as u64).collect();
    let of_first: Vec<f64> = stages.iter().map(|s| s.pct_of_first).collect();
    let of_previous: Vec<Option<f64>> = stages.iter().map(|s| s.pct_of_previous).collect();

    Ok(DataFrame::new(vec![
        Column::new("stage".into(), names),
        Column::new(COUNT.into(), counts),
        Column::new("pct_of_first".into(), of_first),
        Column::new("pct_of_previous".into(), of_previous),
    ])?)
}
