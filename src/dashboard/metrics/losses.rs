use super::COUNT;
use crate::dashboard::schema::{DATE_CONTRACTING, DATE_LOST, DATE_NEGOTIATION, DATE_PAID};
use crate::error::{Result, ResultExt as _};
use polars::prelude::*;

pub const LOSS_STAGE: &str = "loss_stage";

/// Stage each lost lead left the funnel from, counted and sorted by count.
///
/// Only timestamp presence is checked: a lost lead without a negotiation date
/// was lost at LEAD, one without a contracting date at NEGOCIAÇÃO, one
/// without a paid date at CONTRATAÇÃO, and any other at PAGO.
pub fn loss_attribution(leads: &DataFrame) -> Result<DataFrame> {
    let stage = when(col(DATE_NEGOTIATION).is_null())
        .then(lit("LEAD"))
        .when(col(DATE_CONTRACTING).is_null())
        .then(lit("NEGOCIAÇÃO"))
        .when(col(DATE_PAID).is_null())
        .then(lit("CONTRATAÇÃO"))
        .otherwise(lit("PAGO"))
        .alias(LOSS_STAGE);

    leads
        .clone()
        .lazy()
        .filter(col(DATE_LOST).is_not_null())
        .select([stage])
        .group_by_stable([col(LOSS_STAGE)])
        .agg([len().cast(DataType::Int64).alias(COUNT)])
        .sort(
            [COUNT],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .collect()
        .context("Failed to attribute losses")
}
