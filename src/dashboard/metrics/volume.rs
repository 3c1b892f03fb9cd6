use super::LEADS;
use crate::dashboard::frame::{key_exprs, keys_present, row_limit};
use crate::dashboard::schema::{COVENANT_ACRONYM, PRODUCT};
use crate::dashboard::types::SortDirection;
use crate::error::{Result, ResultExt as _};
use polars::prelude::*;

pub const COVENANT_TOTAL: &str = "covenant_total";
pub const RANK: &str = "rank";

/// Lead counts per covenant broken down by product, for the `top_n` covenants
/// at the requested end of the ranking.
///
/// Rows come grouped by covenant in ranking order (`rank` 0 first), largest
/// product first inside each covenant. A ranked covenant with no product
/// recorded keeps one row with null `product` and `leads`.
pub fn lead_volume_by_covenant(
    leads: &DataFrame,
    top_n: usize,
    direction: SortDirection,
) -> Result<DataFrame> {
    let ranking = leads
        .clone()
        .lazy()
        .filter(keys_present(&[COVENANT_ACRONYM]))
        .group_by_stable([col(COVENANT_ACRONYM)])
        .agg([len().cast(DataType::Int64).alias(COVENANT_TOTAL)])
        .filter(col(COVENANT_TOTAL).gt(lit(0i64)))
        .sort(
            [COVENANT_TOTAL, COVENANT_ACRONYM],
            SortMultipleOptions::default()
                .with_order_descending_multi([direction.descending(), false]),
        )
        .limit(row_limit(top_n))
        .with_row_index(RANK, None);

    let breakdown = leads
        .clone()
        .lazy()
        .filter(keys_present(&[COVENANT_ACRONYM, PRODUCT]))
        .group_by_stable(key_exprs(&[COVENANT_ACRONYM, PRODUCT]))
        .agg([len().cast(DataType::Int64).alias(LEADS)]);

    ranking
        .join(
            breakdown,
            [col(COVENANT_ACRONYM)],
            [col(COVENANT_ACRONYM)],
            JoinArgs::new(JoinType::Left),
        )
        .sort(
            [RANK, LEADS, PRODUCT],
            SortMultipleOptions::default()
                .with_order_descending_multi([false, true, false])
                .with_nulls_last(true),
        )
        .select([
            col(RANK),
            col(COVENANT_ACRONYM),
            col(PRODUCT),
            col(LEADS),
            col(COVENANT_TOTAL),
        ])
        .collect()
        .context("Failed to rank lead volume by covenant")
}
