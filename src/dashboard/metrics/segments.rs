//! Spend joined against leads and revenue per (covenant, product) segment
//! and per channel.

use super::{
    CPL, LEADS, REVENUE, ROI_PCT, SPEND, lead_count_by_segment, paid_leads, revenue_by_segment,
    sorted, spend_by_segment,
};
use crate::dashboard::frame::{full_join, keys_present, row_limit, segment_label};
use crate::dashboard::schema::{
    AMOUNT_SPENT, COMMISSION_PAID, COVENANT_ACRONYM, ORIGIN, PRODUCT, SPEND_CHANNEL,
};
use crate::dashboard::types::SortDirection;
use crate::error::{Result, ResultExt as _};
use polars::prelude::*;

const SEGMENT_KEYS: &[&str] = &[COVENANT_ACRONYM, PRODUCT];

fn zero_filled(names: &[&str]) -> Vec<Expr> {
    names
        .iter()
        .map(|name| col(*name).fill_null(lit(0.0)).alias(*name))
        .collect()
}

fn roi_expr() -> Expr {
    (lit(100.0) * (col(REVENUE) - col(SPEND)) / col(SPEND)).alias(ROI_PCT)
}

/// Spend and paid commission per segment, sorted by revenue, top `top_n`.
///
/// Segments present on only one side appear with 0 on the other.
pub fn spend_vs_revenue_by_segment(
    leads: &DataFrame,
    spend: &DataFrame,
    top_n: usize,
) -> Result<DataFrame> {
    let joined = full_join(
        spend_by_segment(spend),
        revenue_by_segment(leads),
        SEGMENT_KEYS,
    )
    .with_columns(zero_filled(&[SPEND, REVENUE]));

    sorted(joined, REVENUE, SortDirection::Highest)
        .limit(row_limit(top_n))
        .with_column(segment_label(COVENANT_ACRONYM, PRODUCT))
        .collect()
        .context("Failed to join spend and revenue by segment")
}

/// Cost per lead per segment.
///
/// Segments without leads are dropped, and so are segments whose CPL is not
/// positive (no recorded spend).
pub fn cost_per_lead(
    leads: &DataFrame,
    spend: &DataFrame,
    top_n: usize,
    direction: SortDirection,
) -> Result<DataFrame> {
    let joined = full_join(
        spend_by_segment(spend),
        lead_count_by_segment(leads),
        SEGMENT_KEYS,
    )
    .with_columns([
        col(SPEND).fill_null(lit(0.0)).alias(SPEND),
        col(LEADS).fill_null(lit(0i64)).alias(LEADS),
    ])
    .filter(col(LEADS).gt(lit(0i64)))
    .with_column((col(SPEND) / col(LEADS).cast(DataType::Float64)).alias(CPL))
    .filter(col(CPL).gt(lit(0.0)));

    sorted(joined, CPL, direction)
        .limit(row_limit(top_n))
        .with_column(segment_label(COVENANT_ACRONYM, PRODUCT))
        .collect()
        .context("Failed to compute cost per lead")
}

/// ROI% per segment, `100 × (revenue − spend) / spend`, over segments with
/// positive spend.
pub fn roi_by_segment(
    leads: &DataFrame,
    spend: &DataFrame,
    top_n: usize,
    direction: SortDirection,
) -> Result<DataFrame> {
    let joined = full_join(
        spend_by_segment(spend),
        revenue_by_segment(leads),
        SEGMENT_KEYS,
    )
    .with_columns(zero_filled(&[SPEND, REVENUE]))
    .filter(col(SPEND).gt(lit(0.0)))
    .with_column(roi_expr());

    sorted(joined, ROI_PCT, direction)
        .limit(row_limit(top_n))
        .with_column(segment_label(COVENANT_ACRONYM, PRODUCT))
        .collect()
        .context("Failed to compute ROI by segment")
}

/// Spend by `Canal` against paid commission by `origin`, keyed `origin`,
/// restricted to channels with positive spend.
fn channel_spend_and_revenue(leads: &DataFrame, spend: &DataFrame) -> LazyFrame {
    let spend_by_channel = spend
        .clone()
        .lazy()
        .filter(keys_present(&[SPEND_CHANNEL]))
        .group_by_stable([col(SPEND_CHANNEL).alias(ORIGIN)])
        .agg([col(AMOUNT_SPENT).sum().alias(SPEND)]);
    let revenue_by_channel = paid_leads(leads)
        .filter(keys_present(&[ORIGIN]))
        .group_by_stable([col(ORIGIN)])
        .agg([col(COMMISSION_PAID).sum().alias(REVENUE)]);

    full_join(spend_by_channel, revenue_by_channel, &[ORIGIN])
        .with_columns(zero_filled(&[SPEND, REVENUE]))
        .filter(col(SPEND).gt(lit(0.0)))
}

/// Spend and paid commission side by side for every channel that spent.
pub fn spend_vs_revenue_by_channel(leads: &DataFrame, spend: &DataFrame) -> Result<DataFrame> {
    sorted(
        channel_spend_and_revenue(leads, spend),
        SPEND,
        SortDirection::Highest,
    )
    .collect()
    .context("Failed to join spend and revenue by channel")
}

/// ROI% per channel, all channels with positive spend, best first.
pub fn roi_by_channel(leads: &DataFrame, spend: &DataFrame) -> Result<DataFrame> {
    sorted(
        channel_spend_and_revenue(leads, spend).with_column(roi_expr()),
        ROI_PCT,
        SortDirection::Highest,
    )
    .collect()
    .context("Failed to compute ROI by channel")
}
