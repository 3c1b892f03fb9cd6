use super::{LEADS, ROI_PCT, SEGMENT, SPEND, sorted};
use crate::dashboard::cleaning::unit_cost_expr;
use crate::dashboard::frame::{key_exprs, keys_present, row_limit, segment_label};
use crate::dashboard::schema::{
    COMMISSION_PAID, COVENANT_ACRONYM, ORIGIN, PRODUCT, SPEND_CHANNEL, SPEND_COVENANT,
    SPEND_PRODUCT, SPEND_QUANTITY, UnitCostTable,
};
use crate::dashboard::types::SortDirection;
use crate::error::{Result, ResultExt as _};
use polars::prelude::*;

pub const SENDS: &str = "sends";
pub const CONVERSION_PCT: &str = "conversion_pct";
pub const MEDIAN_CONVERSION_PCT: &str = "median_conversion_pct";
pub const MEAN_CONVERSION_PCT: &str = "mean_conversion_pct";
pub const LEADS_PER_10K: &str = "leads_per_10k";
pub const COMMISSION: &str = "commission";

const KEYS: &[&str] = &[COVENANT_ACRONYM, PRODUCT, ORIGIN];

/// Estimated leads per 10 000 sends for each (covenant, product, channel).
///
/// Sends and generated leads are inner joined, so only segments present on
/// both sides are reported. The estimate is the median conversion × 100.
/// Commission sums every stage, not only `PAGO`. Spend is priced with
/// `sends_costs` and is null for channels it does not list; ROI is then 0.
pub fn leads_per_10k_sends(
    leads: &DataFrame,
    spend: &DataFrame,
    sends_costs: &UnitCostTable,
    top_n: usize,
    direction: SortDirection,
) -> Result<DataFrame> {
    let sends = spend
        .clone()
        .lazy()
        .filter(keys_present(&[SPEND_COVENANT, SPEND_PRODUCT, SPEND_CHANNEL]))
        .group_by_stable([
            col(SPEND_COVENANT).alias(COVENANT_ACRONYM),
            col(SPEND_PRODUCT).alias(PRODUCT),
            col(SPEND_CHANNEL).alias(ORIGIN),
        ])
        .agg([col(SPEND_QUANTITY).sum().alias(SENDS)]);

    let generated = leads
        .clone()
        .lazy()
        .filter(keys_present(KEYS))
        .group_by_stable(key_exprs(KEYS))
        .agg([
            len().cast(DataType::Int64).alias(LEADS),
            col(COMMISSION_PAID).sum().alias(COMMISSION),
        ]);

    let conversion = when(col(SENDS).gt(lit(0.0)))
        .then(lit(100.0) * col(LEADS).cast(DataType::Float64) / col(SENDS))
        .otherwise(lit(0.0))
        .alias(CONVERSION_PCT);

    let spend_expr = (unit_cost_expr(col(ORIGIN), sends_costs) * col(SENDS)).round(2);
    let roi = when(col(SPEND).is_not_null().and(col(SPEND).gt(lit(0.0))))
        .then(lit(100.0) * col(COMMISSION) / col(SPEND))
        .otherwise(lit(0.0))
        .alias(ROI_PCT);

    let table = sends
        .join(
            generated,
            key_exprs(KEYS),
            key_exprs(KEYS),
            JoinArgs::new(JoinType::Inner),
        )
        .with_column(conversion)
        .group_by_stable(key_exprs(KEYS))
        .agg([
            col(CONVERSION_PCT).median().alias(MEDIAN_CONVERSION_PCT),
            col(CONVERSION_PCT).mean().alias(MEAN_CONVERSION_PCT),
            col(LEADS).sum(),
            col(SENDS).sum(),
            col(COMMISSION).sum(),
        ])
        .with_columns([
            (col(MEDIAN_CONVERSION_PCT) * lit(100.0)).alias(LEADS_PER_10K),
            col(COMMISSION).fill_null(lit(0.0)).alias(COMMISSION),
            spend_expr.alias(SPEND),
        ])
        .with_column(roi)
        .with_column(segment_label(COVENANT_ACRONYM, PRODUCT));

    sorted(table, LEADS_PER_10K, direction)
        .limit(row_limit(top_n))
        .select([
            col(COVENANT_ACRONYM),
            col(PRODUCT),
            col(ORIGIN),
            col(SEGMENT),
            col(SENDS),
            col(LEADS),
            col(MEDIAN_CONVERSION_PCT),
            col(MEAN_CONVERSION_PCT),
            col(LEADS_PER_10K),
            col(COMMISSION),
            col(SPEND),
            col(ROI_PCT),
        ])
        .collect()
        .context("Failed to estimate leads per 10k sends")
}
