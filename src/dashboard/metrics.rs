//! Aggregations over the filtered tables.
//!
//! Every function takes borrowed tables and builds its own lazy plan, so the
//! inputs are never modified. Spend keys (`Convênio`, `Produto`, `Canal`) are
//! renamed to their lead counterparts before joining, so every segment table
//! is keyed by `covenant_acronym`, `product` and/or `origin`.

mod channels;
mod cohort;
mod funnel;
mod kpi;
mod losses;
mod segments;
mod sends;
mod volume;

pub use channels::leads_time_series;
pub use cohort::cohort_conversion;
pub use funnel::{FUNNEL_STAGES, funnel, funnel_frame};
pub use kpi::{compute_kpis, priced_spend_by_segment};
pub use losses::{LOSS_STAGE, loss_attribution};
pub use segments::{
    cost_per_lead, roi_by_channel, roi_by_segment, spend_vs_revenue_by_channel,
    spend_vs_revenue_by_segment,
};
pub use sends::leads_per_10k_sends;
pub use volume::{COVENANT_TOTAL, RANK, lead_volume_by_covenant};

use super::frame::keys_present;
use super::schema::{
    AMOUNT_SPENT, COMMISSION_PAID, COVENANT_ACRONYM, PAID_STAGE, PRODUCT, SPEND_COVENANT,
    SPEND_PRODUCT, STAGE,
};
use super::types::SortDirection;
use polars::prelude::*;

// Output column names shared by several tables
pub const SPEND: &str = "spend";
pub const REVENUE: &str = "revenue";
pub const LEADS: &str = "leads";
pub const COUNT: &str = "count";
pub const CPL: &str = "cpl";
pub const ROI_PCT: &str = "roi_pct";
pub const SEGMENT: &str = "segment";

/// Filtered leads whose `stage` is `PAGO`; the only rows that carry revenue.
fn paid_leads(leads: &DataFrame) -> LazyFrame {
    leads
        .clone()
        .lazy()
        .filter(col(STAGE).eq(lit(PAID_STAGE)))
}

/// Spend summed per (covenant, product), keyed with lead column names.
fn spend_by_segment(spend: &DataFrame) -> LazyFrame {
    spend
        .clone()
        .lazy()
        .filter(keys_present(&[SPEND_COVENANT, SPEND_PRODUCT]))
        .group_by_stable([
            col(SPEND_COVENANT).alias(COVENANT_ACRONYM),
            col(SPEND_PRODUCT).alias(PRODUCT),
        ])
        .agg([col(AMOUNT_SPENT).sum().alias(SPEND)])
}

/// Paid commission summed per (covenant acronym, product).
fn revenue_by_segment(leads: &DataFrame) -> LazyFrame {
    paid_leads(leads)
        .filter(keys_present(&[COVENANT_ACRONYM, PRODUCT]))
        .group_by_stable([col(COVENANT_ACRONYM), col(PRODUCT)])
        .agg([col(COMMISSION_PAID).sum().alias(REVENUE)])
}

fn lead_count_by_segment(leads: &DataFrame) -> LazyFrame {
    leads
        .clone()
        .lazy()
        .filter(keys_present(&[COVENANT_ACRONYM, PRODUCT]))
        .group_by_stable([col(COVENANT_ACRONYM), col(PRODUCT)])
        .agg([len().cast(DataType::Int64).alias(LEADS)])
}

fn sorted(lf: LazyFrame, column: &str, direction: SortDirection) -> LazyFrame {
    lf.sort(
        [column],
        SortMultipleOptions::default()
            .with_order_descending(direction.descending())
            .with_nulls_last(true)
            .with_maintain_order(true),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paid_leads_uses_stage_only() -> anyhow::Result<()> {
        let df = df![
            STAGE => ["PAGO", "PERDA", "PAGO"],
            COMMISSION_PAID => [10.0, 99.0, 5.0],
        ]?;
        let paid = paid_leads(&df).collect()?;
        assert_eq!(paid.height(), 2);
        Ok(())
    }
}
