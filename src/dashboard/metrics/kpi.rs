use super::paid_leads;
use crate::dashboard::calendar::days_in_range;
use crate::dashboard::cleaning::unit_cost_expr;
use crate::dashboard::filters::FilterSelection;
use crate::dashboard::frame::{f64_values, key_exprs, keys_present, ratio};
use crate::dashboard::schema::{
    AMOUNT_SPENT, COMMISSION_PAID, SPEND_CHANNEL, SPEND_COVENANT, SPEND_PRODUCT, SPEND_QUANTITY,
    SPEND_TEAM, UnitCostTable,
};
use crate::dashboard::types::Kpis;
use crate::error::{Result, ResultExt as _};
use polars::prelude::*;

const SPEND_SEGMENT_KEYS: &[&str] = &[SPEND_TEAM, SPEND_COVENANT, SPEND_PRODUCT, SPEND_CHANNEL];

/// Sends summed per team × covenant × product × channel and priced with
/// `unit_costs`, each group rounded to cents. Unknown channels price to null.
pub fn priced_spend_by_segment(spend: &DataFrame, unit_costs: &UnitCostTable) -> Result<DataFrame> {
    spend
        .clone()
        .lazy()
        .filter(keys_present(SPEND_SEGMENT_KEYS))
        .group_by_stable(key_exprs(SPEND_SEGMENT_KEYS))
        .agg([col(SPEND_QUANTITY).sum()])
        .with_column(
            (unit_cost_expr(col(SPEND_CHANNEL), unit_costs) * col(SPEND_QUANTITY))
                .round(2)
                .alias(AMOUNT_SPENT),
        )
        .collect()
        .context("Failed to price spend segments")
}

/// (PAGO rows, paid commission of those rows)
fn paid_summary(leads: &DataFrame) -> Result<(usize, f64)> {
    let paid = paid_leads(leads).collect()?;
    let revenue: f64 = f64_values(&paid, COMMISSION_PAID)?.into_iter().flatten().sum();
    Ok((paid.height(), revenue))
}

/// Headline numbers for the current selection.
///
/// `all_leads` is the unfiltered canonical table, used for the overall
/// conversion rate the filtered rate is compared against. Spend is priced
/// with `kpi_costs`, which differs from the table `amount_spent` was
/// computed with.
pub fn compute_kpis(
    all_leads: &DataFrame,
    leads: &DataFrame,
    spend: &DataFrame,
    selection: &FilterSelection,
    kpi_costs: &UnitCostTable,
) -> Result<Kpis> {
    let (paid_all, _) = paid_summary(all_leads)?;
    let (paid_filtered, revenue) = paid_summary(leads)?;
    let total_all = all_leads.height();
    let total_leads = leads.height();

    let days = days_in_range(selection.start, selection.end, selection.business_days_only);
    let overall_conversion_pct = ratio(paid_all as f64, total_all as f64) * 100.0;
    let filtered_conversion_pct = ratio(paid_filtered as f64, total_leads as f64) * 100.0;

    let priced = priced_spend_by_segment(spend, kpi_costs)?;
    let spend_total: f64 = f64_values(&priced, AMOUNT_SPENT)?.into_iter().flatten().sum();

    let kpis = Kpis {
        total_leads,
        mean_leads_per_day: ratio(total_leads as f64, days as f64),
        overall_conversion_pct,
        filtered_conversion_pct,
        conversion_delta_pct: filtered_conversion_pct - overall_conversion_pct,
        revenue,
        spend: spend_total,
        gross_profit: revenue - spend_total,
    };
    tracing::debug!(?kpis, days, "Computed KPIs");
    Ok(kpis)
}
