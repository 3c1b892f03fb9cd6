use super::cleaning::{normalize_leads, normalize_spend_with};
use super::filters::{FilterOptions, FilterSelection, apply_filters};
use super::io::{Uploads, load_csv};
use super::metrics;
use super::schema::Pricing;
use super::types::{CohortEvent, CohortMatrix, FunnelStage, Kpis, SortDirection};
use crate::error::{LeadlensError, Result, ResultExt as _};
use polars::prelude::DataFrame;
use std::path::Path;

/// The two canonical tables, normalized once and read by every recomputation.
#[derive(Clone, Debug)]
pub struct Datasets {
    pub leads: DataFrame,
    pub spend: DataFrame,
}

impl Datasets {
    /// Loads and normalizes both exports. Spend rows are priced with
    /// `pricing.spend`.
    pub fn load(leads_path: &Path, spend_path: &Path, pricing: &Pricing) -> Result<Self> {
        let leads = normalize_leads(load_csv(leads_path)?)
            .with_context(|| format!("Failed to normalize leads from {}", leads_path.display()))?;
        let spend = normalize_spend_with(load_csv(spend_path)?, &pricing.spend)
            .with_context(|| format!("Failed to normalize spend from {}", spend_path.display()))?;
        Ok(Self { leads, spend })
    }

    /// Like [`Self::load`], from a classified batch of uploads.
    ///
    /// # Errors
    ///
    /// [`LeadlensError::NotReady`] until both exports have been uploaded.
    pub fn from_uploads(uploads: &Uploads, pricing: &Pricing) -> Result<Self> {
        match (&uploads.leads, &uploads.spend) {
            (Some(leads), Some(spend)) => Self::load(leads, spend, pricing),
            (None, _) => Err(LeadlensError::NotReady(
                "no lead export (file name containing 'hubspot') was provided".to_owned(),
            )),
            (_, None) => Err(LeadlensError::NotReady(
                "no spend export (file name containing 'gasto') was provided".to_owned(),
            )),
        }
    }

    pub fn filter_options(&self) -> Result<FilterOptions> {
        FilterOptions::from_leads(&self.leads)
    }
}

#[derive(Clone, Debug)]
pub struct ReportOptions {
    pub selection: FilterSelection,
    pub top_n: usize,
    pub direction: SortDirection,
    pub cohort_event: CohortEvent,
}

/// Everything the dashboard shows for one selection.
#[derive(Debug)]
pub struct DashboardReport {
    pub kpis: Kpis,
    pub spend_vs_revenue: DataFrame,
    pub leads_time_series: DataFrame,
    pub funnel: Vec<FunnelStage>,
    pub cohort: CohortMatrix,
    pub cost_per_lead: DataFrame,
    pub roi_by_segment: DataFrame,
    pub roi_by_channel: DataFrame,
    pub spend_vs_revenue_by_channel: DataFrame,
    pub lead_volume: DataFrame,
    pub losses: DataFrame,
    pub leads_per_10k_sends: DataFrame,
}

/// Filters both tables and recomputes every metric.
pub fn build_report(
    data: &Datasets,
    options: &ReportOptions,
    pricing: &Pricing,
) -> Result<DashboardReport> {
    let start = std::time::Instant::now();
    let (leads, spend) = apply_filters(&data.leads, &data.spend, &options.selection)?;
    let top_n = options.top_n;
    let direction = options.direction;

    let report = DashboardReport {
        kpis: metrics::compute_kpis(
            &data.leads,
            &leads,
            &spend,
            &options.selection,
            &pricing.kpi,
        )?,
        spend_vs_revenue: metrics::spend_vs_revenue_by_segment(&leads, &spend, top_n)?,
        leads_time_series: metrics::leads_time_series(&leads, top_n)?,
        funnel: metrics::funnel(&leads)?,
        cohort: metrics::cohort_conversion(&leads, options.cohort_event)?,
        cost_per_lead: metrics::cost_per_lead(&leads, &spend, top_n, direction)?,
        roi_by_segment: metrics::roi_by_segment(&leads, &spend, top_n, direction)?,
        roi_by_channel: metrics::roi_by_channel(&leads, &spend)?,
        spend_vs_revenue_by_channel: metrics::spend_vs_revenue_by_channel(&leads, &spend)?,
        lead_volume: metrics::lead_volume_by_covenant(&leads, top_n, direction)?,
        losses: metrics::loss_attribution(&leads)?,
        leads_per_10k_sends: metrics::leads_per_10k_sends(
            &leads,
            &spend,
            &pricing.sends,
            top_n,
            direction,
        )?,
    };

    tracing::info!(
        leads = leads.height(),
        spend_rows = spend.height(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Built dashboard report"
    );
    Ok(report)
}
