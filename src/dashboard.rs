//! The lead-funnel pipeline: normalize both exports, filter them with one
//! selection, then aggregate.

pub mod calendar;
pub mod cleaning;
pub mod filters;
pub mod flows;
pub mod frame;
pub mod io;
pub mod metrics;
pub mod schema;
pub mod types;

#[cfg(test)]
mod tests;

pub use calendar::filter_business_days;
pub use cleaning::{normalize_leads, normalize_spend, normalize_spend_with};
pub use filters::{Dimension, FilterOptions, FilterSelection, apply_filters};
pub use flows::{DashboardReport, Datasets, ReportOptions, build_report};
pub use io::{Uploads, classify_uploads, load_csv, save_csv};
pub use schema::{Pricing, UnitCostTable};
pub use types::{CohortEvent, CohortMatrix, CohortRow, FunnelStage, Kpis, SortDirection};
