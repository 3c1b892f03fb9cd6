use super::schema::{DATE_CONTRACTING, DATE_LOST, DATE_NEGOTIATION, DATE_PAID};
use crate::error::Result;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which end of a ranking to keep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Highest,
    Lowest,
}

impl SortDirection {
    pub fn descending(self) -> bool {
        self == Self::Highest
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "highest" | "top" | "desc" | "maiores" | "melhores" => Ok(Self::Highest),
            "lowest" | "bottom" | "asc" | "menores" | "piores" => Ok(Self::Lowest),
            other => Err(format!("unknown sort direction '{other}'")),
        }
    }
}

/// Stage event a cohort is measured against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CohortEvent {
    #[default]
    Paid,
    Lost,
    Negotiation,
    Contracting,
}

impl CohortEvent {
    pub const ALL: [Self; 4] = [
        Self::Paid,
        Self::Lost,
        Self::Negotiation,
        Self::Contracting,
    ];

    /// Stage-date column holding the event.
    pub fn column(self) -> &'static str {
        match self {
            Self::Paid => DATE_PAID,
            Self::Lost => DATE_LOST,
            Self::Negotiation => DATE_NEGOTIATION,
            Self::Contracting => DATE_CONTRACTING,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Paid => "Pagamento",
            Self::Lost => "Perda",
            Self::Negotiation => "Negociação",
            Self::Contracting => "Contratação",
        }
    }
}

impl fmt::Display for CohortEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CohortEvent {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "paid" | "pagamento" | "pago" => Ok(Self::Paid),
            "lost" | "perda" => Ok(Self::Lost),
            "negotiation" | "negociação" | "negociacao" => Ok(Self::Negotiation),
            "contracting" | "contratação" | "contratacao" => Ok(Self::Contracting),
            other => Err(format!(
                "unknown cohort event '{other}' (expected paid, lost, negotiation or contracting)"
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FunnelStage {
    pub stage: String,
    pub count: usize,
    /// Percentage of the first stage's count.
    pub pct_of_first: f64,
    /// Percentage of the previous stage's count; `None` for the first stage.
    pub pct_of_previous: Option<f64>,
}

/// Headline figures for the filtered view.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub total_leads: usize,
    pub mean_leads_per_day: f64,
    /// `PAGO` share of the unfiltered table, ×100.
    pub overall_conversion_pct: f64,
    /// `PAGO` share of the filtered table, ×100.
    pub filtered_conversion_pct: f64,
    /// Filtered minus overall, in percentage points.
    pub conversion_delta_pct: f64,
    pub revenue: f64,
    pub spend: f64,
    pub gross_profit: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CohortRow {
    pub cohort: NaiveDate,
    /// Leads created on `cohort`, whether or not they reached the event.
    pub size: usize,
    /// One rate (×100) per entry of [`CohortMatrix::elapsed_days`].
    pub rates: Vec<f64>,
}

impl CohortRow {
    /// `"YYYY-MM-DD (n=N)"`, the row heading of the heatmap.
    pub fn label(&self) -> String {
        format!("{} (n={})", self.cohort.format("%Y-%m-%d"), self.size)
    }
}

/// Share of each creation-date cohort reaching an event after N days.
///
/// Rows run newest cohort first, columns by ascending elapsed days.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CohortMatrix {
    pub event: CohortEvent,
    pub elapsed_days: Vec<i64>,
    pub rows: Vec<CohortRow>,
}

impl CohortMatrix {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Wide table: a `cohort` label column then one column per elapsed day.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let labels: Vec<String> = self.rows.iter().map(CohortRow::label).collect();
        let mut columns = vec![Column::from(Series::new("cohort".into(), labels))];
        for (i, days) in self.elapsed_days.iter().enumerate() {
            let values: Vec<f64> = self
                .rows
                .iter()
                .map(|r| r.rates.get(i).copied().unwrap_or(0.0))
                .collect();
            columns.push(Column::from(Series::new(days.to_string().into(), values)));
        }
        Ok(DataFrame::new(columns)?)
    }
}
