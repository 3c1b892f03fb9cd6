//! One filter selection applied to both the lead and the spend table.

use super::calendar::filter_business_days;
use super::frame::{date_to_days, date_values, str_values};
use super::schema::{
    COVENANT_ACRONYM, DATE, ORIGIN, PRODUCT, SPEND_CHANNEL, SPEND_COVENANT, SPEND_PRODUCT,
    SPEND_TEAM, STAGE, TEAM,
};
use crate::error::{Result, ResultExt as _};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Categorical dimensions a selection can restrict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Team,
    Product,
    Covenant,
    Stage,
    Channel,
}

impl Dimension {
    pub const ALL: [Self; 5] = [
        Self::Team,
        Self::Product,
        Self::Covenant,
        Self::Stage,
        Self::Channel,
    ];

    pub fn lead_column(self) -> &'static str {
        match self {
            Self::Team => TEAM,
            Self::Product => PRODUCT,
            Self::Covenant => COVENANT_ACRONYM,
            Self::Stage => STAGE,
            Self::Channel => ORIGIN,
        }
    }

    /// `None` where the spend export has no such column.
    pub fn spend_column(self) -> Option<&'static str> {
        match self {
            Self::Team => Some(SPEND_TEAM),
            Self::Product => Some(SPEND_PRODUCT),
            Self::Covenant => Some(SPEND_COVENANT),
            Self::Stage => None,
            Self::Channel => Some(SPEND_CHANNEL),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Team => "Equipe",
            Self::Product => "Produto",
            Self::Covenant => "Convênio",
            Self::Stage => "Etapa",
            Self::Channel => "Canal",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Date range, optional inclusion sets and the business-day flag.
///
/// A dimension without an inclusion set is unrestricted, nulls included. An
/// empty inclusion set matches nothing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub include: BTreeMap<Dimension, BTreeSet<String>>,
    pub business_days_only: bool,
}

impl FilterSelection {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            include: BTreeMap::new(),
            business_days_only: false,
        }
    }

    #[must_use]
    pub fn with<I, S>(mut self, dimension: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include
            .insert(dimension, values.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn business_days_only(mut self, enabled: bool) -> Self {
        self.business_days_only = enabled;
        self
    }

    pub fn inclusion(&self, dimension: Dimension) -> Option<&BTreeSet<String>> {
        self.include.get(&dimension)
    }

    fn predicate(&self, column_for: impl Fn(Dimension) -> Option<&'static str>) -> Expr {
        let date_days = col(DATE).cast(DataType::Int32);
        let in_range = date_days
            .clone()
            .gt_eq(lit(date_to_days(self.start)))
            .and(date_days.lt_eq(lit(date_to_days(self.end))));

        self.include
            .iter()
            .filter_map(|(dimension, values)| {
                column_for(*dimension).map(|column| (column, values))
            })
            .fold(in_range, |acc, (column, values)| {
                let allowed: Vec<&str> = values.iter().map(String::as_str).collect();
                let allowed = Series::new(PlSmallStr::from_static("allowed"), allowed);
                acc.and(col(column).is_in(lit(allowed)))
            })
    }
}

fn restrict(df: &DataFrame, predicate: Expr, selection: &FilterSelection) -> Result<DataFrame> {
    let filtered = df.clone().lazy().filter(predicate).collect()?;
    filter_business_days(
        &filtered,
        selection.start,
        selection.end,
        selection.business_days_only,
    )
}

/// Filters the canonical lead and spend tables with one selection.
///
/// Rows with a null `date` never fall inside the range. Applying the same
/// selection to its own output changes nothing.
///
/// # Errors
///
/// Fails only if a table lacks a filtered column or Polars fails.
pub fn apply_filters(
    leads: &DataFrame,
    spend: &DataFrame,
    selection: &FilterSelection,
) -> Result<(DataFrame, DataFrame)> {
    let leads_out = restrict(
        leads,
        selection.predicate(|d| Some(d.lead_column())),
        selection,
    )
    .context("Failed to filter leads")?;
    let spend_out = restrict(spend, selection.predicate(Dimension::spend_column), selection)
        .context("Failed to filter spend")?;

    tracing::debug!(
        leads_before = leads.height(),
        leads_after = leads_out.height(),
        spend_before = spend.height(),
        spend_after = spend_out.height(),
        "Applied filter selection"
    );
    Ok((leads_out, spend_out))
}

/// Values a presentation layer can offer for each dimension, read from the
/// lead table, plus the lead date bounds.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub values: BTreeMap<Dimension, Vec<String>>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

impl FilterOptions {
    pub fn from_leads(leads: &DataFrame) -> Result<Self> {
        let mut values = BTreeMap::new();
        for dimension in Dimension::ALL {
            let distinct: BTreeSet<String> = str_values(leads, dimension.lead_column())?
                .into_iter()
                .flatten()
                .collect();
            values.insert(dimension, distinct.into_iter().collect());
        }

        let dates: Vec<NaiveDate> = date_values(leads, DATE)?.into_iter().flatten().collect();
        Ok(Self {
            values,
            min_date: dates.iter().min().copied(),
            max_date: dates.iter().max().copied(),
        })
    }

    pub fn values(&self, dimension: Dimension) -> &[String] {
        self.values
            .get(&dimension)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Full date range, no restrictions. `None` when no lead has a date.
    pub fn default_selection(&self) -> Option<FilterSelection> {
        Some(FilterSelection::new(self.min_date?, self.max_date?))
    }
}
