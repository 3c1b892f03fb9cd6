#![expect(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::missing_assert_message
)]
//! Pipeline tests over small hand-built canonical tables.

mod filters;

use super::frame::date_column;
use super::schema::*;
use anyhow::Result;
use chrono::NaiveDate;
use polars::prelude::*;

/// March 2024; the 4th is a Monday.
pub(super) fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).expect("valid date")
}

/// One canonical lead row.
#[derive(Clone)]
pub(super) struct Lead {
    date: Option<NaiveDate>,
    covenant: &'static str,
    product: &'static str,
    origin: &'static str,
    team: &'static str,
    stage: &'static str,
    commission_paid: Option<f64>,
    negotiation: Option<NaiveDate>,
    contracting: Option<NaiveDate>,
    paid: Option<NaiveDate>,
    lost: Option<NaiveDate>,
}

impl Lead {
    pub(super) fn new(
        date: u32,
        covenant: &'static str,
        product: &'static str,
        origin: &'static str,
    ) -> Self {
        Self {
            date: Some(day(date)),
            covenant,
            product,
            origin,
            team: "Sales",
            stage: "LEAD",
            commission_paid: None,
            negotiation: None,
            contracting: None,
            paid: None,
            lost: None,
        }
    }

    pub(super) fn team(mut self, team: &'static str) -> Self {
        self.team = team;
        self
    }

    pub(super) fn negotiated(mut self, d: u32) -> Self {
        self.negotiation = Some(day(d));
        self
    }

    pub(super) fn contracted(mut self, d: u32) -> Self {
        self.contracting = Some(day(d));
        self
    }

    /// Reaches `PAGO` on day `d` with `commission` paid.
    pub(super) fn paid(mut self, d: u32, commission: f64) -> Self {
        self.stage = PAID_STAGE;
        self.paid = Some(day(d));
        self.commission_paid = Some(commission);
        self
    }

    pub(super) fn lost(mut self, d: u32) -> Self {
        self.stage = "PERDA";
        self.lost = Some(day(d));
        self
    }
}

pub(super) fn leads_frame(rows: &[Lead]) -> Result<DataFrame> {
    let dates = |f: fn(&Lead) -> Option<NaiveDate>| -> Vec<Option<NaiveDate>> {
        rows.iter().map(f).collect()
    };
    let text = |f: fn(&Lead) -> &'static str| -> Vec<&str> { rows.iter().map(f).collect() };

    let ids: Vec<String> = (1..=rows.len()).map(|i| i.to_string()).collect();
    Ok(DataFrame::new(vec![
        Column::new(ID.into(), ids),
        date_column(DATE, &dates(|l| l.date))?,
        Column::new(COVENANT_ACRONYM.into(), text(|l| l.covenant)),
        Column::new(PRODUCT.into(), text(|l| l.product)),
        Column::new(ORIGIN.into(), text(|l| l.origin)),
        Column::new(TEAM.into(), text(|l| l.team)),
        Column::new(STAGE.into(), text(|l| l.stage)),
        Column::new(
            COMMISSION_PAID.into(),
            rows.iter().map(|l| l.commission_paid).collect::<Vec<_>>(),
        ),
        date_column(DATE_NEGOTIATION, &dates(|l| l.negotiation))?,
        date_column(DATE_CONTRACTING, &dates(|l| l.contracting))?,
        date_column(DATE_PAID, &dates(|l| l.paid))?,
        date_column(DATE_LOST, &dates(|l| l.lost))?,
    ])?)
}

/// One canonical spend row: (day, team, covenant, product, channel, sends, amount).
pub(super) type Spend = (u32, &'static str, &'static str, &'static str, &'static str, f64, f64);

pub(super) fn spend_frame(rows: &[Spend]) -> Result<DataFrame> {
    let dates: Vec<Option<NaiveDate>> = rows.iter().map(|r| Some(day(r.0))).collect();
    Ok(DataFrame::new(vec![
        date_column(DATE, &dates)?,
        Column::new(SPEND_TEAM.into(), rows.iter().map(|r| r.1).collect::<Vec<_>>()),
        Column::new(SPEND_COVENANT.into(), rows.iter().map(|r| r.2).collect::<Vec<_>>()),
        Column::new(SPEND_PRODUCT.into(), rows.iter().map(|r| r.3).collect::<Vec<_>>()),
        Column::new(SPEND_CHANNEL.into(), rows.iter().map(|r| r.4).collect::<Vec<_>>()),
        Column::new(SPEND_QUANTITY.into(), rows.iter().map(|r| r.5).collect::<Vec<_>>()),
        Column::new(AMOUNT_SPENT.into(), rows.iter().map(|r| r.6).collect::<Vec<_>>()),
    ])?)
}

/// Reads a string column out of a result table.
pub(super) fn strings(df: &DataFrame, name: &str) -> Vec<String> {
    super::frame::str_values(df, name)
        .unwrap()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect()
}

pub(super) fn floats(df: &DataFrame, name: &str) -> Vec<f64> {
    super::frame::f64_values(df, name)
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect()
}

pub(super) fn ints(df: &DataFrame, name: &str) -> Vec<i64> {
    super::frame::i64_values(df, name)
        .unwrap()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect()
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
