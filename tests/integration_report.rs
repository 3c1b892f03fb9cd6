//! End-to-end tests for the report workflow
//!
//! These tests load the fixture exports under `testdata/`, run the whole
//! pipeline and check the figures a user would see.

use anyhow::Result;
use chrono::NaiveDate;
use leadlens::dashboard::metrics::{ROI_PCT, SEGMENT};
use leadlens::dashboard::{
    Datasets, Dimension, FilterSelection, Pricing, ReportOptions, build_report, classify_uploads,
    load_csv, save_csv,
};
use leadlens::dashboard::types::{CohortEvent, SortDirection};
use polars::prelude::*;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(name)
}

fn march(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).expect("valid date")
}

fn load_fixtures() -> Result<Datasets> {
    Ok(Datasets::load(
        &fixture("hubspot_leads.csv"),
        &fixture("gasto_marketing.csv"),
        &Pricing::default(),
    )?)
}

fn options(selection: FilterSelection) -> ReportOptions {
    ReportOptions {
        selection,
        top_n: 5,
        direction: SortDirection::Highest,
        cohort_event: CohortEvent::Paid,
    }
}

fn strings(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    Ok(df
        .column(name)?
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_owned())
        .collect())
}

#[test]
fn test_full_report_over_fixtures() -> Result<()> {
    let data = load_fixtures()?;
    assert_eq!(data.leads.height(), 6);
    assert_eq!(data.spend.height(), 4);

    let selection = data
        .filter_options()?
        .default_selection()
        .expect("fixture leads carry dates");
    assert_eq!((selection.start, selection.end), (march(4), march(9)));

    let report = build_report(&data, &options(selection), &Pricing::default())?;

    let kpis = &report.kpis;
    assert_eq!(kpis.total_leads, 6);
    assert!((kpis.mean_leads_per_day - 1.0).abs() < 1e-9);
    assert!((kpis.filtered_conversion_pct - 100.0 / 3.0).abs() < 1e-9);
    assert!((kpis.revenue - 200.0).abs() < 1e-9);
    // Priced with the KPI table: 48.0 + 21.0 + 10.5 + 4.8
    assert!((kpis.spend - 84.3).abs() < 1e-6);
    assert!((kpis.gross_profit - 115.7).abs() < 1e-6);

    let counts: Vec<usize> = report.funnel.iter().map(|s| s.count).collect();
    assert_eq!(counts, vec![6, 4, 2, 2, 1]);

    assert_eq!(
        strings(&report.roi_by_segment, SEGMENT)?,
        vec!["GOV SP - Novo", "INSS - Novo"]
    );
    let roi = report.roi_by_segment.column(ROI_PCT)?.f64()?;
    let best = roi.get(0).expect("two segments");
    assert!((best - 100.0 * (150.0 - 57.5) / 57.5).abs() < 1e-6);

    // HYPERFLOW from the Sales team is counted as RCS
    assert!(
        strings(&report.roi_by_channel, "origin")?
            .iter()
            .all(|channel| channel == "SMS" || channel == "RCS")
    );

    assert_eq!(report.cohort.elapsed_days, vec![3]);
    assert_eq!(report.cohort.rows.len(), 2);
    assert_eq!(report.losses.height(), 1);
    assert_eq!(report.leads_per_10k_sends.height(), 4);
    Ok(())
}

#[test]
fn test_business_days_and_dimension_filters() -> Result<()> {
    let data = load_fixtures()?;
    let pricing = Pricing::default();

    let weekdays = FilterSelection::new(march(4), march(9)).business_days_only(true);
    let report = build_report(&data, &options(weekdays), &pricing)?;
    // The Saturday lead and the Saturday spend row are excluded
    assert_eq!(report.kpis.total_leads, 5);
    assert!((report.kpis.mean_leads_per_day - 1.0).abs() < 1e-9);
    assert!((report.kpis.spend - 79.5).abs() < 1e-6);

    let inss = FilterSelection::new(march(4), march(9)).with(Dimension::Covenant, ["INSS"]);
    let report = build_report(&data, &options(inss), &pricing)?;
    assert_eq!(report.kpis.total_leads, 3);
    assert!((report.kpis.revenue - 50.0).abs() < 1e-9);
    assert!((report.kpis.overall_conversion_pct - 100.0 / 3.0).abs() < 1e-9);
    assert_eq!(strings(&report.spend_vs_revenue, SEGMENT)?, vec!["INSS - Novo"]);
    Ok(())
}

#[test]
fn test_uploads_need_both_exports() -> Result<()> {
    let pricing = Pricing::default();

    let uploads = classify_uploads(&[fixture("hubspot_leads.csv")]);
    let err = Datasets::from_uploads(&uploads, &pricing).expect_err("spend export missing");
    assert!(err.is_not_ready());

    let uploads = classify_uploads(&[
        fixture("gasto_marketing.csv"),
        fixture("hubspot_leads.csv"),
    ]);
    assert!(uploads.is_complete());
    let data = Datasets::from_uploads(&uploads, &pricing)?;
    assert_eq!(data.leads.height(), 6);
    Ok(())
}

#[test]
fn test_spend_export_without_required_columns_is_not_ready() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let spend = dir.path().join("gasto.csv");
    std::fs::write(&spend, "Data,Canal\n04/03/2024,SMS\n")?;

    let err = Datasets::load(&fixture("hubspot_leads.csv"), &spend, &Pricing::default())
        .expect_err("spend export lacks quantity and segment columns");
    assert!(err.is_not_ready());
    Ok(())
}

#[test]
fn test_export_leads_per_10k_sends() -> Result<()> {
    let data = load_fixtures()?;
    let selection = FilterSelection::new(march(4), march(9));
    let mut report = build_report(&data, &options(selection), &Pricing::default())?;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("leads_per_10k.csv");
    save_csv(&mut report.leads_per_10k_sends, &path)?;

    let reloaded = load_csv(&path)?;
    assert_eq!(reloaded.height(), report.leads_per_10k_sends.height());
    assert_eq!(
        reloaded.get_column_names(),
        report.leads_per_10k_sends.get_column_names()
    );
    Ok(())
}
