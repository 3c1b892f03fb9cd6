use super::{Lead, day, leads_frame, spend_frame, strings};
use crate::dashboard::filters::{Dimension, FilterOptions, FilterSelection, apply_filters};
use crate::dashboard::schema::*;
use anyhow::Result;
use polars::prelude::*;

fn sample() -> Result<(DataFrame, DataFrame)> {
    let leads = leads_frame(&[
        Lead::new(4, "GOV SP", "Novo", "SMS"),
        Lead::new(5, "INSS", "Cartão", "RCS").team("Cs Cp"),
        Lead::new(9, "GOV SP", "Novo", "RCS"),
        Lead::new(11, "INSS", "Novo", "SMS").paid(12, 10.0),
        Lead::new(20, "GOV PR", "Novo", "SMS"),
    ])?;
    let spend = spend_frame(&[
        (4, "Sales", "GOV SP", "Novo", "SMS", 100.0, 4.7),
        (9, "Sales", "GOV SP", "Novo", "RCS", 100.0, 10.5),
        (11, "Cs Cp", "INSS", "Cartão", "RCS", 10.0, 1.05),
        (20, "Sales", "GOV PR", "Novo", "SMS", 10.0, 0.47),
    ])?;
    Ok((leads, spend))
}

#[test]
fn test_date_range_is_inclusive() -> Result<()> {
    let (leads, spend) = sample()?;
    let selection = FilterSelection::new(day(5), day(11));
    let (l, s) = apply_filters(&leads, &spend, &selection)?;
    assert_eq!(strings(&l, ID), vec!["2", "3", "4"]);
    assert_eq!(s.height(), 2);
    Ok(())
}

#[test]
fn test_inclusion_sets_apply_to_both_tables() -> Result<()> {
    let (leads, spend) = sample()?;
    let selection = FilterSelection::new(day(1), day(31))
        .with(Dimension::Covenant, ["GOV SP"])
        .with(Dimension::Channel, ["RCS"]);
    let (l, s) = apply_filters(&leads, &spend, &selection)?;
    assert_eq!(strings(&l, ID), vec!["3"]);
    assert_eq!(strings(&s, SPEND_COVENANT), vec!["GOV SP"]);
    assert_eq!(strings(&s, SPEND_CHANNEL), vec!["RCS"]);
    Ok(())
}

#[test]
fn test_stage_filter_leaves_spend_alone() -> Result<()> {
    let (leads, spend) = sample()?;
    let selection = FilterSelection::new(day(1), day(31)).with(Dimension::Stage, [PAID_STAGE]);
    let (l, s) = apply_filters(&leads, &spend, &selection)?;
    assert_eq!(strings(&l, ID), vec!["4"]);
    assert_eq!(s.height(), spend.height());
    Ok(())
}

#[test]
fn test_empty_inclusion_set_excludes_everything() -> Result<()> {
    let (leads, spend) = sample()?;
    let selection =
        FilterSelection::new(day(1), day(31)).with(Dimension::Team, Vec::<String>::new());
    let (l, s) = apply_filters(&leads, &spend, &selection)?;
    assert_eq!(l.height(), 0);
    assert_eq!(s.height(), 0);
    assert_eq!(l.width(), leads.width(), "schema survives an empty result");
    Ok(())
}

#[test]
fn test_business_days_only() -> Result<()> {
    let (leads, spend) = sample()?;
    // 9 March 2024 is a Saturday
    let selection = FilterSelection::new(day(1), day(31)).business_days_only(true);
    let (l, s) = apply_filters(&leads, &spend, &selection)?;
    assert_eq!(strings(&l, ID), vec!["1", "2", "4", "5"]);
    assert_eq!(s.height(), 3);
    Ok(())
}

#[test]
fn test_apply_filters_is_idempotent() -> Result<()> {
    let (leads, spend) = sample()?;
    let selection = FilterSelection::new(day(4), day(20))
        .with(Dimension::Product, ["Novo"])
        .business_days_only(true);

    let (l1, s1) = apply_filters(&leads, &spend, &selection)?;
    let (l2, s2) = apply_filters(&l1, &s1, &selection)?;
    assert!(l1.equals_missing(&l2));
    assert!(s1.equals_missing(&s2));
    Ok(())
}

#[test]
fn test_filter_options_from_leads() -> Result<()> {
    let (leads, _) = sample()?;
    let options = FilterOptions::from_leads(&leads)?;

    assert_eq!(options.values(Dimension::Covenant), ["GOV PR", "GOV SP", "INSS"]);
    assert_eq!(options.values(Dimension::Team), ["Cs Cp", "Sales"]);
    assert_eq!(options.min_date, Some(day(4)));
    assert_eq!(options.max_date, Some(day(20)));

    let selection = options.default_selection().expect("dates present");
    assert_eq!((selection.start, selection.end), (day(4), day(20)));
    assert!(selection.inclusion(Dimension::Stage).is_none());
    Ok(())
}
