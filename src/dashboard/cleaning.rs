use super::frame::{date_column, map_str_column, require_columns, str_values};
use super::schema::{
    AMOUNT_SPENT, COVENANT, COVENANT_ACRONYM, COVENANT_ACRONYMS, CREATED_AT, DATE, LEAD_RENAMES,
    LEAD_TEXT_COLUMNS, LOSS_REASON, LOSS_REASON_GROUPED, MAIN_LOSS_REASONS, MONEY_COLUMNS, ORIGIN,
    ORIGIN_REMAPS, OTHER_LOSS_REASON, PRODUCT, REQUIRED_LEAD_COLUMNS, REQUIRED_SPEND_COLUMNS,
    SPEND_CHANNEL, SPEND_QUANTITY, SPEND_RAW_DATE, SPEND_TEXT_COLUMNS, SPEND_UNIT_COSTS,
    STAGE_DATE_COLUMNS, TEAM, TEAM_PRODUCT_OVERRIDES, TEAM_RULES, TIME_CREATED, UnitCostTable,
};
use crate::error::{Result, ResultExt as _};
use chrono::{DateTime, Datelike as _, NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;

/// Timestamp layouts seen in CRM exports. Slash dates are read month-first
/// before day-first, the same precedence the export tooling used.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%y %H:%M:%S",
    "%m/%d/%y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d/%m/%y %H:%M:%S",
    "%d/%m/%y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%d/%m/%Y", "%d/%m/%y"];

const DAY_FIRST_TIMESTAMP_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d/%m/%y %H:%M:%S",
    "%d/%m/%y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DAY_FIRST_DATE_FORMATS: &[&str] = &[
    "%d/%m/%Y", "%d/%m/%y", "%d-%m-%Y", "%d-%m-%y", "%d.%m.%Y", "%d.%m.%y", "%Y-%m-%d",
];

// `%Y` also accepts a two-digit year ("24" reads as year 24), so such
// parses are rejected and the `%y` layouts get their turn.
const MIN_YEAR: i32 = 1000;

fn first_date(raw: &str, formats: &[&str]) -> Option<NaiveDate> {
    formats
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .find(|d| d.year() >= MIN_YEAR)
}

fn first_timestamp(raw: &str, formats: &[&str]) -> Option<NaiveDateTime> {
    formats
        .iter()
        .filter_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .find(|t| t.year() >= MIN_YEAR)
}

/// Renames, remaps and derives the canonical lead table from a raw CRM export.
///
/// Unparseable dates become nulls and unknown categories pass through; only
/// missing required columns are an error.
///
/// # Errors
///
/// Returns [`crate::error::LeadlensError::MissingColumns`] when the export lacks
/// one of [`REQUIRED_LEAD_COLUMNS`], or a data processing error if Polars fails.
pub fn normalize_leads(raw: DataFrame) -> Result<DataFrame> {
    let rows = raw.height();
    let mut df = rename_columns(&raw, LEAD_RENAMES)?;
    require_columns(&df, "leads", REQUIRED_LEAD_COLUMNS)?;

    let optional: Vec<&str> = LEAD_RENAMES
        .iter()
        .map(|(_, canonical)| *canonical)
        .filter(|canonical| !REQUIRED_LEAD_COLUMNS.contains(canonical))
        .collect();
    add_missing_columns(&mut df, &optional)?;

    // Creation timestamp → calendar date + time of day
    let created = str_values(&df, CREATED_AT)?;
    let timestamps: Vec<Option<NaiveDateTime>> = created
        .iter()
        .map(|v| v.as_deref().and_then(parse_timestamp))
        .collect();
    let unparsed = count_unparsed(&created, &timestamps);
    if unparsed > 0 {
        tracing::warn!("{unparsed} lead creation timestamps could not be parsed; kept as null");
    }
    let dates: Vec<Option<NaiveDate>> = timestamps.iter().map(|t| t.map(|t| t.date())).collect();
    let times: StringChunked = timestamps
        .iter()
        .map(|t| t.map(|t| t.format("%H:%M:%S").to_string()))
        .collect();
    let created_dates = date_column(DATE, &dates)?;
    df.with_column(created_dates)?;
    df.with_column(Column::from(
        times.into_series().with_name(TIME_CREATED.into()),
    ))?;

    for name in STAGE_DATE_COLUMNS {
        let values = str_values(&df, name)?;
        let parsed: Vec<Option<NaiveDate>> = values
            .iter()
            .map(|v| v.as_deref().and_then(parse_timestamp).map(|t| t.date()))
            .collect();
        let stage_dates = date_column(name, &parsed)?;
        df.with_column(stage_dates)?;
    }

    let team = map_str_column(&df, TEAM, TEAM, |v| Some(canonical_team(v)))?;
    df.with_column(team)?;
    let grouped_reason = map_str_column(&df, LOSS_REASON, LOSS_REASON_GROUPED, |v| {
        Some(group_loss_reason(v).to_owned())
    })?;
    df.with_column(grouped_reason)?;
    let acronyms = covenant_acronym_column(&df)?;
    df.with_column(acronyms)?;

    let mut exprs: Vec<Expr> = LEAD_TEXT_COLUMNS
        .iter()
        .map(|name| col(*name).cast(DataType::String))
        .collect();
    exprs.extend(
        MONEY_COLUMNS
            .iter()
            .map(|name| col(*name).cast(DataType::Float64)),
    );

    let df = df
        .lazy()
        .with_columns(exprs)
        // Null reasons group to "Outros" too
        .with_column(
            col(LOSS_REASON_GROUPED)
                .fill_null(lit(OTHER_LOSS_REASON))
                .alias(LOSS_REASON_GROUPED),
        )
        .with_column(product_override_expr())
        .with_column(origin_remap_expr())
        .collect()
        .context("Failed to normalize lead table")?
        .drop(CREATED_AT)?;

    tracing::debug!(rows, columns = df.width(), "Normalized lead table");
    Ok(df)
}

/// Normalizes the spend export with the default spend unit costs.
///
/// # Errors
///
/// See [`normalize_spend_with`].
pub fn normalize_spend(raw: DataFrame) -> Result<DataFrame> {
    normalize_spend_with(raw, &UnitCostTable::from_pairs(SPEND_UNIT_COSTS))
}

/// Parses the day-first `Data` column into `date` and prices every row:
/// `amount_spent = unit_cost(Canal) × Quantidade`, rounded to cents.
/// Channels missing from `unit_costs` get a null amount.
///
/// # Errors
///
/// Returns [`crate::error::LeadlensError::MissingColumns`] when one of
/// [`REQUIRED_SPEND_COLUMNS`] is absent.
pub fn normalize_spend_with(raw: DataFrame, unit_costs: &UnitCostTable) -> Result<DataFrame> {
    let mut df = rename_columns(&raw, &[])?;
    require_columns(&df, "spend", REQUIRED_SPEND_COLUMNS)?;

    let raw_dates = str_values(&df, SPEND_RAW_DATE)?;
    let dates: Vec<Option<NaiveDate>> = raw_dates
        .iter()
        .map(|v| v.as_deref().and_then(parse_day_first_date))
        .collect();
    let unparsed = raw_dates
        .iter()
        .zip(&dates)
        .filter(|(raw, parsed)| raw.is_some() && parsed.is_none())
        .count();
    if unparsed > 0 {
        tracing::warn!("{unparsed} spend dates could not be parsed; kept as null");
    }
    let spend_dates = date_column(DATE, &dates)?;
    df.with_column(spend_dates)?;

    let mut exprs: Vec<Expr> = SPEND_TEXT_COLUMNS
        .iter()
        .map(|name| col(*name).cast(DataType::String))
        .collect();
    exprs.push(col(SPEND_QUANTITY).cast(DataType::Float64));

    let df = df
        .lazy()
        .with_columns(exprs)
        .with_column(
            (unit_cost_expr(col(SPEND_CHANNEL), unit_costs) * col(SPEND_QUANTITY))
                .round(2)
                .alias(AMOUNT_SPENT),
        )
        .collect()
        .context("Failed to normalize spend table")?;

    let unpriced = df.column(AMOUNT_SPENT)?.null_count();
    if unpriced > 0 {
        tracing::warn!("{unpriced} spend rows have a channel without unit cost");
    }
    tracing::debug!(rows = df.height(), "Normalized spend table");
    Ok(df)
}

/// Looks the channel up in `table`; null for unknown channels.
pub fn unit_cost_expr(channel: Expr, table: &UnitCostTable) -> Expr {
    table
        .iter()
        .fold(lit(NULL).cast(DataType::Float64), |acc, (name, cost)| {
            when(channel.clone().eq(lit(name)))
                .then(lit(cost))
                .otherwise(acc)
        })
}

/// Applies [`TEAM_RULES`] in order to the running value; the last rule that
/// matches decides the result.
pub fn canonical_team(raw: &str) -> String {
    TEAM_RULES
        .iter()
        .fold(raw.to_owned(), |current, (pattern, replacement)| {
            if current.to_lowercase().contains(&pattern.to_lowercase()) {
                (*replacement).to_owned()
            } else {
                current
            }
        })
}

pub fn group_loss_reason(reason: &str) -> &str {
    if MAIN_LOSS_REASONS.contains(&reason) {
        reason
    } else {
        OTHER_LOSS_REASON
    }
}

/// Acronym for a covenant name; unknown names come back lowercased.
pub fn covenant_acronym(covenant: &str) -> String {
    let key = covenant.to_lowercase();
    COVENANT_ACRONYMS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, acronym)| (*acronym).to_owned())
        .unwrap_or(key)
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    first_timestamp(raw, TIMESTAMP_FORMATS)
        .or_else(|| first_date(raw, DATE_FORMATS).map(|d| d.and_time(NaiveTime::MIN)))
}

pub fn parse_day_first_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    first_date(raw, DAY_FIRST_DATE_FORMATS)
        .or_else(|| first_timestamp(raw, DAY_FIRST_TIMESTAMP_FORMATS).map(|t| t.date()))
}

fn covenant_acronym_column(df: &DataFrame) -> Result<Column> {
    let column = df.column(COVENANT)?;
    // Non-text covenants carry no name to abbreviate.
    if !matches!(column.dtype(), DataType::String | DataType::Null) {
        return Ok(Column::from(Series::new(
            COVENANT_ACRONYM.into(),
            vec![""; df.height()],
        )));
    }
    let acronyms: StringChunked = str_values(df, COVENANT)?
        .iter()
        .map(|v| Some(v.as_deref().map(covenant_acronym).unwrap_or_default()))
        .collect();
    Ok(Column::from(
        acronyms.into_series().with_name(COVENANT_ACRONYM.into()),
    ))
}

fn product_override_expr() -> Expr {
    TEAM_PRODUCT_OVERRIDES
        .iter()
        .fold(col(PRODUCT), |acc, (team, product)| {
            when(col(TEAM).eq(lit(*team)))
                .then(lit(*product))
                .otherwise(acc)
        })
        .alias(PRODUCT)
}

fn origin_remap_expr() -> Expr {
    ORIGIN_REMAPS
        .iter()
        .fold(col(ORIGIN), |acc, (origin, team, channel)| {
            when(col(ORIGIN).eq(lit(*origin)).and(col(TEAM).eq(lit(*team))))
                .then(lit(*channel))
                .otherwise(acc)
        })
        .alias(ORIGIN)
}

/// Renames source headers (trimmed, BOM stripped) through `renames`; other
/// columns keep their trimmed name.
fn rename_columns(df: &DataFrame, renames: &[(&str, &str)]) -> Result<DataFrame> {
    let columns: Vec<Column> = df
        .get_columns()
        .iter()
        .map(|column| {
            let header = column.name().trim_start_matches('\u{feff}').trim();
            let target = renames
                .iter()
                .find(|(source, _)| *source == header)
                .map(|(_, canonical)| *canonical)
                .unwrap_or(header);
            let mut column = column.clone();
            column.rename(target.into());
            column
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}

fn add_missing_columns(df: &mut DataFrame, names: &[&str]) -> Result<()> {
    let height = df.height();
    for name in names {
        if df.column(name).is_err() {
            df.with_column(Column::from(Series::full_null(
                (*name).into(),
                height,
                &DataType::String,
            )))?;
        }
    }
    Ok(())
}

fn count_unparsed(raw: &[Option<String>], parsed: &[Option<NaiveDateTime>]) -> usize {
    raw.iter()
        .zip(parsed)
        .filter(|(raw, parsed)| {
            raw.as_deref().is_some_and(|r| !r.trim().is_empty()) && parsed.is_none()
        })
        .count()
}
