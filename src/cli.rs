use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use leadlens::config::{AppConfig, app_config};
use leadlens::dashboard::*;
use leadlens::error::LeadlensError;
use leadlens::utils::{CurrencyFormat, fmt_opt, fmt_pct};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "leadlens",
    version,
    about = "Lead funnel analytics over CRM and marketing-spend exports"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Where the two exports come from.
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Lead (CRM) export CSV
    #[arg(long, env = "LEADLENS_LEADS")]
    leads: Option<PathBuf>,

    /// Spend export CSV
    #[arg(long, env = "LEADLENS_SPEND")]
    spend: Option<PathBuf>,

    /// Uploaded files, classified by name ("hubspot" = leads, "gasto" = spend)
    #[arg(long, num_args = 1.., conflicts_with_all = ["leads", "spend"])]
    files: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct FilterArgs {
    /// First day of the range (YYYY-MM-DD). Defaults to the earliest lead.
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day of the range (YYYY-MM-DD). Defaults to the latest lead.
    #[arg(long)]
    end: Option<NaiveDate>,

    #[arg(long, value_delimiter = ',')]
    team: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    product: Vec<String>,

    /// Covenant acronyms, e.g. "GOV SP,INSS"
    #[arg(long, value_delimiter = ',')]
    covenant: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    stage: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    channel: Vec<String>,

    /// Count only Monday to Friday
    #[arg(long)]
    business_days: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the KPIs and every aggregate table for a selection
    Report {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Rows kept in ranked tables. Defaults to the configured value.
        #[arg(long)]
        top_n: Option<usize>,

        /// Which end of ranked tables to show (highest or lowest)
        #[arg(long, default_value = "highest")]
        direction: SortDirection,

        /// Event for the cohort matrix (paid, lost, negotiation, contracting)
        #[arg(long)]
        cohort_event: Option<CohortEvent>,
    },
    /// Print the cohort conversion matrix for one event
    Cohort {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        filters: FilterArgs,

        #[arg(long)]
        event: Option<CohortEvent>,
    },
    /// Write the leads-per-10k-sends table to CSV
    ExportSends {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        filters: FilterArgs,

        #[arg(long)]
        top_n: Option<usize>,

        #[arg(long, default_value = "highest")]
        direction: SortDirection,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List the values each filter accepts and the lead date range
    Options {
        #[command(flatten)]
        source: SourceArgs,
    },
}

pub fn run_command(command: Commands) -> Result<()> {
    let config = app_config();
    let outcome = match command {
        Commands::Report {
            source,
            filters,
            top_n,
            direction,
            cohort_event,
        } => handle_report(config, &source, &filters, top_n, direction, cohort_event),
        Commands::Cohort {
            source,
            filters,
            event,
        } => handle_cohort(config, &source, &filters, event),
        Commands::ExportSends {
            source,
            filters,
            top_n,
            direction,
            output,
        } => handle_export_sends(config, &source, &filters, top_n, direction, &output),
        Commands::Options { source } => handle_options(config, &source),
    };

    match outcome {
        Err(err) if err.is_not_ready() => {
            println!("Not ready: {err}");
            Ok(())
        }
        other => other.map_err(anyhow::Error::from),
    }
}

fn load_datasets(config: &AppConfig, source: &SourceArgs) -> leadlens::error::Result<Datasets> {
    let uploads = if source.files.is_empty() {
        Uploads {
            leads: source.leads.clone(),
            spend: source.spend.clone(),
        }
    } else {
        classify_uploads(&source.files)
    };
    Datasets::from_uploads(&uploads, &config.pricing)
}

fn selection_for(data: &Datasets, filters: &FilterArgs) -> leadlens::error::Result<FilterSelection> {
    let options = data.filter_options()?;
    let start = filters.start.or(options.min_date);
    let end = filters.end.or(options.max_date);
    let (Some(start), Some(end)) = (start, end) else {
        return Err(LeadlensError::NotReady(
            "the lead export has no parseable creation dates".to_owned(),
        ));
    };

    let mut selection = FilterSelection::new(start, end).business_days_only(filters.business_days);
    for (dimension, values) in [
        (Dimension::Team, &filters.team),
        (Dimension::Product, &filters.product),
        (Dimension::Covenant, &filters.covenant),
        (Dimension::Stage, &filters.stage),
        (Dimension::Channel, &filters.channel),
    ] {
        // Nothing selected means everything
        if !values.is_empty() {
            selection = selection.with(dimension, values.iter().cloned());
        }
    }
    Ok(selection)
}

fn handle_report(
    config: &AppConfig,
    source: &SourceArgs,
    filters: &FilterArgs,
    top_n: Option<usize>,
    direction: SortDirection,
    cohort_event: Option<CohortEvent>,
) -> leadlens::error::Result<()> {
    let data = load_datasets(config, source)?;
    let options = ReportOptions {
        selection: selection_for(&data, filters)?,
        top_n: top_n.unwrap_or(config.defaults.top_n),
        direction,
        cohort_event: cohort_event.unwrap_or(config.defaults.cohort_event),
    };
    let report = build_report(&data, &options, &config.pricing)?;
    let locale = config.resolve_locale();

    println!(
        "Period: {} to {}{}  (locale {locale})",
        options.selection.start,
        options.selection.end,
        if options.selection.business_days_only {
            ", business days only"
        } else {
            ""
        }
    );
    print_kpis(&report.kpis, CurrencyFormat::for_locale(locale));

    println!("\nSpend vs revenue by covenant and product\n{}", report.spend_vs_revenue);
    println!("\nLeads per day by channel\n{}", report.leads_time_series);

    println!("\nFunnel");
    for stage in &report.funnel {
        println!(
            "  {:<12} {:>7}  {:>8} of first  {:>8} of previous",
            stage.stage,
            stage.count,
            fmt_pct(stage.pct_of_first),
            stage.pct_of_previous.map_or_else(|| "—".to_owned(), fmt_pct)
        );
    }

    print_cohort(&report.cohort)?;
    println!("\nCost per lead\n{}", report.cost_per_lead);
    println!("\nROI by covenant and product\n{}", report.roi_by_segment);
    println!("\nSpend vs revenue by channel\n{}", report.spend_vs_revenue_by_channel);
    println!("\nROI by channel\n{}", report.roi_by_channel);
    println!("\nLead volume by covenant\n{}", report.lead_volume);
    println!("\nLosses by stage left\n{}", report.losses);
    println!("\nEstimated leads per 10k sends\n{}", report.leads_per_10k_sends);
    Ok(())
}

fn print_kpis(kpis: &Kpis, currency: CurrencyFormat) {
    println!("Total leads:          {}", kpis.total_leads);
    println!("Mean leads per day:   {}", fmt_opt(Some(kpis.mean_leads_per_day)));
    println!(
        "Conversion:           {} ({:+.2} pp vs overall {})",
        fmt_pct(kpis.filtered_conversion_pct),
        kpis.conversion_delta_pct,
        fmt_pct(kpis.overall_conversion_pct)
    );
    println!("Revenue:              {}", currency.format(kpis.revenue));
    println!("Spend:                {}", currency.format(kpis.spend));
    println!("Gross profit:         {}", currency.format(kpis.gross_profit));
}

fn print_cohort(cohort: &CohortMatrix) -> leadlens::error::Result<()> {
    if cohort.is_empty() {
        println!("\nCohort by {}: no events in range", cohort.event);
    } else {
        println!("\nCohort by {} (% of cohort)\n{}", cohort.event, cohort.to_frame()?);
    }
    Ok(())
}

fn handle_cohort(
    config: &AppConfig,
    source: &SourceArgs,
    filters: &FilterArgs,
    event: Option<CohortEvent>,
) -> leadlens::error::Result<()> {
    let data = load_datasets(config, source)?;
    let selection = selection_for(&data, filters)?;
    let (leads, _) = apply_filters(&data.leads, &data.spend, &selection)?;
    let matrix = metrics::cohort_conversion(&leads, event.unwrap_or(config.defaults.cohort_event))?;
    print_cohort(&matrix)
}

fn handle_export_sends(
    config: &AppConfig,
    source: &SourceArgs,
    filters: &FilterArgs,
    top_n: Option<usize>,
    direction: SortDirection,
    output: &Path,
) -> leadlens::error::Result<()> {
    let data = load_datasets(config, source)?;
    let selection = selection_for(&data, filters)?;
    let (leads, spend) = apply_filters(&data.leads, &data.spend, &selection)?;
    let mut table = metrics::leads_per_10k_sends(
        &leads,
        &spend,
        &config.pricing.sends,
        top_n.unwrap_or(config.defaults.top_n),
        direction,
    )?;
    save_csv(&mut table, output)?;
    println!("Wrote {} rows to {}", table.height(), output.display());
    Ok(())
}

fn handle_options(config: &AppConfig, source: &SourceArgs) -> leadlens::error::Result<()> {
    let data = load_datasets(config, source)?;
    let options = data.filter_options()?;
    let fmt_date = |d: Option<NaiveDate>| d.map_or_else(|| "—".to_owned(), |d| d.to_string());

    println!(
        "Lead dates: {} to {}",
        fmt_date(options.min_date),
        fmt_date(options.max_date)
    );
    for dimension in Dimension::ALL {
        println!("{dimension}: {}", options.values(dimension).join(", "));
    }
    Ok(())
}
