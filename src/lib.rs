//! # leadlens - lead funnel analytics
//!
//! leadlens turns two exports into the figures a sales and marketing team
//! reviews: a CRM deal export (one row per lead) and a marketing-spend export
//! (sends per segment and day).
//!
//! ## Pipeline
//!
//! ```text
//! raw CSVs ─> normalize_leads / normalize_spend ─> canonical tables
//!          ─> apply_filters(selection)          ─> filtered tables
//!          ─> metrics::*                        ─> KPIs and aggregate tables
//! ```
//!
//! ```no_run
//! use leadlens::dashboard::{self, Pricing, metrics};
//! use std::path::Path;
//!
//! # fn example() -> leadlens::error::Result<()> {
//! let pricing = Pricing::default();
//! let data = dashboard::Datasets::load(
//!     Path::new("hubspot.csv"),
//!     Path::new("gasto.csv"),
//!     &pricing,
//! )?;
//!
//! let options = data.filter_options()?;
//! if let Some(selection) = options.default_selection() {
//!     let (leads, spend) = dashboard::apply_filters(&data.leads, &data.spend, &selection)?;
//!     let roi = metrics::roi_by_segment(&leads, &spend, 5, Default::default())?;
//!     println!("{roi}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`dashboard`]: normalizers, filter engine and metrics
//! - [`config`]: persisted settings (locale, unit costs, report defaults)
//! - [`error`]: error types and handling utilities
//! - [`logging`]: console and rolling-file tracing setup
//! - [`utils`]: display formatting

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod utils;
