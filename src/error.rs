//! Centralized error handling for leadlens.
//!
//! The pipeline recovers locally from bad cells (unparseable dates, unknown
//! channels, empty denominators). What reaches this module is everything the
//! pipeline cannot recover from:
//!
//! - an input table that is missing required columns, or a missing input file,
//!   surfaced as [`LeadlensError::MissingColumns`] / [`LeadlensError::NotReady`]
//!   so the presentation layer can render "not ready" instead of charts;
//! - unreadable files and engine failures, surfaced as
//!   [`LeadlensError::Io`] / [`LeadlensError::DataProcessing`].
//!
//! ```
//! use leadlens::error::LeadlensError;
//!
//! fn describe(err: &LeadlensError) -> &'static str {
//!     if err.is_not_ready() { "waiting for uploads" } else { "failed" }
//! }
//! ```

use std::fmt;

/// Main error type for leadlens operations.
#[derive(Debug)]
pub enum LeadlensError {
    /// I/O errors (file operations)
    Io(std::io::Error),

    /// Data processing errors (Polars, casting, joins)
    DataProcessing(String),

    /// Configuration errors
    Config(String),

    /// File not found or invalid path
    InvalidPath(String),

    /// A source table lacks columns the normalizer cannot do without
    MissingColumns { table: String, columns: Vec<String> },

    /// One of the two input exports has not been provided yet
    NotReady(String),

    /// Generic error with context
    Other(String),
}

impl LeadlensError {
    /// True for the conditions the presentation layer shows as "not ready"
    /// rather than as a failure.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady(_) | Self::MissingColumns { .. })
    }
}

impl fmt::Display for LeadlensError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::InvalidPath(msg) => write!(f, "Invalid path: {msg}"),
            Self::MissingColumns { table, columns } => write!(
                f,
                "Table '{table}' is missing required columns: {}",
                columns.join(", ")
            ),
            Self::NotReady(msg) => write!(f, "Not ready: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for LeadlensError {}

impl From<std::io::Error> for LeadlensError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for LeadlensError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for LeadlensError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for LeadlensError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

impl From<LeadlensError> for String {
    fn from(err: LeadlensError) -> Self {
        err.to_string()
    }
}

/// Result type alias for leadlens operations.
pub type Result<T> = std::result::Result<T, LeadlensError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<LeadlensError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| wrap(e.into(), msg.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| wrap(e.into(), f()))
    }
}

// "Not ready" conditions keep their variant so callers can still branch on them.
fn wrap(err: LeadlensError, msg: String) -> LeadlensError {
    match err {
        LeadlensError::NotReady(inner) => LeadlensError::NotReady(format!("{msg}: {inner}")),
        err @ LeadlensError::MissingColumns { .. } => err,
        other => LeadlensError::Other(format!("{msg}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LeadlensError::DataProcessing("column not found".to_owned());
        assert_eq!(err.to_string(), "Data processing error: column not found");
    }

    #[test]
    fn test_missing_columns_display() {
        let err = LeadlensError::MissingColumns {
            table: "spend".to_owned(),
            columns: vec!["Canal".to_owned(), "Data".to_owned()],
        };
        assert_eq!(
            err.to_string(),
            "Table 'spend' is missing required columns: Canal, Data"
        );
        assert!(err.is_not_ready());
    }

    #[test]
    fn test_result_context() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "leads.csv",
        ));

        let result: Result<()> = result.context("Failed to read leads");
        let err = result.expect_err("context keeps the error");
        assert!(err.to_string().contains("Failed to read leads"));
        assert!(!err.is_not_ready());
    }

    #[test]
    fn test_context_preserves_not_ready() {
        let result: Result<()> = Err(LeadlensError::NotReady("no spend export".to_owned()));
        let err = result.context("Loading uploads").expect_err("still an error");
        assert!(err.is_not_ready());
        assert!(err.to_string().contains("no spend export"));
    }
}
