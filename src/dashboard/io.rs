use crate::error::{LeadlensError, Result, ResultExt as _};
use polars::prelude::*;
use std::path::{Path, PathBuf};

/// Reads a CSV export with every column as text; the normalizers own the
/// typing of each column.
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(LeadlensError::InvalidPath(format!(
            "{} is not a readable file",
            path.display()
        )));
    }

    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()?
        .collect()
        .with_context(|| format!("Failed to read CSV {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "Loaded CSV"
    );
    Ok(df)
}

pub fn save_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
    CsvWriter::new(file)
        .include_header(true)
        .finish(df)
        .context("Failed to write CSV file")?;

    tracing::info!(path = %path.display(), rows = df.height(), "Saved CSV");
    Ok(())
}

/// The two exports picked out of a batch of uploads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Uploads {
    pub leads: Option<PathBuf>,
    pub spend: Option<PathBuf>,
}

impl Uploads {
    pub fn is_complete(&self) -> bool {
        self.leads.is_some() && self.spend.is_some()
    }
}

/// Sorts uploads by file name: a name containing `hubspot` is the lead
/// export, one containing `gasto` the spend export (case-insensitive). Later
/// files replace earlier ones; anything else is ignored.
pub fn classify_uploads<P: AsRef<Path>>(paths: &[P]) -> Uploads {
    let mut uploads = Uploads::default();
    for path in paths {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if name.contains("hubspot") {
            uploads.leads = Some(path.to_path_buf());
        } else if name.contains("gasto") {
            uploads.spend = Some(path.to_path_buf());
        } else {
            tracing::warn!(path = %path.display(), "Ignoring upload that is neither a lead nor a spend export");
        }
    }
    uploads
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_uploads_by_name() {
        let uploads = classify_uploads(&[
            "/tmp/Export_HubSpot_2024.csv",
            "/tmp/notes.csv",
            "/tmp/GASTO_marco.csv",
        ]);
        assert_eq!(uploads.leads, Some(PathBuf::from("/tmp/Export_HubSpot_2024.csv")));
        assert_eq!(uploads.spend, Some(PathBuf::from("/tmp/GASTO_marco.csv")));
        assert!(uploads.is_complete());

        let partial = classify_uploads(&["/tmp/hubspot.csv"]);
        assert!(!partial.is_complete());
    }

    #[test]
    fn test_csv_round_trip() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.csv");
        let mut df = df!["Canal" => ["SMS", "RCS"], "Quantidade" => ["10", "20"]]?;
        save_csv(&mut df, &path)?;

        let back = load_csv(&path)?;
        assert_eq!(back.shape(), (2, 2));
        assert_eq!(back.column("Canal")?.dtype(), &DataType::String);
        Ok(())
    }

    #[test]
    fn test_load_missing_file_is_invalid_path() {
        let err = load_csv(Path::new("/definitely/not/here.csv")).expect_err("missing file");
        assert!(matches!(err, LeadlensError::InvalidPath(_)));
    }
}
