use crate::dashboard::schema::Pricing;
use crate::dashboard::types::CohortEvent;
use crate::error::{LeadlensError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Locale used to render currency. Resolved once at start-up and never
/// changed afterwards.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LocaleSettings {
    pub primary: String,
    pub fallback: String,
}

impl Default for LocaleSettings {
    fn default() -> Self {
        Self {
            primary: "pt_BR.UTF-8".to_owned(),
            fallback: "C.UTF-8".to_owned(),
        }
    }
}

/// Starting values for the report controls.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ReportDefaults {
    pub top_n: usize,
    pub cohort_event: CohortEvent,
}

impl Default for ReportDefaults {
    fn default() -> Self {
        Self {
            top_n: 5,
            cohort_event: CohortEvent::Paid,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub locale: LocaleSettings,
    pub pricing: Pricing,
    pub defaults: ReportDefaults,
}

impl AppConfig {
    /// The locale currency is rendered in: the primary locale if the platform
    /// has it, the fallback otherwise.
    pub fn resolve_locale(&self) -> &str {
        if locale_available(&self.locale.primary) {
            &self.locale.primary
        } else {
            tracing::warn!(
                primary = %self.locale.primary,
                fallback = %self.locale.fallback,
                "Primary locale unavailable, using fallback"
            );
            &self.locale.fallback
        }
    }
}

// The process environment is the only locale source consulted.
fn locale_available(name: &str) -> bool {
    let wanted = name.to_lowercase().replace("utf-8", "utf8");
    ["LC_ALL", "LC_MONETARY", "LANG"].iter().any(|var| {
        std::env::var(var)
            .is_ok_and(|v| v.to_lowercase().replace("utf-8", "utf8") == wanted)
    })
}

pub fn get_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| {
        LeadlensError::Config("Failed to determine config directory".to_owned())
    })?;
    Ok(base.join("leadlens").join("config.json"))
}

/// Reads a config file; a missing file yields the defaults.
pub fn load_from_path(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Loads the user config, falling back to defaults when it is absent or
/// unreadable.
pub fn load_app_config() -> AppConfig {
    let loaded = get_config_path().and_then(|path| load_from_path(&path));
    match loaded {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Using default configuration: {err}");
            AppConfig::default()
        }
    }
}

pub fn save_to_path(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn save_app_config(config: &AppConfig) -> Result<()> {
    save_to_path(config, &get_config_path()?)
}

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Process-wide configuration, loaded on first use.
pub fn app_config() -> &'static AppConfig {
    APP_CONFIG.get_or_init(load_app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = load_from_path(&dir.path().join("absent.json"))?;
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.defaults.top_n, 5);
        Ok(())
    }

    #[test]
    fn test_save_then_load() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.defaults.top_n = 12;
        config.defaults.cohort_event = CohortEvent::Lost;
        save_to_path(&config, &path)?;

        assert_eq!(load_from_path(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_partial_file_fills_defaults() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"defaults": {"top_n": 8, "cohort_event": "negotiation"}}"#)?;

        let config = load_from_path(&path)?;
        assert_eq!(config.defaults.top_n, 8);
        assert_eq!(config.defaults.cohort_event, CohortEvent::Negotiation);
        assert_eq!(config.pricing, Pricing::default());
        Ok(())
    }
}
