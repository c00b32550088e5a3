use crate::error::{Error, Result};
use crate::selection::DefaultSelection;
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_GIST_ID: &str = "58caf316abf501f85f83f128909cbc4d";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub dashboard: DashboardConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Gist consulted when no other source is given. Empty disables it.
    pub gist_id: String,
    pub github_api_url: String,
    pub data_url: Option<String>,
    pub fetch_timeout_secs: u64,
    /// Environment variable holding an optional GitHub token.
    pub github_token_env: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            gist_id: DEFAULT_GIST_ID.into(),
            github_api_url: "https://api.github.com".into(),
            data_url: None,
            fetch_timeout_secs: 15,
            github_token_env: "GITHUB_TOKEN".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub default_selection: DefaultSelection,
    pub decimals: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_selection: DefaultSelection::FirstTwo,
            decimals: crate::analysis::aggregator::DEFAULT_DECIMALS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "output/report.html".into(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| Error::config(format!("{}: {e}", path.display())))
    }

    /// Loads `path` when it exists, otherwise the built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.fetch_timeout_secs == 0 {
            return Err(Error::config("sources.fetch_timeout_secs must be positive"));
        }
        if self.sources.github_api_url.trim().is_empty() {
            return Err(Error::config("sources.github_api_url must not be empty"));
        }
        if self.dashboard.decimals > 6 {
            return Err(Error::config("dashboard.decimals must be at most 6"));
        }
        if self.output.path.trim().is_empty() {
            return Err(Error::config("output.path must not be empty"));
        }
        Ok(())
    }

    pub fn github_token(&self) -> Option<String> {
        std::env::var(&self.sources.github_token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[dashboard]\ndefault_selection = \"all\"\n\n[sources]\nfetch_timeout_secs = 5"
        )
        .unwrap();

        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.dashboard.default_selection, DefaultSelection::All);
        assert_eq!(cfg.dashboard.decimals, 1);
        assert_eq!(cfg.sources.fetch_timeout_secs, 5);
        assert_eq!(cfg.sources.gist_id, DEFAULT_GIST_ID);
        assert_eq!(cfg.output.path, "output/report.html");
        cfg.validate().unwrap();
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[dashboard\n").unwrap();
        assert!(matches!(Config::load(file.path()), Err(Error::Config(_))));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.sources.fetch_timeout_secs, 15);
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut cfg = Config::default();
        cfg.sources.fetch_timeout_secs = 0;
        assert!(cfg.validate().is_err());
    }
}
