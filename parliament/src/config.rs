use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ParliamentError, ParliamentResult};

/// Default backend base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
/// Default cadence between revealed statements.
pub const DEFAULT_REVEAL_INTERVAL_MS: u64 = 1000;
/// Default number of papers requested from the import endpoint.
pub const DEFAULT_MAX_RESULTS: u32 = 6;

/// Top-level configuration for a parliament session.
#[derive(Debug, Clone, PartialEq)]
pub struct ParliamentConfig {
    /// Backend base URL (no trailing slash needed).
    pub api_base_url: String,
    /// Paper source segment of the import endpoint (e.g. "arxiv").
    pub paper_source: String,
    /// Papers requested per import.
    pub max_results: u32,
    /// Delay between two revealed statements.
    pub reveal_interval_ms: u64,
    /// HTTP request timeout. Debate generation is slow on the backend.
    pub request_timeout_secs: u64,
    /// JSON file backing the session store (None = in-memory only).
    pub store_path: Option<PathBuf>,
}

impl Default for ParliamentConfig {
    fn default() -> Self {
        Self {
            api_base_url: std::env::var("PARLIAMENT_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.into()),
            paper_source: std::env::var("PARLIAMENT_PAPER_SOURCE")
                .unwrap_or_else(|_| "arxiv".into()),
            max_results: env_parse("PARLIAMENT_MAX_RESULTS").unwrap_or(DEFAULT_MAX_RESULTS),
            reveal_interval_ms: env_parse("PARLIAMENT_REVEAL_INTERVAL_MS")
                .unwrap_or(DEFAULT_REVEAL_INTERVAL_MS),
            request_timeout_secs: env_parse("PARLIAMENT_TIMEOUT_SECS").unwrap_or(300),
            store_path: std::env::var("PARLIAMENT_STORE_PATH").ok().map(PathBuf::from),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}

/// Optional overrides read from a TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    api_base_url: Option<String>,
    paper_source: Option<String>,
    max_results: Option<u32>,
    reveal_interval_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    store_path: Option<PathBuf>,
}

impl ParliamentConfig {
    /// Defaults (env-aware) overlaid with the values of a TOML document.
    pub fn from_toml_str(contents: &str) -> ParliamentResult<Self> {
        let file: ConfigFile = toml::from_str(contents)
            .map_err(|e| ParliamentError::config(format!("invalid TOML: {}", e)))?;
        let mut config = Self::default();
        config.apply(file);
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file.
    pub fn load(path: &Path) -> ParliamentResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ParliamentError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    fn apply(&mut self, file: ConfigFile) {
        if let Some(url) = file.api_base_url {
            self.api_base_url = url;
        }
        if let Some(source) = file.paper_source {
            self.paper_source = source;
        }
        if let Some(max) = file.max_results {
            self.max_results = max;
        }
        if let Some(ms) = file.reveal_interval_ms {
            self.reveal_interval_ms = ms;
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if file.store_path.is_some() {
            self.store_path = file.store_path;
        }
    }

    pub fn validate(&self) -> ParliamentResult<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(ParliamentError::config("api_base_url must not be empty"));
        }
        if self.paper_source.trim().is_empty() || self.paper_source.contains('/') {
            return Err(ParliamentError::config(format!(
                "invalid paper_source '{}'",
                self.paper_source
            )));
        }
        if self.max_results == 0 {
            return Err(ParliamentError::config("max_results must be at least 1"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ParliamentError::config(
                "request_timeout_secs must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn reveal_interval(&self) -> Duration {
        Duration::from_millis(self.reveal_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
