//! TOML configuration file schema and parsing.
//!
//! Example config file:
//!
//! ```toml
//! channels = ["esltv_dota", "beyondthesummit"]
//!
//! [api]
//! base_url = "https://api.twitch.tv/kraken"
//! oauth_token = "your-token"
//! timeout_ms = 10000
//!
//! [output]
//! log_format = "pretty"
//! format = "text"
//! ```

use std::path::Path;

use clap::ValueEnum;
use serde::Deserialize;

use livecheck_core::CheckerConfig;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub channels: Vec<String>,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub oauth_token: Option<String>,

    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One line per channel.
    #[default]
    Text,
    /// The raw stream records as a JSON array.
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_log_format")]
    pub log_format: String,

    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_format: default_log_format(),
            format: OutputFormat::default(),
        }
    }
}

fn default_log_format() -> String {
    "pretty".into()
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(ref base_url) = self.api.base_url {
            let parsed = url::Url::parse(base_url)
                .map_err(|e| format!("Invalid api.base_url: {} ({})", base_url, e))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(format!("api.base_url must use http or https: {}", base_url));
            }
        }

        if self.api.timeout_ms == Some(0) {
            return Err("api.timeout_ms must be greater than zero".into());
        }

        if let Some(i) = self.channels.iter().position(|c| c.trim().is_empty()) {
            return Err(format!("Channel name at index {} is empty", i));
        }

        match self.output.log_format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(format!(
                    "Invalid log_format '{}': must be 'pretty' or 'json'",
                    other
                ));
            }
        }

        Ok(())
    }

    /// File settings first, then whatever `lookup` resolves for the
    /// `LIVECHECK_*` environment keys.
    pub fn to_checker_config<F>(&self, lookup: F) -> Result<CheckerConfig, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut c = CheckerConfig::default();
        if let Some(ref base_url) = self.api.base_url {
            c = c.with_base_url(base_url).map_err(|e| e.to_string())?;
        }
        if let Some(ref token) = self.api.oauth_token {
            c = c.with_oauth_token(token.clone());
        }
        if let Some(ms) = self.api.timeout_ms {
            c = c.with_request_timeout(ms);
        }
        c.overlay(lookup).map_err(|e| e.to_string())
    }
}
