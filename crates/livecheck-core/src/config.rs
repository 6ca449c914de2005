use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::CheckError;

pub const DEFAULT_BASE_URL: &str = "https://api.twitch.tv/kraken";

pub const ENV_BASE_URL: &str = "LIVECHECK_BASE_URL";
pub const ENV_OAUTH_TOKEN: &str = "LIVECHECK_OAUTH_TOKEN";
pub const ENV_TIMEOUT_MS: &str = "LIVECHECK_TIMEOUT_MS";

/// Settings for a live-channel query.
///
/// The credential and endpoint are plain data handed to each call; nothing
/// here is cached between requests.
#[derive(Clone, PartialEq, Eq)]
pub struct CheckerConfig {
    /// API root; the `streams` endpoint is resolved beneath it.
    pub base_url: Url,
    /// Sent as the `oauth_token` query parameter when present.
    pub oauth_token: Option<String>,
    /// Upper bound on a single request, connect included.
    pub request_timeout: Duration,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            oauth_token: None,
            request_timeout: Duration::from_secs(10),
        }
    }
}

// Hand-written so the token never ends up in logs.
impl fmt::Debug for CheckerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckerConfig")
            .field("base_url", &self.base_url.as_str())
            .field(
                "oauth_token",
                &self.oauth_token.as_ref().map(|_| "<redacted>"),
            )
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl CheckerConfig {
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, CheckError> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    pub fn with_oauth_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.oauth_token = if token.is_empty() { None } else { Some(token) };
        self
    }

    pub fn with_request_timeout(mut self, ms: u64) -> Self {
        self.request_timeout = Duration::from_millis(ms);
        self
    }

    /// Defaults overlaid with `LIVECHECK_*` environment variables.
    pub fn from_env() -> Result<Self, CheckError> {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Applies whichever of the `LIVECHECK_*` keys `lookup` resolves.
    pub fn overlay<F>(mut self, lookup: F) -> Result<Self, CheckError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self = self.with_base_url(&base_url)?;
        }
        if let Some(token) = lookup(ENV_OAUTH_TOKEN) {
            self = self.with_oauth_token(token);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            let ms = raw.trim().parse::<u64>().map_err(|e| {
                CheckError::Config(format!("{ENV_TIMEOUT_MS} must be milliseconds: {raw} ({e})"))
            })?;
            if ms == 0 {
                return Err(CheckError::Config(format!(
                    "{ENV_TIMEOUT_MS} must be greater than zero"
                )));
            }
            self = self.with_request_timeout(ms);
        }
        Ok(self)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, CheckError> {
    let url = Url::parse(raw).map_err(|e| CheckError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(CheckError::InvalidUrl {
            url: raw.to_string(),
            reason: "scheme must be http or https".into(),
        });
    }
    if url.cannot_be_a_base() {
        return Err(CheckError::InvalidUrl {
            url: raw.to_string(),
            reason: "URL cannot carry a path".into(),
        });
    }
    Ok(url)
}
