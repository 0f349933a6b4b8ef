//! Scrape configuration with sensible defaults.
//!
//! [`ScrapeConfig`] controls which page is fetched and how long to wait
//! for it. Defaults point at the site's slides page with the bound the
//! scheduling engine expects (a failed day falls back to manual times,
//! so a generous-but-finite timeout is correct).

use crate::error::ScrapeError;
use serde::{Deserialize, Serialize};
use url::Url;

/// Slides page scraped when no URL is configured.
pub const DEFAULT_SLIDES_URL: &str = "https://themasjidapp.org/601/slides";

/// Configuration for fetching the slides page.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour. Embeds cleanly in a larger TOML
/// config as a `[scrape]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Page to fetch iqama times from.
    pub url: String,
    /// HTTP request timeout in seconds.
    pub timeout_seconds: u64,
    /// Custom User-Agent string. If `None`, a built-in browser UA is used.
    pub user_agent: Option<String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SLIDES_URL.to_string(),
            timeout_seconds: 30,
            user_agent: None,
        }
    }
}

impl ScrapeConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `url` must parse as an `http` or `https` URL
    /// - `timeout_seconds` must be greater than 0
    pub fn validate(&self) -> Result<(), ScrapeError> {
        if self.url.trim().is_empty() {
            return Err(ScrapeError::Config("url must not be empty".into()));
        }
        let parsed = Url::parse(&self.url)
            .map_err(|e| ScrapeError::Config(format!("url is not a valid URL: {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ScrapeError::Config(format!(
                "url must be http or https, got {}",
                parsed.scheme()
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(ScrapeError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
