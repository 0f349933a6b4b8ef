//! HTTP client construction for the slides page fetch.
//!
//! Provides a configured [`reqwest::Client`] with a browser-like
//! User-Agent and the timeout from config. The slides page is public and
//! served to any browser, so one pinned UA is enough.

use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use std::time::Duration;

/// Default User-Agent when none is configured.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Build a [`reqwest::Client`] configured for the slides page.
///
/// The client has:
/// - Timeout from config
/// - Configured or default User-Agent
/// - Brotli and gzip decompression
/// - Redirects limited to 10
///
/// # Errors
///
/// Returns [`ScrapeError::Http`] if the client cannot be constructed.
pub fn build_client(config: &ScrapeConfig) -> Result<reqwest::Client, ScrapeError> {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => DEFAULT_USER_AGENT.to_owned(),
    };

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| ScrapeError::Http(format!("failed to build HTTP client: {e}")))
}
