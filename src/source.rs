//! Iqama time acquisition.
//!
//! Wraps the scraper so a failed fetch degrades to an empty set instead
//! of an error. The daily cycle then runs on whatever manual fallback
//! times are configured.

use iqama_scrape::{IqamaTimes, ScrapeConfig};
use tracing::{info, warn};

/// Fetch today's iqama times, degrading to an empty set on any failure.
pub async fn resolve(config: &ScrapeConfig) -> IqamaTimes {
    match iqama_scrape::fetch_iqama_times(config).await {
        Ok(times) => {
            info!(count = times.len(), "iqama times acquired");
            times
        }
        Err(err) => {
            warn!(
                error = %err,
                url = %config.url,
                "acquisition failed, continuing without scraped times"
            );
            IqamaTimes::new()
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[tokio::test]
    async fn unreachable_source_resolves_empty() {
        let config = ScrapeConfig {
            url: "http://127.0.0.1:9/601/slides".into(),
            timeout_seconds: 2,
            ..Default::default()
        };
        assert!(resolve(&config).await.is_empty());
    }

    #[tokio::test]
    async fn invalid_config_resolves_empty() {
        let config = ScrapeConfig {
            url: String::new(),
            ..Default::default()
        };
        assert!(resolve(&config).await.is_empty());
    }
}
