//! Error types for the iqama-scrape crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. Callers that only want "times or nothing"
//! can collapse any of these into an empty time set.

/// Errors that can occur while fetching and extracting iqama times.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// An HTTP request to the slides page failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The slides page did not respond within the configured timeout.
    #[error("fetch timed out: {0}")]
    Timeout(String),

    /// Failed to parse the slides page HTML.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid scrape configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for iqama-scrape results.
pub type Result<T> = std::result::Result<T, ScrapeError>;
