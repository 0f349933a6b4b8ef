//! # iqama-scrape
//!
//! Iqama time extraction for the iqama scene switcher.
//!
//! This crate fetches a masjid's public slides page and extracts the
//! day's iqama times with CSS selectors. No API keys, no external
//! services, no user setup required. It compiles into the switcher's
//! binary as a library dependency.
//!
//! ## Design
//!
//! - Fetches the slides page over HTTPS with a bounded timeout
//! - Matches utility-class substrings, so cosmetic restyles don't break it
//! - Per-card extraction: one bad card never discards the others
//! - Normalizes `H:MM AM|PM` text into 24-hour [`chrono::NaiveTime`]
//! - Total failure is an explicit error value, never a panic

pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod slides;
pub mod types;

pub use config::{ScrapeConfig, DEFAULT_SLIDES_URL};
pub use error::{Result, ScrapeError};
pub use slides::SlidesClient;
pub use types::{IqamaTimes, Prayer};

/// Fetch today's iqama times from the configured slides page.
///
/// Convenience wrapper constructing a [`SlidesClient`] for one fetch.
/// The returned map may be partial or empty: cards that fail to parse
/// are skipped individually.
///
/// # Errors
///
/// Returns [`ScrapeError::Config`] for an invalid configuration and
/// [`ScrapeError::Http`]/[`ScrapeError::Timeout`] when the page cannot
/// be fetched.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> iqama_scrape::Result<()> {
/// let config = iqama_scrape::ScrapeConfig::default();
/// let times = iqama_scrape::fetch_iqama_times(&config).await?;
/// for (prayer, time) in &times {
///     println!("{prayer}: {time}");
/// }
/// # Ok(())
/// # }
/// ```
pub async fn fetch_iqama_times(config: &ScrapeConfig) -> Result<IqamaTimes> {
    SlidesClient::new(config.clone()).fetch_iqama_times().await
}
