//! The Masjid App slides page scraper.
//!
//! The slides page renders one card per prayer. Each card carries the
//! prayer name in a large bold label and the iqama time next to an
//! "Iqama" caption. Class names are utility-generated and change between
//! deployments, so selectors match on stable substrings rather than
//! exact class lists.

use crate::clock::parse_clock_12h;
use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::http;
use crate::types::{IqamaTimes, Prayer};
use scraper::{ElementRef, Html, Selector};

/// Fetches and extracts a day's iqama times from the slides page.
pub struct SlidesClient {
    config: ScrapeConfig,
}

impl SlidesClient {
    /// Create a client for the given configuration.
    pub fn new(config: ScrapeConfig) -> Self {
        Self { config }
    }

    /// Fetch the slides page and extract iqama times.
    ///
    /// Extraction is per-card: a card with an unknown label, missing
    /// caption, or unparsable time is skipped with a warning and never
    /// fails the whole set. The returned map may therefore be partial
    /// or empty even on a successful fetch.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Timeout`] when the page does not respond
    /// within the configured bound, [`ScrapeError::Http`] for any other
    /// transport or status failure, and [`ScrapeError::Config`] when the
    /// configuration is invalid.
    pub async fn fetch_iqama_times(&self) -> Result<IqamaTimes, ScrapeError> {
        self.config.validate()?;
        tracing::debug!(url = %self.config.url, "fetching slides page");

        let client = http::build_client(&self.config)?;
        let response = client
            .get(&self.config.url)
            .header("Accept", "text/html,application/xhtml+xml")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScrapeError::Timeout(format!("slides request timed out: {e}"))
                } else {
                    ScrapeError::Http(format!("slides request failed: {e}"))
                }
            })?
            .error_for_status()
            .map_err(|e| ScrapeError::Http(format!("slides HTTP error: {e}")))?;

        let html = response
            .text()
            .await
            .map_err(|e| ScrapeError::Http(format!("slides response read failed: {e}")))?;

        tracing::trace!(bytes = html.len(), "slides response received");

        parse_slides_html(&html)
    }
}

/// Parse slides HTML into per-prayer iqama times.
///
/// Extracted as a separate function for testability with mock HTML.
/// If the page carries two cards for the same prayer, the later one wins.
pub fn parse_slides_html(html: &str) -> Result<IqamaTimes, ScrapeError> {
    let document = Html::parse_document(html);

    // Prayer names sit in bold large-type labels; each label lives inside
    // a card that also holds the "Iqama" caption with the time beside it.
    let label_sel = Selector::parse(r#"[class*="font-bold"][class*="text-3vvh"]"#)
        .map_err(|e| ScrapeError::Parse(format!("invalid label selector: {e:?}")))?;
    let card_sel = Selector::parse(r#"[class*="w-12vvw"]"#)
        .map_err(|e| ScrapeError::Parse(format!("invalid card selector: {e:?}")))?;
    let caption_sel = Selector::parse(r#"[class*="font-bold"][class*="text-2vvh"]"#)
        .map_err(|e| ScrapeError::Parse(format!("invalid caption selector: {e:?}")))?;

    let mut times = IqamaTimes::new();

    for label in document.select(&label_sel) {
        let name = label.text().collect::<String>().trim().to_string();
        let prayer = match Prayer::from_label(&name) {
            Some(p) => p,
            None => continue,
        };

        let card = match enclosing_card(label, &card_sel) {
            Some(el) => el,
            None => {
                tracing::warn!(prayer = %prayer, "no card element around prayer label");
                continue;
            }
        };

        let raw = match iqama_text(card, &caption_sel) {
            Some(t) => t,
            None => {
                tracing::warn!(prayer = %prayer, "no iqama caption inside card");
                continue;
            }
        };

        match parse_clock_12h(&raw) {
            Some(time) => {
                tracing::debug!(prayer = %prayer, time = %time, "iqama time parsed");
                times.insert(prayer, time);
            }
            None => tracing::warn!(prayer = %prayer, raw = %raw, "unparsable iqama time"),
        }
    }

    tracing::debug!(count = times.len(), "slides parsed");
    Ok(times)
}

/// Closest ancestor card around a prayer label, falling back to the
/// grandparent element when the markup drops the card class.
fn enclosing_card<'a>(label: ElementRef<'a>, card_sel: &Selector) -> Option<ElementRef<'a>> {
    let ancestors: Vec<ElementRef<'a>> = label.ancestors().filter_map(ElementRef::wrap).collect();
    ancestors
        .iter()
        .find(|el| card_sel.matches(el))
        .or_else(|| ancestors.get(1))
        .copied()
}

/// Raw time text next to the "Iqama" caption inside a card.
fn iqama_text(card: ElementRef<'_>, caption_sel: &Selector) -> Option<String> {
    let caption = card.select(caption_sel).next()?;
    let time_el = caption.next_siblings().find_map(ElementRef::wrap)?;
    let text = time_el.text().collect::<String>();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
