//! Jumu'ah override rules.
//!
//! On the configured weekday a fixed window replaces the individually
//! scheduled prayers it supersedes. The decision is a pure function of
//! the day's weekday; nothing else about the date matters.

use crate::config::JumuahConfig;
use crate::error::Result;
use chrono::{Datelike, NaiveDate, NaiveTime};
use iqama_scrape::Prayer;
use std::collections::BTreeSet;

/// The resolved override window for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumuahWindow {
    /// Window start, local time-of-day.
    pub start: NaiveTime,
    /// Window end, local time-of-day. After `start` per config validation.
    pub end: NaiveTime,
    /// Prayers the window replaces on its weekday.
    pub supersedes: BTreeSet<Prayer>,
}

/// Returns the override window for `day`, if one applies.
///
/// `None` when the override is disabled or `day` falls on a different
/// weekday than configured.
///
/// # Errors
///
/// Returns a config error for unparsable weekday or time strings. The
/// startup validation pass makes this unreachable in the daemon, but the
/// parse stays checked rather than assumed.
pub fn jumuah_window_for(day: NaiveDate, config: &JumuahConfig) -> Result<Option<JumuahWindow>> {
    if !config.enabled {
        return Ok(None);
    }
    if day.weekday() != config.weekday()? {
        return Ok(None);
    }
    Ok(Some(JumuahWindow {
        start: config.start_time()?,
        end: config.end_time()?,
        supersedes: config.supersedes.iter().copied().collect(),
    }))
}
