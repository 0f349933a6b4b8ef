//! Core types for prayers and per-day iqama times.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The five daily prayers whose iqama times appear on the slides page.
///
/// Ordering follows the order of the day, so iterating an [`IqamaTimes`]
/// map visits prayers chronologically on any normal day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prayer {
    /// Dawn prayer.
    Fajr,
    /// Midday prayer. Superseded by Jumu'ah on Fridays at most sites.
    Dhuhr,
    /// Afternoon prayer.
    Asr,
    /// Sunset prayer.
    Maghrib,
    /// Night prayer.
    Isha,
}

impl Prayer {
    /// Returns the display name of this prayer.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fajr => "Fajr",
            Self::Dhuhr => "Dhuhr",
            Self::Asr => "Asr",
            Self::Maghrib => "Maghrib",
            Self::Isha => "Isha",
        }
    }

    /// Returns all prayers in day order.
    pub fn all() -> &'static [Prayer] {
        &[
            Self::Fajr,
            Self::Dhuhr,
            Self::Asr,
            Self::Maghrib,
            Self::Isha,
        ]
    }

    /// Case-insensitive lookup for labels found in page markup.
    ///
    /// Returns `None` for anything that is not one of the five prayers
    /// (the slides page also carries labels like "Sunrise" and "Jumuah"
    /// that are not individually scheduled).
    pub fn from_label(label: &str) -> Option<Prayer> {
        match label.trim().to_ascii_lowercase().as_str() {
            "fajr" => Some(Self::Fajr),
            "dhuhr" => Some(Self::Dhuhr),
            "asr" => Some(Self::Asr),
            "maghrib" => Some(Self::Maghrib),
            "isha" => Some(Self::Isha),
            _ => None,
        }
    }
}

impl fmt::Display for Prayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Iqama times for one calendar day, keyed by prayer.
///
/// May be empty (total scrape failure) or partial (some prayers missing
/// or unparsable). Keys are unique by construction; inserting a prayer
/// twice keeps the later value.
pub type IqamaTimes = BTreeMap<Prayer, NaiveTime>;
