//! 12-hour clock text normalization.
//!
//! The slides page renders times as `H:MM AM|PM`, sometimes split across
//! lines or with stray whitespace inside the string. Parsing goes through
//! chrono's `%I:%M %p`, which enforces the 1 to 12 hour range and folds
//! `12:xx AM` to `00:xx` and `12:xx PM` to `12:xx`.

use chrono::NaiveTime;

/// Parse 12-hour clock text into a 24-hour [`NaiveTime`].
///
/// Case-insensitive and whitespace-tolerant. Returns `None` for anything
/// malformed, including hours outside 1 to 12 ("13:05 PM" is rejected, not
/// reinterpreted).
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use iqama_scrape::clock::parse_clock_12h;
///
/// let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
/// assert_eq!(parse_clock_12h("12:00 AM"), Some(midnight));
/// assert_eq!(parse_clock_12h("13:05 PM"), None);
/// ```
pub fn parse_clock_12h(raw: &str) -> Option<NaiveTime> {
    let cleaned = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveTime::parse_from_str(&cleaned, "%I:%M %p").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(hour: u32, min: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, min, 0).expect("valid test time")
    }

    #[test]
    fn midnight_is_zero_hour() {
        assert_eq!(parse_clock_12h("12:00 AM"), Some(t(0, 0)));
        assert_eq!(parse_clock_12h("12:30 am"), Some(t(0, 30)));
    }

    #[test]
    fn noon_stays_twelve() {
        assert_eq!(parse_clock_12h("12:00 PM"), Some(t(12, 0)));
        assert_eq!(parse_clock_12h("12:45 pm"), Some(t(12, 45)));
    }

    #[test]
    fn afternoon_adds_twelve() {
        assert_eq!(parse_clock_12h("1:05 pm"), Some(t(13, 5)));
        assert_eq!(parse_clock_12h("6:15 PM"), Some(t(18, 15)));
        assert_eq!(parse_clock_12h("11:59 PM"), Some(t(23, 59)));
    }

    #[test]
    fn morning_passes_through() {
        assert_eq!(parse_clock_12h("6:15 AM"), Some(t(6, 15)));
        assert_eq!(parse_clock_12h("07:05 AM"), Some(t(7, 5)));
        assert_eq!(parse_clock_12h("11:00 am"), Some(t(11, 0)));
    }

    #[test]
    fn invalid_hour_rejected() {
        assert_eq!(parse_clock_12h("13:05 PM"), None);
        assert_eq!(parse_clock_12h("0:30 AM"), None);
        assert_eq!(parse_clock_12h("99:99 PM"), None);
    }

    #[test]
    fn invalid_minute_rejected() {
        assert_eq!(parse_clock_12h("7:60 AM"), None);
    }

    #[test]
    fn whitespace_tolerated() {
        assert_eq!(parse_clock_12h("  7:30  PM  "), Some(t(19, 30)));
        assert_eq!(parse_clock_12h("6:15\nPM"), Some(t(18, 15)));
        assert_eq!(parse_clock_12h("6:15PM"), Some(t(18, 15)));
    }

    #[test]
    fn garbage_rejected() {
        assert_eq!(parse_clock_12h(""), None);
        assert_eq!(parse_clock_12h("Iqama"), None);
        assert_eq!(parse_clock_12h("6:15"), None);
        assert_eq!(parse_clock_12h("six fifteen AM"), None);
    }
}
