//! Configuration types for the scene switcher.
//!
//! Everything the daemon needs lives in one TOML file; OBS connection
//! settings can additionally come from the environment (`.env` friendly)
//! so the password stays out of the config file. All sections default to
//! the site's production values, so an empty file is a valid config.

use crate::error::{Result, SwitcherError};
use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;
use iqama_scrape::{IqamaTimes, Prayer, ScrapeConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Top-level configuration for the switcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitcherConfig {
    /// OBS WebSocket connection settings.
    pub obs: ObsConfig,
    /// Scene names and the prayer-window duration.
    pub scenes: SceneConfig,
    /// Jumu'ah override window.
    pub jumuah: JumuahConfig,
    /// Daily schedule settings (timezone, refresh times, manual fallback).
    pub schedule: ScheduleConfig,
    /// Slides page scrape settings.
    pub scrape: ScrapeConfig,
    /// Log output settings.
    pub log: LogConfig,
}

/// OBS WebSocket connection configuration.
///
/// `OBS_HOST`, `OBS_PORT`, and `OBS_PASSWORD` environment variables
/// override these values (see [`SwitcherConfig::apply_env`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObsConfig {
    /// Host running obs-websocket.
    pub host: String,
    /// obs-websocket port.
    pub port: u16,
    /// obs-websocket password. Empty when the server has auth disabled.
    pub password: String,
    /// Bound on one full scene-change call (connect, handshake, request).
    pub timeout_seconds: u64,
}

impl Default for ObsConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 4455,
            password: String::new(),
            timeout_seconds: 10,
        }
    }
}

impl ObsConfig {
    /// WebSocket endpoint for this configuration.
    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }
}

/// Scene names and prayer-window duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Scene shown outside prayer windows.
    pub default: String,
    /// Scene shown during prayer windows.
    pub prayer: String,
    /// Minutes the prayer scene stays up after each iqama.
    pub prayer_duration_minutes: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            default: "The Masjid App View".to_owned(),
            prayer: "PTZ Camera & Masjid App".to_owned(),
            prayer_duration_minutes: 10,
        }
    }
}

/// Jumu'ah override window configuration.
///
/// On the configured weekday the window replaces the individually
/// scheduled prayers it supersedes; the scene switches at `start` and
/// restores at `end` regardless of the scraped Dhuhr time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JumuahConfig {
    /// Whether the override window is applied at all.
    pub enabled: bool,
    /// Weekday the window applies on ("friday", "fri", ...).
    pub weekday: String,
    /// Window start, `HH:MM` 24-hour.
    pub start: String,
    /// Window end, `HH:MM` 24-hour. Must be after `start`.
    pub end: String,
    /// Prayers never individually scheduled on the window's weekday.
    pub supersedes: Vec<Prayer>,
}

impl Default for JumuahConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            weekday: "friday".to_owned(),
            start: "13:25".to_owned(),
            end: "14:15".to_owned(),
            supersedes: vec![Prayer::Dhuhr],
        }
    }
}

impl JumuahConfig {
    /// Parsed weekday.
    pub fn weekday(&self) -> Result<Weekday> {
        self.weekday
            .parse::<Weekday>()
            .map_err(|_| SwitcherError::Config(format!("invalid jumuah weekday: {}", self.weekday)))
    }

    /// Parsed window start.
    pub fn start_time(&self) -> Result<NaiveTime> {
        parse_hhmm(&self.start, "jumuah.start")
    }

    /// Parsed window end.
    pub fn end_time(&self) -> Result<NaiveTime> {
        parse_hhmm(&self.end, "jumuah.end")
    }
}

/// Daily schedule configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// IANA timezone the masjid operates in. All scheduling happens here.
    pub timezone: String,
    /// Wall-clock times (`HH:MM`) at which the day's schedule is rebuilt.
    pub refresh_times: Vec<String>,
    /// Operator-maintained fallback iqama times (`HH:MM` 24-hour),
    /// used for prayers the scrape did not produce.
    pub manual_times: BTreeMap<Prayer, String>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: "America/New_York".to_owned(),
            refresh_times: vec!["00:05".to_owned(), "12:00".to_owned()],
            manual_times: BTreeMap::new(),
        }
    }
}

impl ScheduleConfig {
    /// Parsed timezone.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| SwitcherError::Config(format!("invalid timezone: {}", self.timezone)))
    }

    /// Parsed refresh times, in config order.
    pub fn refresh_times(&self) -> Result<Vec<NaiveTime>> {
        self.refresh_times
            .iter()
            .map(|s| parse_hhmm(s, "schedule.refresh_times"))
            .collect()
    }

    /// Parsed manual fallback times.
    pub fn manual_fallback(&self) -> Result<IqamaTimes> {
        let mut times = IqamaTimes::new();
        for (prayer, raw) in &self.manual_times {
            let time = parse_hhmm(raw, &format!("schedule.manual_times.{prayer}"))?;
            times.insert(*prayer, time);
        }
        Ok(times)
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Directory for daily-rolling log files. `None` logs to stdout only.
    pub dir: Option<PathBuf>,
}

fn parse_hhmm(raw: &str, field: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| SwitcherError::Config(format!("{field}: expected HH:MM, got {raw:?}")))
}

impl SwitcherConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| SwitcherError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SwitcherError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/iqama/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("iqama").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("iqama")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/iqama-config/config.toml")
        }
    }

    /// Load from an explicit path, or from the default path when it
    /// exists, or fall back to defaults.
    ///
    /// # Errors
    ///
    /// An explicit path that cannot be read is an error; a missing
    /// default path is not.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let default = Self::default_config_path();
                if default.exists() {
                    Self::from_file(&default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Overlay OBS settings from the environment.
    ///
    /// `OBS_HOST` and `OBS_PASSWORD` replace the config values when set
    /// and non-empty; `OBS_PORT` must parse as a port number.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("OBS_HOST")
            && !host.is_empty()
        {
            self.obs.host = host;
        }
        if let Ok(port) = std::env::var("OBS_PORT")
            && !port.is_empty()
        {
            self.obs.port = port
                .parse::<u16>()
                .map_err(|_| SwitcherError::Config(format!("OBS_PORT is not a port: {port:?}")))?;
        }
        if let Ok(password) = std::env::var("OBS_PASSWORD")
            && !password.is_empty()
        {
            self.obs.password = password;
        }
        Ok(())
    }

    /// Validate every section, returning the first problem found.
    ///
    /// Run once at startup; a failure here is fatal by design, since an
    /// inconsistent schedule is worse than no schedule.
    pub fn validate(&self) -> Result<()> {
        if self.obs.host.trim().is_empty() {
            return Err(SwitcherError::Config("obs.host must not be empty".into()));
        }
        if self.obs.port == 0 {
            return Err(SwitcherError::Config("obs.port must not be 0".into()));
        }
        if self.obs.timeout_seconds == 0 {
            return Err(SwitcherError::Config(
                "obs.timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.scenes.default.trim().is_empty() {
            return Err(SwitcherError::Config(
                "scenes.default must not be empty".into(),
            ));
        }
        if self.scenes.prayer.trim().is_empty() {
            return Err(SwitcherError::Config(
                "scenes.prayer must not be empty".into(),
            ));
        }
        if self.scenes.prayer_duration_minutes == 0 {
            return Err(SwitcherError::Config(
                "scenes.prayer_duration_minutes must be greater than 0".into(),
            ));
        }
        self.jumuah.weekday()?;
        let start = self.jumuah.start_time()?;
        let end = self.jumuah.end_time()?;
        if end <= start {
            return Err(SwitcherError::Config(format!(
                "jumuah window must end after it starts ({} >= {})",
                self.jumuah.start, self.jumuah.end
            )));
        }
        self.schedule.tz()?;
        let refresh = self.schedule.refresh_times()?;
        if refresh.is_empty() {
            return Err(SwitcherError::Config(
                "schedule.refresh_times must not be empty".into(),
            ));
        }
        self.schedule.manual_fallback()?;
        self.scrape
            .validate()
            .map_err(|e| SwitcherError::Config(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SwitcherConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.obs.host, "localhost");
        assert_eq!(config.obs.port, 4455);
        assert_eq!(config.scenes.default, "The Masjid App View");
        assert_eq!(config.scenes.prayer, "PTZ Camera & Masjid App");
        assert_eq!(config.scenes.prayer_duration_minutes, 10);
        assert_eq!(config.schedule.timezone, "America/New_York");
        assert_eq!(config.schedule.refresh_times.len(), 2);
    }

    #[test]
    fn typed_accessors_parse_defaults() {
        let config = SwitcherConfig::default();
        assert_eq!(config.schedule.tz().unwrap(), chrono_tz::America::New_York);
        assert_eq!(config.jumuah.weekday().unwrap(), Weekday::Fri);
        assert_eq!(
            config.jumuah.start_time().unwrap(),
            NaiveTime::from_hms_opt(13, 25, 0).unwrap()
        );
        assert_eq!(
            config.jumuah.end_time().unwrap(),
            NaiveTime::from_hms_opt(14, 15, 0).unwrap()
        );
        let refresh = config.schedule.refresh_times().unwrap();
        assert_eq!(refresh[0], NaiveTime::from_hms_opt(0, 5, 0).unwrap());
        assert_eq!(refresh[1], NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    }

    #[test]
    fn ws_url_formats_host_and_port() {
        let obs = ObsConfig {
            host: "10.0.0.5".into(),
            port: 4460,
            ..Default::default()
        };
        assert_eq!(obs.ws_url(), "ws://10.0.0.5:4460");
    }

    #[test]
    fn manual_fallback_parses_times() {
        let mut config = SwitcherConfig::default();
        config
            .schedule
            .manual_times
            .insert(Prayer::Fajr, "06:15".into());
        config
            .schedule
            .manual_times
            .insert(Prayer::Isha, "21:30".into());
        let fallback = config.schedule.manual_fallback().unwrap();
        assert_eq!(fallback.len(), 2);
        assert_eq!(
            fallback[&Prayer::Fajr],
            NaiveTime::from_hms_opt(6, 15, 0).unwrap()
        );
    }

    #[test]
    fn invalid_manual_time_rejected() {
        let mut config = SwitcherConfig::default();
        config
            .schedule
            .manual_times
            .insert(Prayer::Asr, "5:15 PM".into());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("manual_times.Asr"));
    }

    #[test]
    fn invalid_timezone_rejected() {
        let mut config = SwitcherConfig::default();
        config.schedule.timezone = "Mars/Olympus_Mons".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timezone"));
    }

    #[test]
    fn invalid_weekday_rejected() {
        let mut config = SwitcherConfig::default();
        config.jumuah.weekday = "jumuahday".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("weekday"));
    }

    #[test]
    fn window_must_end_after_start() {
        let mut config = SwitcherConfig::default();
        config.jumuah.start = "14:15".into();
        config.jumuah.end = "13:25".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("end after it starts"));
    }

    #[test]
    fn equal_window_bounds_rejected() {
        let mut config = SwitcherConfig::default();
        config.jumuah.start = "13:25".into();
        config.jumuah.end = "13:25".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_refresh_time_rejected() {
        let mut config = SwitcherConfig::default();
        config.schedule.refresh_times = vec!["25:00".into()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("refresh_times"));
    }

    #[test]
    fn empty_refresh_times_rejected() {
        let mut config = SwitcherConfig::default();
        config.schedule.refresh_times.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("refresh_times"));
    }

    #[test]
    fn zero_duration_rejected() {
        let mut config = SwitcherConfig::default();
        config.scenes.prayer_duration_minutes = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("prayer_duration_minutes"));
    }

    #[test]
    fn empty_scene_name_rejected() {
        let mut config = SwitcherConfig::default();
        config.scenes.prayer = "  ".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("scenes.prayer"));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        let mut config = SwitcherConfig::default();
        config.obs.host = "obs.local".to_string();
        config.scenes.prayer_duration_minutes = 15;
        config
            .schedule
            .manual_times
            .insert(Prayer::Maghrib, "20:05".into());

        assert!(config.save_to_file(&path).is_ok());
        assert!(path.exists());

        let loaded = SwitcherConfig::from_file(&path).expect("load should succeed");
        assert_eq!(loaded.obs.host, "obs.local");
        assert_eq!(loaded.scenes.prayer_duration_minutes, 15);
        assert_eq!(
            loaded.schedule.manual_times.get(&Prayer::Maghrib),
            Some(&"20:05".to_string())
        );
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = SwitcherConfig::from_file(std::path::Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").expect("write");
        assert!(SwitcherConfig::from_file(&path).is_err());
    }

    #[test]
    fn load_missing_default_path_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        // Point XDG_CONFIG_HOME at an empty dir so no real config leaks in.
        unsafe { std::env::set_var("XDG_CONFIG_HOME", dir.path()) };
        let config = SwitcherConfig::load(None).expect("defaults");
        assert_eq!(config.obs.port, 4455);
        unsafe { std::env::remove_var("XDG_CONFIG_HOME") };
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = SwitcherConfig::default_config_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.ends_with("config.toml"));
        assert!(path_str.contains("iqama"));
    }

    #[test]
    fn config_serializes_to_toml() {
        let config = SwitcherConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        assert!(toml_str.contains("prayer_duration_minutes"));
        assert!(toml_str.contains("refresh_times"));
        assert!(toml_str.contains("The Masjid App View"));
    }

    #[test]
    fn apply_env_overrides_obs_settings() {
        let mut config = SwitcherConfig::default();
        unsafe {
            std::env::set_var("OBS_HOST", "stream-pc");
            std::env::set_var("OBS_PORT", "4461");
            std::env::set_var("OBS_PASSWORD", "hunter2");
        }
        config.apply_env().expect("overlay");
        assert_eq!(config.obs.host, "stream-pc");
        assert_eq!(config.obs.port, 4461);
        assert_eq!(config.obs.password, "hunter2");

        unsafe { std::env::set_var("OBS_PORT", "not-a-port") };
        assert!(config.apply_env().is_err());

        unsafe {
            std::env::remove_var("OBS_HOST");
            std::env::remove_var("OBS_PORT");
            std::env::remove_var("OBS_PASSWORD");
        }
    }
}
