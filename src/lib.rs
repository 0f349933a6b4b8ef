//! Iqama: automatic OBS scene switching around daily prayer times.
//!
//! Scrapes iqama times from a masjid slides page and switches OBS
//! scenes at each iqama: the prayer scene goes up at the iqama time and
//! the default scene comes back after a fixed duration. A Jumu'ah
//! window replaces the superseded prayers on its weekday.
//!
//! # Architecture
//!
//! A single daily cycle drives everything:
//! - **Acquisition**: fetch and parse the slides page (`iqama-scrape`),
//!   falling back to configured manual times
//! - **Compilation**: turn the day's times into ordered enter/restore
//!   scene switches, applying the Jumu'ah override
//! - **Scheduling**: a timer task fires actions and the recurring
//!   refresh triggers; each cycle atomically replaces the pending set
//! - **Actuation**: short-lived obs-websocket v5 calls switch scenes
//!
//! The cycle runs at startup and at each refresh trigger (just after
//! midnight to pick up the new day, and midday to catch updates).

pub mod config;
pub mod error;
pub mod logging;
pub mod obs;
pub mod schedule;
pub mod source;
pub mod switcher;

pub use config::SwitcherConfig;
pub use error::{Result, SwitcherError};
pub use obs::ObsClient;
pub use schedule::{Scheduler, SchedulerEvent, SchedulerHandle};
pub use switcher::Switcher;
