//! Daily cycle orchestration.
//!
//! Ties the pieces together: acquire iqama times, compile the rest of
//! the day, install the generation, and act on the scheduler's events.
//! One cycle runs at startup and another at each refresh trigger.

use crate::config::SwitcherConfig;
use crate::error::Result;
use crate::obs::ObsClient;
use crate::schedule::{
    compile, jumuah_window_for, merge_times, PendingAction, SceneKind, Scheduler, SchedulerEvent,
    SchedulerHandle,
};
use crate::source;
use chrono::{Duration, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Orchestrates the daily pipeline and applies scene switches.
#[derive(Clone)]
pub struct Switcher {
    config: Arc<SwitcherConfig>,
    tz: Tz,
    obs: ObsClient,
}

impl Switcher {
    /// # Errors
    ///
    /// Returns a config error when the timezone name does not parse.
    pub fn new(config: SwitcherConfig) -> Result<Self> {
        let tz = config.schedule.tz()?;
        let obs = ObsClient::new(config.obs.clone());
        Ok(Self {
            config: Arc::new(config),
            tz,
            obs,
        })
    }

    /// Run until `cancel` is triggered.
    ///
    /// Starts the scheduler loop, runs one daily cycle immediately, then
    /// reacts to fire and refresh events. Refresh cycles run on their
    /// own task so a slow scrape never delays a pending scene switch.
    ///
    /// # Errors
    ///
    /// Returns an error when the initial cycle cannot be installed or
    /// the configured refresh times do not parse.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let refresh_times = self.config.schedule.refresh_times()?;
        let (scheduler, handle, mut events) = Scheduler::new(self.tz, &refresh_times)?;
        let scheduler_task = scheduler.run(cancel.clone());

        self.run_daily_cycle(&handle).await?;

        let mut refresh_task: Option<tokio::task::JoinHandle<()>> = None;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(SchedulerEvent::Fire(pending)) => self.apply(&pending).await,
                    Some(SchedulerEvent::Refresh { label }) => {
                        if refresh_task.as_ref().is_some_and(|task| !task.is_finished()) {
                            warn!(trigger = %label, "previous refresh still running, skipping");
                            continue;
                        }
                        info!(trigger = %label, "refresh trigger fired");
                        let switcher = self.clone();
                        let cycle_handle = handle.clone();
                        refresh_task = Some(tokio::spawn(async move {
                            if let Err(err) = switcher.run_daily_cycle(&cycle_handle).await {
                                error!(error = %err, "daily cycle failed");
                            }
                        }));
                    }
                    None => break,
                },
            }
        }

        cancel.cancel();
        let _ = scheduler_task.await;
        if let Some(task) = refresh_task {
            task.abort();
        }
        info!("switcher stopped");
        Ok(())
    }

    /// Rebuild and install the schedule for the remainder of today.
    ///
    /// Always replaces the pending generation, even with an empty one,
    /// so stale actions from a previous day can never fire. Always
    /// forces the default scene afterwards: a cycle can start mid-window
    /// after a late restart, and the baseline state must be explicit.
    ///
    /// An empty result is logged as a hard condition but is not an
    /// error; the next refresh trigger retries.
    ///
    /// # Errors
    ///
    /// Returns an error when manual fallback or Jumu'ah configuration
    /// does not parse, or when the scheduler loop has stopped.
    pub async fn run_daily_cycle(&self, handle: &SchedulerHandle) -> Result<()> {
        let now = Utc::now().with_timezone(&self.tz);
        let day = now.date_naive();
        info!(%day, %now, "daily cycle started");

        let scraped = source::resolve(&self.config.scrape).await;
        let manual = self.config.schedule.manual_fallback()?;
        if scraped.is_empty() && !manual.is_empty() {
            info!(count = manual.len(), "falling back to manual iqama times");
        }

        let window = jumuah_window_for(day, &self.config.jumuah)?;
        let duration = Duration::minutes(i64::from(self.config.scenes.prayer_duration_minutes));
        let actions = compile(day, now, &scraped, &manual, window.as_ref(), duration);

        if actions.is_empty() {
            if merge_times(&scraped, &manual).is_empty() && window.is_none() {
                error!(%day, "no iqama times from any source; nothing will fire today");
            } else {
                error!(%day, "no remaining actions today; retrying at the next refresh");
            }
        } else {
            info!(count = actions.len(), "schedule compiled");
        }

        handle.install(actions)?;

        if let Err(err) = self.obs.set_scene(&self.config.scenes.default).await {
            error!(error = %err, "failed to force default scene");
        }
        Ok(())
    }

    /// Apply one fired action. Failures are logged, never retried; the
    /// paired restore or the next cycle realigns state.
    async fn apply(&self, pending: &PendingAction) {
        let scene = self.scene_name(pending.action.scene);
        info!(
            generation = %pending.generation,
            trigger = %pending.action.trigger,
            scene,
            "applying scene switch"
        );
        if let Err(err) = self.obs.set_scene(scene).await {
            error!(error = %err, scene, "scene switch failed");
        }
    }

    fn scene_name(&self, scene: SceneKind) -> &str {
        match scene {
            SceneKind::Prayer => &self.config.scenes.prayer,
            SceneKind::Default => &self.config.scenes.default,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn scene_names_come_from_config() {
        let mut config = SwitcherConfig::default();
        config.scenes.default = "Idle".into();
        config.scenes.prayer = "Prayer".into();
        let switcher = Switcher::new(config).expect("switcher");
        assert_eq!(switcher.scene_name(SceneKind::Default), "Idle");
        assert_eq!(switcher.scene_name(SceneKind::Prayer), "Prayer");
    }

    #[test]
    fn bad_timezone_is_rejected_at_construction() {
        let mut config = SwitcherConfig::default();
        config.schedule.timezone = "Mars/Olympus".into();
        assert!(Switcher::new(config).is_err());
    }
}
