//! Scheduler timer loop.
//!
//! Owns the pending-action queue plus the recurring refresh triggers and
//! turns wall-clock time into events on a channel. Generation installs
//! arrive over a command channel, so all queue mutation happens on the
//! loop task and a clear-then-install is atomic by construction. The
//! refresh triggers are fixed at startup and never cleared by installs.

use crate::error::{Result, SwitcherError};
use crate::schedule::plan::SwitchAction;
use crate::schedule::queue::{ActionQueue, PendingAction};
use chrono::{DateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use std::str::FromStr;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Upper bound on one sleep, so suspend/resume and clock adjustments are
/// noticed within a minute even with no deadline near.
const MAX_SLEEP: std::time::Duration = std::time::Duration::from_secs(60);

/// A recurring daily wall-clock trigger.
#[derive(Debug)]
struct RefreshTrigger {
    /// `HH:MM` label, for logs and events.
    label: String,
    /// Daily cron schedule in the masjid's timezone.
    schedule: Schedule,
    /// Next fire instant. `None` only if the schedule is exhausted.
    next: Option<DateTime<Tz>>,
}

impl RefreshTrigger {
    fn new(time: NaiveTime, now: DateTime<Tz>) -> Result<Self> {
        let expr = format!("0 {} {} * * *", time.minute(), time.hour());
        let schedule = Schedule::from_str(&expr)
            .map_err(|e| SwitcherError::Schedule(format!("refresh trigger {time}: {e}")))?;
        let next = schedule.after(&now).next();
        Ok(Self {
            label: time.format("%H:%M").to_string(),
            schedule,
            next,
        })
    }

    fn advance_past(&mut self, now: DateTime<Tz>) {
        self.next = self.schedule.after(&now).next();
    }
}

/// Events emitted by the scheduler loop.
#[derive(Debug)]
pub enum SchedulerEvent {
    /// A pending action reached its fire time.
    Fire(PendingAction),
    /// A recurring refresh trigger fired; time to rebuild the day.
    Refresh {
        /// `HH:MM` label of the trigger that fired.
        label: String,
    },
}

#[derive(Debug)]
enum Command {
    Install(Vec<SwitchAction>),
}

/// Handle for installing generations into a running scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl SchedulerHandle {
    /// Replace the pending generation with `actions`.
    ///
    /// # Errors
    ///
    /// Returns a channel error if the scheduler loop has stopped.
    pub fn install(&self, actions: Vec<SwitchAction>) -> Result<()> {
        self.cmd_tx
            .send(Command::Install(actions))
            .map_err(|_| SwitcherError::Channel("scheduler loop has stopped".into()))
    }
}

/// The scheduling authority: one queue, fixed refresh triggers, one loop.
pub struct Scheduler {
    tz: Tz,
    queue: ActionQueue,
    triggers: Vec<RefreshTrigger>,
    event_tx: mpsc::UnboundedSender<SchedulerEvent>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
}

impl Scheduler {
    /// Build a scheduler with daily refresh triggers at `refresh_times`.
    ///
    /// Returns the scheduler, the install handle, and the event stream.
    ///
    /// # Errors
    ///
    /// Returns a schedule error if a trigger expression cannot be built.
    pub fn new(
        tz: Tz,
        refresh_times: &[NaiveTime],
    ) -> Result<(
        Self,
        SchedulerHandle,
        mpsc::UnboundedReceiver<SchedulerEvent>,
    )> {
        Self::with_now(tz, refresh_times, Utc::now().with_timezone(&tz))
    }

    fn with_now(
        tz: Tz,
        refresh_times: &[NaiveTime],
        now: DateTime<Tz>,
    ) -> Result<(
        Self,
        SchedulerHandle,
        mpsc::UnboundedReceiver<SchedulerEvent>,
    )> {
        let triggers = refresh_times
            .iter()
            .map(|time| RefreshTrigger::new(*time, now))
            .collect::<Result<Vec<_>>>()?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let scheduler = Self {
            tz,
            queue: ActionQueue::new(),
            triggers,
            event_tx,
            cmd_rx,
        };
        Ok((scheduler, SchedulerHandle { cmd_tx }, event_rx))
    }

    /// Collect everything due at `now`: pending fires first, then due
    /// refresh triggers. Firing before refreshing matters when both land
    /// on the same instant: the 12:00 iqama must switch scenes before
    /// the 12:00 refresh supersedes it.
    fn due_events(&mut self, now: DateTime<Tz>) -> Vec<SchedulerEvent> {
        let mut events: Vec<SchedulerEvent> = self
            .queue
            .due(now)
            .into_iter()
            .map(SchedulerEvent::Fire)
            .collect();

        for trigger in &mut self.triggers {
            if let Some(next) = trigger.next
                && next <= now
            {
                events.push(SchedulerEvent::Refresh {
                    label: trigger.label.clone(),
                });
                trigger.advance_past(now);
            }
        }
        events
    }

    /// Earliest upcoming deadline across pending actions and triggers.
    fn next_deadline(&self) -> Option<DateTime<Tz>> {
        let trigger_next = self.triggers.iter().filter_map(|t| t.next).min();
        match (self.queue.next_deadline(), trigger_next) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    fn sleep_duration(&self, now: DateTime<Tz>) -> std::time::Duration {
        match self.next_deadline() {
            Some(deadline) => (deadline - now)
                .to_std()
                .unwrap_or(std::time::Duration::ZERO)
                .min(MAX_SLEEP),
            None => MAX_SLEEP,
        }
    }

    fn handle_install(&mut self, actions: Vec<SwitchAction>) {
        let installed = actions.len();
        let (generation, superseded) = self.queue.install(actions);
        info!(
            generation = %generation,
            installed,
            superseded,
            "schedule generation installed"
        );
    }

    /// Start the scheduler loop.
    ///
    /// Runs until `cancel` is triggered or both peers (event receiver,
    /// command sender) are gone.
    pub fn run(mut self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(triggers = self.triggers.len(), "scheduler started");

            loop {
                let now = Utc::now().with_timezone(&self.tz);
                for event in self.due_events(now) {
                    if let SchedulerEvent::Fire(pending) = &event {
                        info!(
                            generation = %pending.generation,
                            trigger = %pending.action.trigger,
                            at = %pending.action.at,
                            "action due"
                        );
                    }
                    if self.event_tx.send(event).is_err() {
                        debug!("scheduler event channel closed, stopping");
                        return;
                    }
                }

                let sleep_for = self.sleep_duration(now);
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("scheduler stopped");
                        return;
                    }
                    _ = tokio::time::sleep(sleep_for) => {}
                    cmd = self.cmd_rx.recv() => match cmd {
                        Some(Command::Install(actions)) => self.handle_install(actions),
                        None => {
                            debug!("scheduler command channel closed, stopping");
                            return;
                        }
                    },
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::schedule::plan::{SceneKind, Trigger};
    use chrono::{NaiveDate, TimeZone};
    use iqama_scrape::Prayer;

    fn tz() -> Tz {
        chrono_tz::America::New_York
    }

    fn at(hour: u32, min: u32) -> DateTime<Tz> {
        let day = NaiveDate::from_ymd_opt(2025, 6, 4).unwrap();
        tz().from_local_datetime(&day.and_hms_opt(hour, min, 0).unwrap())
            .unwrap()
    }

    fn t(hour: u32, min: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, min, 0).unwrap()
    }

    fn action(hour: u32, min: u32) -> SwitchAction {
        SwitchAction {
            at: at(hour, min),
            scene: SceneKind::Prayer,
            trigger: Trigger::Iqama(Prayer::Dhuhr),
        }
    }

    fn make_scheduler(
        refresh_times: &[NaiveTime],
        now: DateTime<Tz>,
    ) -> (
        Scheduler,
        SchedulerHandle,
        mpsc::UnboundedReceiver<SchedulerEvent>,
    ) {
        Scheduler::with_now(tz(), refresh_times, now).expect("scheduler")
    }

    #[test]
    fn triggers_start_strictly_in_the_future() {
        let (scheduler, _handle, _rx) = make_scheduler(&[t(0, 5), t(12, 0)], at(12, 0));
        for trigger in &scheduler.triggers {
            assert!(trigger.next.expect("next fire") > at(12, 0));
        }
        // 12:00 was exactly now, so the 12:00 trigger moved to tomorrow.
        assert_eq!(
            scheduler.triggers[1].next.expect("next fire"),
            at(12, 0) + chrono::Duration::days(1)
        );
    }

    #[test]
    fn due_events_fire_before_refresh_on_same_instant() {
        let (mut scheduler, _handle, _rx) = make_scheduler(&[t(12, 0)], at(11, 0));
        scheduler.queue.install(vec![action(12, 0)]);

        let events = scheduler.due_events(at(12, 0));
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SchedulerEvent::Fire(_)));
        assert!(matches!(&events[1], SchedulerEvent::Refresh { label } if label == "12:00"));
    }

    #[test]
    fn trigger_advances_to_next_day_after_firing() {
        let (mut scheduler, _handle, _rx) = make_scheduler(&[t(12, 0)], at(11, 0));
        let events = scheduler.due_events(at(12, 30));
        assert_eq!(events.len(), 1);
        assert_eq!(
            scheduler.triggers[0].next.expect("next fire"),
            at(12, 0) + chrono::Duration::days(1)
        );
    }

    #[test]
    fn nothing_due_before_deadline() {
        let (mut scheduler, _handle, _rx) = make_scheduler(&[t(12, 0)], at(11, 0));
        scheduler.queue.install(vec![action(11, 30)]);
        assert!(scheduler.due_events(at(11, 15)).is_empty());
    }

    #[test]
    fn install_never_touches_triggers() {
        let (mut scheduler, _handle, _rx) = make_scheduler(&[t(12, 0)], at(11, 0));
        scheduler.handle_install(vec![action(11, 30)]);
        scheduler.handle_install(vec![action(11, 45)]);

        let events = scheduler.due_events(at(12, 0));
        // The 11:45 action (11:30 was superseded) and the refresh.
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], SchedulerEvent::Refresh { label } if label == "12:00"));
    }

    #[test]
    fn next_deadline_is_earliest_of_queue_and_triggers() {
        let (mut scheduler, _handle, _rx) = make_scheduler(&[t(12, 0)], at(11, 0));
        assert_eq!(scheduler.next_deadline(), Some(at(12, 0)));

        scheduler.queue.install(vec![action(11, 30)]);
        assert_eq!(scheduler.next_deadline(), Some(at(11, 30)));
    }

    #[test]
    fn sleep_duration_clamps_and_floors() {
        let (mut scheduler, _handle, _rx) = make_scheduler(&[t(12, 0)], at(6, 0));
        // Hours until the trigger: clamped to MAX_SLEEP.
        assert_eq!(scheduler.sleep_duration(at(6, 0)), MAX_SLEEP);

        scheduler.queue.install(vec![action(6, 0)]);
        // Deadline already reached: zero, not negative.
        assert_eq!(
            scheduler.sleep_duration(at(6, 30)),
            std::time::Duration::ZERO
        );

        scheduler.queue.install(vec![action(6, 30)]);
        assert_eq!(
            scheduler.sleep_duration(at(6, 29)),
            std::time::Duration::from_secs(60)
        );
    }

    #[tokio::test]
    async fn run_fires_overdue_action_immediately() {
        let now = Utc::now().with_timezone(&tz());
        let (scheduler, handle, mut rx) =
            Scheduler::with_now(tz(), &[t(0, 5)], now).expect("scheduler");

        let cancel = CancellationToken::new();
        let join = scheduler.run(cancel.clone());

        handle
            .install(vec![SwitchAction {
                at: now - chrono::Duration::seconds(1),
                scene: SceneKind::Prayer,
                trigger: Trigger::Iqama(Prayer::Fajr),
            }])
            .expect("install");

        let event = tokio::time::timeout(std::time::Duration::from_secs(2), rx.recv())
            .await
            .expect("event within deadline")
            .expect("channel open");
        assert!(matches!(event, SchedulerEvent::Fire(_)));

        cancel.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(2), join)
            .await
            .expect("join within deadline")
            .expect("clean shutdown");
    }

    #[test]
    fn handle_errors_after_scheduler_dropped() {
        let (scheduler, handle, _rx) = make_scheduler(&[t(0, 5)], at(11, 0));
        drop(scheduler);
        assert!(handle.install(vec![action(11, 30)]).is_err());
    }
}
