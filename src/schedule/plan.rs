//! Schedule compilation: iqama times + override rules → timed actions.
//!
//! `compile` is a pure function of its inputs. It never looks at the
//! wall clock, never talks to OBS, and never fails: days with nothing
//! left to schedule produce an empty list, which the caller treats as a
//! hard scheduling failure.

use crate::schedule::rules::JumuahWindow;
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use iqama_scrape::{IqamaTimes, Prayer};
use std::fmt;
use tracing::{debug, warn};

/// Which scene a fired action selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneKind {
    /// The camera scene shown during a prayer window.
    Prayer,
    /// The scene shown the rest of the time.
    Default,
}

/// What put an action on the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// An individually scheduled iqama.
    Iqama(Prayer),
    /// The Jumu'ah override window.
    Jumuah,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iqama(prayer) => write!(f, "{prayer} iqama"),
            Self::Jumuah => f.write_str("Jumu'ah"),
        }
    }
}

/// One timed scene change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchAction {
    /// When to fire, in the masjid's timezone.
    pub at: DateTime<Tz>,
    /// Scene to select.
    pub scene: SceneKind,
    /// Why the action exists (for logs and diagnostics).
    pub trigger: Trigger,
}

/// Merge scraped times over the manual fallback. Scraped values win on
/// collision; the fallback only fills prayers the scrape missed.
pub fn merge_times(scraped: &IqamaTimes, manual: &IqamaTimes) -> IqamaTimes {
    let mut merged = manual.clone();
    merged.extend(scraped.iter().map(|(prayer, time)| (*prayer, *time)));
    merged
}

/// Compile the remainder of one day into an ordered action list.
///
/// Every candidate iqama strictly after `now` yields an enter/restore
/// pair at the iqama time and iqama + `prayer_duration`. A window (from
/// [`jumuah_window_for`](crate::schedule::rules::jumuah_window_for))
/// first removes the prayers it supersedes, then contributes its own
/// pair when its start is still ahead. Past-due candidates are dropped:
/// the switcher never retroactively enters a scene for a missed event.
///
/// Actions come back sorted by fire time; on a tie the restore sorts
/// before the enter so back-to-back windows end in the prayer scene.
pub fn compile(
    day: NaiveDate,
    now: DateTime<Tz>,
    scraped: &IqamaTimes,
    manual: &IqamaTimes,
    window: Option<&JumuahWindow>,
    prayer_duration: Duration,
) -> Vec<SwitchAction> {
    let tz = now.timezone();
    let mut candidates = merge_times(scraped, manual);

    if let Some(window) = window {
        for prayer in &window.supersedes {
            if candidates.remove(prayer).is_some() {
                debug!(prayer = %prayer, "superseded by jumu'ah window");
            }
        }
    }

    let mut actions = Vec::new();

    for (prayer, time) in &candidates {
        let Some(start) = resolve_local(day, *time, tz) else {
            warn!(prayer = %prayer, time = %time, "local time does not exist on this day, skipping");
            continue;
        };
        if start <= now {
            debug!(prayer = %prayer, time = %time, "iqama already passed, not scheduling");
            continue;
        }
        actions.push(SwitchAction {
            at: start,
            scene: SceneKind::Prayer,
            trigger: Trigger::Iqama(*prayer),
        });
        actions.push(SwitchAction {
            at: start + prayer_duration,
            scene: SceneKind::Default,
            trigger: Trigger::Iqama(*prayer),
        });
    }

    if let Some(window) = window {
        match (
            resolve_local(day, window.start, tz),
            resolve_local(day, window.end, tz),
        ) {
            (Some(start), Some(end)) if start > now => {
                actions.push(SwitchAction {
                    at: start,
                    scene: SceneKind::Prayer,
                    trigger: Trigger::Jumuah,
                });
                actions.push(SwitchAction {
                    at: end,
                    scene: SceneKind::Default,
                    trigger: Trigger::Jumuah,
                });
            }
            (Some(_), Some(_)) => {
                debug!(start = %window.start, "jumu'ah window already started, not scheduling");
            }
            _ => {
                warn!(start = %window.start, end = %window.end, "jumu'ah window falls in a DST gap, skipping");
            }
        }
    }

    actions.sort_by_key(|action| (action.at, scene_rank(action.scene)));
    actions
}

/// Resolve a local time-of-day on `day` to an instant in `tz`.
///
/// Ambiguous local times (DST fall-back) take the earlier instant;
/// nonexistent local times (DST spring-forward gap) resolve to `None`.
fn resolve_local(day: NaiveDate, time: NaiveTime, tz: Tz) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&day.and_time(time)) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earlier, _) => Some(earlier),
        LocalResult::None => None,
    }
}

/// Tie-break rank for actions firing at the same instant: the restore
/// goes first so a coinciding enter leaves the prayer scene up.
pub(crate) fn scene_rank(scene: SceneKind) -> u8 {
    match scene {
        SceneKind::Default => 0,
        SceneKind::Prayer => 1,
    }
}
