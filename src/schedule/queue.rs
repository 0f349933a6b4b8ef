//! Generation-tagged pending-action queue.
//!
//! One compile run produces one generation. Installing a generation
//! supersedes everything still pending from earlier generations in the
//! same call, so no fire can ever observe the gap between the clear and
//! the install. The queue is synchronous; the runner owns it and is the
//! only mutator.

use crate::schedule::plan::{scene_rank, SwitchAction};
use chrono::DateTime;
use chrono_tz::Tz;

/// Identifies which daily compilation produced a pending action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenerationId(u64);

impl GenerationId {
    /// Numeric value, for logging.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for GenerationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An installed action waiting for its fire time.
#[derive(Debug, Clone)]
pub struct PendingAction {
    /// Generation that produced the action.
    pub generation: GenerationId,
    /// The timed scene change itself.
    pub action: SwitchAction,
}

/// The live set of pending actions.
///
/// Actions leave the queue exactly one of two ways: drained by [`due`]
/// at fire time, or superseded wholesale by the next [`install`].
///
/// [`due`]: ActionQueue::due
/// [`install`]: ActionQueue::install
#[derive(Debug, Default)]
pub struct ActionQueue {
    /// Pending actions, sorted by fire time (restore before enter on ties).
    pending: Vec<PendingAction>,
    /// Monotonic generation counter.
    last_generation: u64,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersede every pending action and install `actions` as the new
    /// generation. Returns the new generation id and how many pending
    /// actions were superseded.
    ///
    /// Installing an empty action list is valid and still clears the
    /// prior generation; an empty day must not leave stale actions
    /// armed.
    pub fn install(&mut self, actions: Vec<SwitchAction>) -> (GenerationId, usize) {
        let superseded = self.pending.len();
        self.last_generation += 1;
        let generation = GenerationId(self.last_generation);

        self.pending = actions
            .into_iter()
            .map(|action| PendingAction { generation, action })
            .collect();
        self.pending
            .sort_by_key(|p| (p.action.at, scene_rank(p.action.scene)));

        (generation, superseded)
    }

    /// Earliest pending fire time, if any.
    pub fn next_deadline(&self) -> Option<DateTime<Tz>> {
        self.pending.first().map(|p| p.action.at)
    }

    /// Drain every action due at `now` (fire time ≤ `now`), in fire
    /// order. Drained actions are gone: a second call with the same
    /// `now` returns nothing.
    pub fn due(&mut self, now: DateTime<Tz>) -> Vec<PendingAction> {
        let split = self.pending.partition_point(|p| p.action.at <= now);
        self.pending.drain(..split).collect()
    }

    /// Number of actions still pending.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
