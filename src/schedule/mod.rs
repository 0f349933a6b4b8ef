//! Daily scene-switch scheduling.
//!
//! Compiles a day's iqama times into timed scene switches, applies the
//! Jumu'ah override window, and runs the timer loop that fires them.
//! A fresh compile replaces the entire pending generation atomically;
//! the recurring refresh triggers survive every replacement.

pub mod plan;
pub mod queue;
pub mod rules;
pub mod runner;

pub use plan::{compile, merge_times, SceneKind, SwitchAction, Trigger};
pub use queue::{ActionQueue, GenerationId, PendingAction};
pub use rules::{jumuah_window_for, JumuahWindow};
pub use runner::{Scheduler, SchedulerEvent, SchedulerHandle};
