use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use serde::Serialize;
use tracing::error;

use crate::profile::errors::ProfileError;

/// Execution phases recorded for every profiled query node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimingType {
    /// Rewriting the query into its primitive form.
    Rewrite,
    /// Building the query's weight.
    Weight,
    /// Building a scorer for one segment.
    BuildScorer,
    /// Moving to the next matching document.
    NextDoc,
    /// Skipping to the first match at or after a target document.
    Advance,
    /// Computing the score of the current document.
    Score,
    /// Confirming a two-phase approximation.
    Match,
}

impl TimingType {
    /// Number of phases.
    pub const COUNT: usize = 7;

    /// Every phase, in reporting order.
    pub const ALL: [TimingType; Self::COUNT] = [
        TimingType::Rewrite,
        TimingType::Weight,
        TimingType::BuildScorer,
        TimingType::NextDoc,
        TimingType::Advance,
        TimingType::Score,
        TimingType::Match,
    ];

    /// Text name used in profile snapshots.
    pub fn as_str(self) -> &'static str {
        match self {
            TimingType::Rewrite => "REWRITE",
            TimingType::Weight => "WEIGHT",
            TimingType::BuildScorer => "BUILD_SCORER",
            TimingType::NextDoc => "NEXT_DOC",
            TimingType::Advance => "ADVANCE",
            TimingType::Score => "SCORE",
            TimingType::Match => "MATCH",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TimingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nanoseconds elapsed since `start`, never less than one.
///
/// A timed interval always counts, so a phase that ran at least once reports a
/// positive total even on coarse clocks.
pub(crate) fn interval_nanos(start: Instant) -> u64 {
    let nanos = start.elapsed().as_nanos().min(u64::MAX as u128) as u64;
    nanos.max(1)
}

/// Per-node accumulated time for each [`TimingType`].
///
/// Single-threaded by construction: totals live in `Cell`s so decorators can
/// time calls through a shared `Rc` handle without locking.
#[derive(Debug, Default)]
pub struct ProfileBreakdown {
    timings: [Cell<u64>; TimingType::COUNT],
    running: [Cell<Option<Instant>>; TimingType::COUNT],
}

impl ProfileBreakdown {
    /// Creates a breakdown with every phase at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts timing `timing`.
    pub fn start(&self, timing: TimingType) -> Result<(), ProfileError> {
        let running = &self.running[timing.slot()];
        if running.get().is_some() {
            return Err(ProfileError::AlreadyRunning(timing));
        }
        running.set(Some(Instant::now()));
        Ok(())
    }

    /// Stops timing `timing`, adds the interval to its total and returns it.
    pub fn stop(&self, timing: TimingType) -> Result<u64, ProfileError> {
        let Some(since) = self.running[timing.slot()].take() else {
            return Err(ProfileError::NotRunning(timing));
        };
        let nanos = interval_nanos(since);
        let total = &self.timings[timing.slot()];
        total.set(total.get().saturating_add(nanos));
        Ok(nanos)
    }

    /// Adds every phase total of `other` into this breakdown.
    pub(crate) fn absorb(&self, other: &ProfileBreakdown) {
        for (total, extra) in self.timings.iter().zip(other.timings.iter()) {
            total.set(total.get().saturating_add(extra.get()));
        }
    }

    /// Starts `timing` and returns a guard that stops it when dropped.
    pub fn timer(&self, timing: TimingType) -> Result<PhaseTimer<'_>, ProfileError> {
        self.start(timing)?;
        Ok(PhaseTimer {
            breakdown: self,
            timing,
        })
    }

    /// Accumulated nanoseconds for `timing`.
    pub fn time(&self, timing: TimingType) -> u64 {
        self.timings[timing.slot()].get()
    }

    /// Whether `timing` has an outstanding start.
    pub fn is_running(&self, timing: TimingType) -> bool {
        self.running[timing.slot()].get().is_some()
    }

    /// Sum over every phase.
    pub fn total_time(&self) -> u64 {
        TimingType::ALL
            .iter()
            .fold(0u64, |acc, t| acc.saturating_add(self.time(*t)))
    }

    /// Snapshot keyed by phase name; every phase is present.
    pub fn to_map(&self) -> BTreeMap<String, u64> {
        TimingType::ALL
            .iter()
            .map(|t| (t.as_str().to_owned(), self.time(*t)))
            .collect()
    }
}

/// Scoped timing of one phase; stops the phase on every exit path.
#[must_use = "the phase stops as soon as the timer is dropped"]
pub struct PhaseTimer<'a> {
    breakdown: &'a ProfileBreakdown,
    timing: TimingType,
}

impl Drop for PhaseTimer<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.breakdown.stop(self.timing) {
            error!(error = %err, "profile.timer.release_failed");
        }
    }
}
