//! Mode scheduling for one independent run.
//!
//! Each time step runs exactly one refinement operator:
//!
//! | mode | operator |
//! |------|----------|
//! | `Typical` | rescore (almost) every node |
//! | `Bubble` | burst large communities into fresh labels |
//! | `Merge` | fold well-connected community pairs together |
//! | `Nurture` | rescore only the worst-fit nodes |
//!
//! ## Schedule
//!
//! ```text
//! t < warmup                                  -> Typical
//! merging allowed, MERGE and BUBBLE stale     -> Merge
//! merging barred, MERGE stale, BUBBLE staler  -> Bubble
//! merging barred, MERGE stale, BUBBLE recent  -> Nurture
//! otherwise                                   -> Typical
//! ```
//!
//! Merging is enabled once `Bubble` has run more than
//! `bubbles_before_merge` times and is disabled again by a `Merge` step that
//! finds nothing to merge. Each such "intervention" advances a counter that
//! starts at `-discard_transient`; every intervention that leaves it at zero
//! or above asks the run loop to store a snapshot, and the run ends when
//! `target_partitions` snapshots have been asked for.
//!
//! The [`Tracker`] separates the pure decision ([`Tracker::select_mode`])
//! from the bookkeeping ([`Tracker::record`]) so the state machine can be
//! driven without any graph at all.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Refinement operator chosen for a time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Rescore most nodes.
    Typical,
    /// Split large communities.
    Bubble,
    /// Merge community pairs.
    Merge,
    /// Rescore the worst-fit nodes.
    Nurture,
}

impl Mode {
    fn index(self) -> usize {
        match self {
            Mode::Typical => 0,
            Mode::Bubble => 1,
            Mode::Merge => 2,
            Mode::Nurture => 3,
        }
    }
}

/// Tunable thresholds of the mode schedule.
///
/// `*_gap` fields are strict lower bounds on "steps since that mode last
/// ran"; `nurture_bubble_window` is a strict upper bound.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModeSchedule {
    /// Steps that always run `Typical`.
    pub warmup: usize,
    /// `Merge` needs more than this many steps since the last `Merge`.
    pub merge_merge_gap: usize,
    /// `Merge` needs more than this many steps since the last `Bubble`.
    pub merge_bubble_gap: usize,
    /// `Bubble` needs more than this many steps since the last `Merge`.
    pub bubble_merge_gap: usize,
    /// `Bubble` needs more than this many steps since the last `Bubble`.
    pub bubble_bubble_gap: usize,
    /// `Nurture` needs more than this many steps since the last `Merge`.
    pub nurture_merge_gap: usize,
    /// `Nurture` needs fewer than this many steps since the last `Bubble`.
    pub nurture_bubble_window: usize,
    /// `Bubble` re-enables merging once it has run more than this many times.
    pub bubbles_before_merge: usize,
    /// Hard stop after this many `Typical` steps.
    pub max_typical_steps: usize,
}

impl Default for ModeSchedule {
    fn default() -> Self {
        Self {
            warmup: 20,
            merge_merge_gap: 1,
            merge_bubble_gap: 3,
            bubble_merge_gap: 2,
            bubble_bubble_gap: 14,
            nurture_merge_gap: 1,
            nurture_bubble_window: 5,
            bubbles_before_merge: 2,
            max_typical_steps: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ModeStats {
    since_last: usize,
    times: usize,
}

/// What a finished step asks of the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transition {
    /// Store the committed partition now.
    pub save_snapshot: bool,
    /// Whether merging is permitted after this step.
    pub merge_allowed: bool,
}

/// Mode state machine for one run.
#[derive(Debug, Clone)]
pub struct Tracker {
    schedule: ModeSchedule,
    stats: [ModeStats; 4],
    allowed_to_merge: bool,
    /// Starts at `-discard_transient`; snapshots are taken once it is `>= 0`.
    postintervention_count: i64,
    /// Index of the last snapshot to take (`target_partitions - 1`).
    last_partition: i64,
}

impl Tracker {
    /// New tracker that discards `discard_transient` interventions and then
    /// asks for `target_partitions` snapshots.
    pub fn new(schedule: ModeSchedule, target_partitions: usize, discard_transient: usize) -> Self {
        Self {
            schedule,
            stats: [ModeStats::default(); 4],
            allowed_to_merge: false,
            postintervention_count: -(discard_transient as i64),
            last_partition: target_partitions as i64 - 1,
        }
    }

    /// The schedule in use.
    pub fn schedule(&self) -> &ModeSchedule {
        &self.schedule
    }

    /// Steps since `mode` last ran.
    pub fn since_last(&self, mode: Mode) -> usize {
        self.stats[mode.index()].since_last
    }

    /// Times `mode` has run.
    pub fn times(&self, mode: Mode) -> usize {
        self.stats[mode.index()].times
    }

    /// Whether `Merge` may be selected.
    pub fn merge_allowed(&self) -> bool {
        self.allowed_to_merge
    }

    /// Interventions seen so far, offset by the burn-in.
    pub fn postintervention_count(&self) -> i64 {
        self.postintervention_count
    }

    /// Operator to run at step `time`.
    pub fn select_mode(&self, time: usize) -> Mode {
        let s = &self.schedule;
        if time < s.warmup {
            return Mode::Typical;
        }

        let since_merge = self.since_last(Mode::Merge);
        let since_bubble = self.since_last(Mode::Bubble);

        if self.allowed_to_merge {
            if since_merge > s.merge_merge_gap && since_bubble > s.merge_bubble_gap {
                return Mode::Merge;
            }
        } else {
            if since_merge > s.bubble_merge_gap && since_bubble > s.bubble_bubble_gap {
                return Mode::Bubble;
            }
            if since_merge > s.nurture_merge_gap && since_bubble < s.nurture_bubble_window {
                return Mode::Nurture;
            }
        }

        Mode::Typical
    }

    /// Book-keep a finished step that ran `mode`.
    ///
    /// `n_merged` is the number of community pairs a `Merge` step merged
    /// (ignored for other modes).
    pub fn record(&mut self, mode: Mode, n_merged: usize) -> Transition {
        let stats = &mut self.stats[mode.index()];
        stats.times += 1;
        stats.since_last = 0;
        for stats in self.stats.iter_mut() {
            stats.since_last += 1;
        }

        let mut save_snapshot = false;
        if self.allowed_to_merge {
            if mode == Mode::Merge && n_merged == 0 {
                self.allowed_to_merge = false;
                self.postintervention_count += 1;
                save_snapshot = self.postintervention_count >= 0;
            }
        } else if mode == Mode::Bubble && self.times(Mode::Bubble) > self.schedule.bubbles_before_merge {
            self.allowed_to_merge = true;
        }

        Transition {
            save_snapshot,
            merge_allowed: self.allowed_to_merge,
        }
    }

    /// Whether the run is finished.
    pub fn terminated(&self) -> bool {
        self.times(Mode::Typical) >= self.schedule.max_typical_steps
            || self.postintervention_count >= self.last_partition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive the tracker with a fixed merge outcome per merge step.
    fn drive(tracker: &mut Tracker, steps: usize, mut merges: impl FnMut() -> usize) -> Vec<Mode> {
        let mut modes = Vec::new();
        for t in 0..steps {
            let mode = tracker.select_mode(t);
            let merged = if mode == Mode::Merge { merges() } else { 0 };
            let _ = tracker.record(mode, merged);
            modes.push(mode);
            if tracker.terminated() {
                break;
            }
        }
        modes
    }

    #[test]
    fn test_warmup_is_typical() {
        let mut tracker = Tracker::new(ModeSchedule::default(), 5, 3);
        let modes = drive(&mut tracker, 20, || 0);
        assert!(modes.iter().all(|&m| m == Mode::Typical));
        assert_eq!(tracker.times(Mode::Typical), 20);
    }

    #[test]
    fn test_first_bubble_then_nurture() {
        let mut tracker = Tracker::new(ModeSchedule::default(), 5, 3);
        let modes = drive(&mut tracker, 26, || 0);
        assert_eq!(modes[20], Mode::Bubble);
        assert_eq!(&modes[21..25], &[Mode::Nurture; 4]);
        assert_eq!(modes[25], Mode::Typical);
    }

    #[test]
    fn test_counters_after_step() {
        let mut tracker = Tracker::new(ModeSchedule::default(), 5, 3);
        let _ = tracker.record(Mode::Bubble, 0);
        assert_eq!(tracker.times(Mode::Bubble), 1);
        assert_eq!(tracker.since_last(Mode::Bubble), 1);
        assert_eq!(tracker.since_last(Mode::Typical), 1);

        let _ = tracker.record(Mode::Typical, 0);
        assert_eq!(tracker.since_last(Mode::Bubble), 2);
        assert_eq!(tracker.since_last(Mode::Typical), 1);
    }

    #[test]
    fn test_third_bubble_enables_merge() {
        let mut tracker = Tracker::new(ModeSchedule::default(), 5, 3);
        assert!(!tracker.record(Mode::Bubble, 0).merge_allowed);
        assert!(!tracker.record(Mode::Bubble, 0).merge_allowed);
        let t = tracker.record(Mode::Bubble, 0);
        assert!(t.merge_allowed);
        assert!(!t.save_snapshot);
    }

    #[test]
    fn test_empty_merge_disables_and_counts() {
        let mut tracker = Tracker::new(ModeSchedule::default(), 2, 2);
        for _ in 0..3 {
            let _ = tracker.record(Mode::Bubble, 0);
        }

        // Productive merge keeps merging on.
        let t = tracker.record(Mode::Merge, 2);
        assert!(t.merge_allowed);
        assert_eq!(tracker.postintervention_count(), -2);

        // Burn-in intervention: no snapshot.
        let t = tracker.record(Mode::Merge, 0);
        assert!(!t.merge_allowed);
        assert!(!t.save_snapshot);
        assert_eq!(tracker.postintervention_count(), -1);
        assert!(!tracker.terminated());

        // Re-enable and intervene again: first snapshot.
        let _ = tracker.record(Mode::Bubble, 0);
        let t = tracker.record(Mode::Merge, 0);
        assert!(t.save_snapshot);
        assert!(!tracker.terminated());

        let _ = tracker.record(Mode::Bubble, 0);
        let t = tracker.record(Mode::Merge, 0);
        assert!(t.save_snapshot);
        assert!(tracker.terminated());
    }

    #[test]
    fn test_full_schedule_takes_target_snapshots() {
        let mut tracker = Tracker::new(ModeSchedule::default(), 5, 3);
        let mut snapshots = 0;
        let mut t = 0;
        // Every other merge step merges something.
        let mut flip = false;
        while !tracker.terminated() {
            let mode = tracker.select_mode(t);
            let merged = if mode == Mode::Merge {
                flip = !flip;
                usize::from(flip)
            } else {
                0
            };
            if tracker.record(mode, merged).save_snapshot {
                snapshots += 1;
            }
            t += 1;
        }
        assert_eq!(snapshots, 5);
        assert!(tracker.times(Mode::Typical) < tracker.schedule().max_typical_steps);
    }

    #[test]
    fn test_typical_cap_terminates() {
        let schedule = ModeSchedule {
            max_typical_steps: 20,
            ..ModeSchedule::default()
        };
        let mut tracker = Tracker::new(schedule, 5, 3);
        let modes = drive(&mut tracker, 1000, || 1);
        assert_eq!(modes.len(), 20);
        assert!(tracker.terminated());
    }

    #[test]
    fn test_tunable_thresholds() {
        let schedule = ModeSchedule {
            warmup: 0,
            bubble_bubble_gap: 0,
            bubble_merge_gap: 0,
            ..ModeSchedule::default()
        };
        let mut tracker = Tracker::new(schedule, 5, 3);
        assert_eq!(tracker.select_mode(0), Mode::Typical);
        let _ = tracker.record(Mode::Typical, 0);
        assert_eq!(tracker.select_mode(1), Mode::Bubble);
    }
}
