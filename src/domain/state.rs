//! Immutable snapshots of accept/reject statistics.
//!
//! A `State` is a plain value. Transitions produce a new `State` and never
//! mutate the old one, which is what lets `Context` publish them through a
//! single atomic pointer swap.

use std::fmt;

/// Outcome of a single evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The candidate passed every predicate
    Accept,
    /// At least one predicate failed; the candidate is suppressed
    Reject,
}

impl Decision {
    /// Map a predicate outcome to a decision.
    pub fn from_pass(pass: bool) -> Self {
        if pass {
            Decision::Accept
        } else {
            Decision::Reject
        }
    }

    /// Check if this decision is Accept.
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept)
    }

    /// Check if this decision is Reject.
    pub fn is_reject(&self) -> bool {
        matches!(self, Decision::Reject)
    }
}

/// Point-in-time counters for one conditional.
///
/// `index` always equals `accept_count + reject_count`. It is kept as its own
/// field so a snapshot can be read without recomputing it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct State {
    index: u64,
    reject_count: u64,
    accept_count: u64,
    suppressed_count: u64,
    next_suppressed_count: u64,
}

impl State {
    /// The state before any evaluation.
    pub const fn new() -> Self {
        Self {
            index: 0,
            reject_count: 0,
            accept_count: 0,
            suppressed_count: 0,
            next_suppressed_count: 0,
        }
    }

    /// State following an accept.
    ///
    /// Closes the open reject run: its length becomes `suppressed_count` and
    /// the open run restarts at zero.
    #[must_use]
    pub fn accepted(&self) -> Self {
        Self {
            index: self.index + 1,
            reject_count: self.reject_count,
            accept_count: self.accept_count + 1,
            suppressed_count: self.next_suppressed_count,
            next_suppressed_count: 0,
        }
    }

    /// State following a reject.
    ///
    /// Extends the open reject run. `suppressed_count` keeps reporting the
    /// run closed by the last accept.
    #[must_use]
    pub fn rejected(&self) -> Self {
        Self {
            index: self.index + 1,
            reject_count: self.reject_count + 1,
            accept_count: self.accept_count,
            suppressed_count: self.suppressed_count,
            next_suppressed_count: self.next_suppressed_count + 1,
        }
    }

    /// Apply a decision.
    #[must_use]
    pub fn apply(&self, decision: Decision) -> Self {
        match decision {
            Decision::Accept => self.accepted(),
            Decision::Reject => self.rejected(),
        }
    }

    /// Total number of evaluations.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Total number of rejected evaluations.
    pub fn reject_count(&self) -> u64 {
        self.reject_count
    }

    /// Total number of accepted evaluations.
    pub fn accept_count(&self) -> u64 {
        self.accept_count
    }

    /// Length of the reject run that ended at the most recent accept.
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed_count
    }

    /// Length of the reject run still open since the most recent accept.
    pub fn next_suppressed_count(&self) -> u64 {
        self.next_suppressed_count
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "index={} accepted={} rejected={} suppressed={} pending={}",
            self.index,
            self.accept_count,
            self.reject_count,
            self.suppressed_count,
            self.next_suppressed_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = State::new();
        assert_eq!(state, State::default());
        assert_eq!(state.index(), 0);
        assert_eq!(state.accept_count(), 0);
        assert_eq!(state.reject_count(), 0);
        assert_eq!(state.suppressed_count(), 0);
        assert_eq!(state.next_suppressed_count(), 0);
    }

    #[test]
    fn test_rejects_then_accept_closes_run() {
        let mut state = State::new();
        for _ in 0..4 {
            state = state.rejected();
        }
        assert_eq!(state.next_suppressed_count(), 4);
        assert_eq!(state.suppressed_count(), 0);

        let state = state.accepted();
        assert_eq!(state.suppressed_count(), 4);
        assert_eq!(state.next_suppressed_count(), 0);
        assert_eq!(state.accept_count(), 1);
        assert_eq!(state.reject_count(), 4);
        assert_eq!(state.index(), 5);
    }

    #[test]
    fn test_open_run_keeps_previous_suppressed() {
        let mut state = State::new().rejected().rejected().accepted();
        assert_eq!(state.suppressed_count(), 2);

        for _ in 0..3 {
            state = state.rejected();
        }

        // Previous run is still reported until the next accept
        assert_eq!(state.suppressed_count(), 2);
        assert_eq!(state.next_suppressed_count(), 3);
    }

    #[test]
    fn test_accept_without_rejects() {
        let state = State::new().accepted().accepted();
        assert_eq!(state.suppressed_count(), 0);
        assert_eq!(state.accept_count(), 2);
    }

    #[test]
    fn test_index_is_sum() {
        let mut state = State::new();
        for i in 0..50u32 {
            let decision = Decision::from_pass(i % 3 == 0);
            state = state.apply(decision);
            assert_eq!(state.index(), state.accept_count() + state.reject_count());
        }
        assert_eq!(state.index(), 50);
        assert_eq!(state.accept_count(), 17);
    }

    #[test]
    fn test_decision_helpers() {
        assert!(Decision::Accept.is_accept());
        assert!(!Decision::Accept.is_reject());
        assert!(Decision::Reject.is_reject());
        assert_eq!(Decision::from_pass(false), Decision::Reject);
    }

    #[test]
    fn test_display() {
        let state = State::new().rejected().accepted();
        assert_eq!(
            state.to_string(),
            "index=2 accepted=1 rejected=1 suppressed=1 pending=0"
        );
    }
}
