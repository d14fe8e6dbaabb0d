//! Shared, lock-free accept/reject statistics.
//!
//! A `Context` owns one atomically swapped pointer to the current `State`.
//! Transitions load the current state, compute the next one, and publish it
//! with compare-and-swap, retrying on contention. Readers always see a whole
//! snapshot, never a mix of two.

use crate::domain::state::{Decision, State};
use arc_swap::ArcSwap;
use std::sync::Arc;

/// Statistics shared by every evaluation of one conditional.
#[derive(Debug)]
pub struct Context {
    state: ArcSwap<State>,
}

impl Context {
    /// Create a context with zeroed counters.
    pub fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(State::new()),
        }
    }

    /// Create a context behind an `Arc`, the form conditionals share.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Latest snapshot.
    pub fn state(&self) -> State {
        **self.state.load()
    }

    /// Record an accept and return the resulting state.
    pub fn on_accept(&self) -> State {
        self.transition(State::accepted)
    }

    /// Record a reject and return the resulting state.
    pub fn on_reject(&self) -> State {
        self.transition(State::rejected)
    }

    /// Record a decision and return the resulting state.
    pub fn record(&self, decision: Decision) -> State {
        match decision {
            Decision::Accept => self.on_accept(),
            Decision::Reject => self.on_reject(),
        }
    }

    /// Total accepted evaluations.
    pub fn accepted(&self) -> u64 {
        self.state.load().accept_count()
    }

    /// Total rejected evaluations.
    pub fn rejected(&self) -> u64 {
        self.state.load().reject_count()
    }

    /// Rejects suppressed right before the most recent accept.
    pub fn suppressed(&self) -> u64 {
        self.state.load().suppressed_count()
    }

    /// Rejects since the most recent accept.
    pub fn pending_suppressed(&self) -> u64 {
        self.state.load().next_suppressed_count()
    }

    /// Total evaluations.
    pub fn index(&self) -> u64 {
        self.state.load().index()
    }

    fn transition(&self, next_of: impl Fn(&State) -> State) -> State {
        let mut current = self.state.load();
        loop {
            let next = Arc::new(next_of(&**current));
            let previous = self.state.compare_and_swap(&*current, Arc::clone(&next));
            if Arc::ptr_eq(&*previous, &*current) {
                return *next;
            }
            current = previous;
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
