//! Suppression summaries.
//!
//! A summary describes one conditional whose current reject run is still
//! open, so the suppressed events have not yet been reported by an accepted
//! event carrying `suppressed_count`.

use crate::domain::state::State;

/// Summary of suppression activity for one conditional id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressionSummary {
    /// Identifier of the conditional
    pub id: String,
    /// Snapshot the summary was built from
    pub state: State,
}

impl SuppressionSummary {
    /// Create a summary from a snapshot.
    pub fn new(id: impl Into<String>, state: State) -> Self {
        Self {
            id: id.into(),
            state,
        }
    }

    /// Number of events suppressed since the last accepted one.
    pub fn pending(&self) -> u64 {
        self.state.next_suppressed_count()
    }

    /// Total suppressed events since creation.
    pub fn total_rejected(&self) -> u64 {
        self.state.reject_count()
    }

    /// Format the summary as a human-readable message.
    pub fn format_message(&self) -> String {
        format!(
            "{} events suppressed since last accept ({} accepted, {} rejected in total) for '{}'",
            self.pending(),
            self.state.accept_count(),
            self.state.reject_count(),
            self.id
        )
    }
}
