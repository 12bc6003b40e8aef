//! Review statistics

use serde::{Deserialize, Serialize};

/// Counts for the sentence under review
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStats {
    /// Candidates across all extraction sources
    pub candidates: usize,
    /// Candidates currently flagged valid
    pub valid: usize,
    /// Candidates flagged invalid (including unreviewed)
    pub invalid: usize,
    /// Reviewer-authored instances
    pub user_instances: usize,
    /// Triples produced at more than one location
    pub duplicate_groups: usize,
}

impl ReviewStats {
    /// Triples that would be accepted on confirmation
    pub fn total_accepted(&self) -> usize {
        self.valid + self.user_instances
    }

    /// Everything that would be sent for persistence
    pub fn total(&self) -> usize {
        self.candidates + self.user_instances
    }

    /// Share of tracked triples that would be accepted
    pub fn acceptance_rate(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.total_accepted() as f32 / total as f32
        }
    }
}
