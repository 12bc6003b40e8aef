//! RelAnn Review - Annotation validity reconciliation
//!
//! Tracks which extracted relation candidates a reviewer accepted,
//! keeps structurally identical candidates in agreement across
//! extraction sources, and assembles the final accepted/rejected
//! partition for persistence.
//!
//! Every mutating operation returns a fresh immutable snapshot; the
//! [`ReviewSession`] owns the current state and is its only mutator.

use serde::{Deserialize, Serialize};

use relann_core::Category;

pub mod confirm;
pub mod duplicate;
pub mod prediction;
pub mod session;
pub mod stats;
pub mod user;
pub mod validity;

pub use confirm::{Confirmation, ConfirmationAssembler};
pub use duplicate::DuplicateResolver;
pub use prediction::PredictionSet;
pub use session::{
    CandidateView, ExtractionTicket, IngestOutcome, ReviewEvent, ReviewSession, ReviewUpdate,
    SessionSnapshot,
};
pub use stats::ReviewStats;
pub use user::{validate_user_triple, UserInstances};
pub use validity::ValidityState;

/// Address of one candidate: its category and position within it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub category: Category,
    pub index: usize,
}

impl Location {
    pub fn new(category: Category, index: usize) -> Self {
        Self { category, index }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.category, self.index)
    }
}
