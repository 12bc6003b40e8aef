//! Confirmation: final accepted/rejected partition
//!
//! Accepted holds every candidate flagged valid followed by all
//! reviewer-authored instances; rejected holds every candidate flagged
//! invalid. Order is category-then-index: MODEL, DP, NER-OIE, USER.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use relann_core::{PersistRequest, Result, ReviewConfig, ReviewWarning, Triple, Validity};

use crate::prediction::PredictionSet;
use crate::user::UserInstances;
use crate::validity::ValidityState;

/// Outcome of confirming a sentence's review
#[derive(Debug, Clone, Serialize)]
pub struct Confirmation {
    pub sentence: String,
    pub accepted: Vec<Triple>,
    pub rejected: Vec<Triple>,
    /// Set when there was nothing to confirm; the confirmation still stands
    pub warning: Option<ReviewWarning>,
    pub confirmed_at: DateTime<Utc>,
}

impl Confirmation {
    /// Payload for the persistence service
    pub fn to_persist_request(&self) -> PersistRequest {
        PersistRequest {
            sentence: self.sentence.clone(),
            valid_instances: self.accepted.clone(),
            invalid_instances: self.rejected.clone(),
        }
    }
}

impl From<Confirmation> for PersistRequest {
    fn from(confirmation: Confirmation) -> Self {
        Self {
            sentence: confirmation.sentence,
            valid_instances: confirmation.accepted,
            invalid_instances: confirmation.rejected,
        }
    }
}

/// Builds the accepted/rejected partition
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfirmationAssembler {
    dedup: bool,
}

impl ConfirmationAssembler {
    /// Create an assembler that keeps repeated triples
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from config
    pub fn from_config(config: &ReviewConfig) -> Self {
        Self::new().with_dedup(config.dedup_on_confirm)
    }

    /// Drop repeated triples (keeping the first occurrence) from each set
    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }

    pub fn dedup(&self) -> bool {
        self.dedup
    }

    /// Partition the tracked candidates and user instances
    pub fn assemble(
        &self,
        sentence: &str,
        predictions: &PredictionSet,
        validity: &ValidityState,
        user: &UserInstances,
    ) -> Result<Confirmation> {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        for (location, triple) in predictions.iter() {
            match validity.get(location.category, location.index)? {
                Validity::Valid => accepted.push(triple.clone()),
                Validity::Invalid => rejected.push(triple.clone()),
            }
        }
        accepted.extend(user.iter().cloned());

        let warning = if predictions.is_empty() && user.is_empty() {
            tracing::warn!(sentence, "confirming with no instances");
            Some(ReviewWarning::NoInstances)
        } else {
            None
        };

        if self.dedup {
            accepted = dedup_triples(accepted);
            rejected = dedup_triples(rejected);
        }

        tracing::info!(
            sentence,
            accepted = accepted.len(),
            rejected = rejected.len(),
            dedup = self.dedup,
            "review confirmed"
        );

        Ok(Confirmation {
            sentence: sentence.to_string(),
            accepted,
            rejected,
            warning,
            confirmed_at: Utc::now(),
        })
    }
}

fn dedup_triples(triples: Vec<Triple>) -> Vec<Triple> {
    let mut seen = HashSet::with_capacity(triples.len());
    triples
        .into_iter()
        .filter(|triple| seen.insert(triple.clone()))
        .collect()
}
