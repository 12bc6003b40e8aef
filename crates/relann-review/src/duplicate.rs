//! Cross-source duplicate propagation
//!
//! The same triple is often produced by more than one extraction source,
//! and occasionally more than once by the same source. All copies must
//! carry the same validity flag, so a decision on one is forced onto every
//! location holding a structurally equal triple. The last decision wins.

use std::collections::HashMap;

use relann_core::{Category, Result, Triple, Validity};

use crate::prediction::PredictionSet;
use crate::validity::ValidityState;
use crate::Location;

/// Index from triple to every location it occupies
///
/// Built once per ingested prediction set, so propagation touches only
/// the matching locations.
#[derive(Debug, Clone, Default)]
pub struct DuplicateResolver {
    locations: HashMap<Triple, Vec<Location>>,
}

impl DuplicateResolver {
    /// Index every candidate of a prediction set
    pub fn index(predictions: &PredictionSet) -> Self {
        let mut locations: HashMap<Triple, Vec<Location>> = HashMap::new();
        for (location, triple) in predictions.iter() {
            locations.entry(triple.clone()).or_default().push(location);
        }
        Self { locations }
    }

    /// Locations holding a triple equal to `triple`, in category-then-index order
    pub fn locations(&self, triple: &Triple) -> &[Location] {
        self.locations
            .get(triple)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of other locations sharing the triple at `location`
    pub fn duplicates_of(&self, predictions: &PredictionSet, location: Location) -> usize {
        predictions
            .triple(location.category, location.index)
            .map(|triple| self.locations(triple).len().saturating_sub(1))
            .unwrap_or(0)
    }

    /// Triples that occur at more than one location, ordered by first occurrence
    pub fn duplicate_groups(&self) -> Vec<(&Triple, &[Location])> {
        let mut groups: Vec<(&Triple, &[Location])> = self
            .locations
            .iter()
            .filter(|(_, locations)| locations.len() > 1)
            .map(|(triple, locations)| (triple, locations.as_slice()))
            .collect();
        groups.sort_by_key(|(_, locations)| locations[0]);
        groups
    }

    /// Set one flag and force every structurally equal candidate to match
    ///
    /// Returns the new validity snapshot; `validity` itself is untouched.
    pub fn propagate(
        &self,
        predictions: &PredictionSet,
        validity: &ValidityState,
        category: Category,
        index: usize,
        value: Validity,
    ) -> Result<ValidityState> {
        let triple = predictions.triple(category, index)?;
        let matches = self.locations(triple);

        if matches.is_empty() {
            // index built from another prediction set; fall back to the single flag
            tracing::warn!(%category, index, "duplicate index out of sync with predictions");
            return validity.set(category, index, value);
        }

        if matches.len() > 1 {
            tracing::debug!(
                %triple,
                copies = matches.len(),
                %value,
                "propagating validity to duplicates"
            );
        }

        validity.set_all(matches, value)
    }
}
