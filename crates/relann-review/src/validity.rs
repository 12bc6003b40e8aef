//! Validity flags for reviewed candidates
//!
//! [`ValidityState`] keeps one flag per candidate, index-aligned with the
//! [`PredictionSet`] it was reset from. Updates never mutate a snapshot in
//! place: `set` hands back a new state and leaves earlier snapshots intact.
//! Flag storage is shared between snapshots until a category is written.

use std::sync::Arc;

use relann_core::{Category, RelannError, Result, Validity};

use crate::prediction::PredictionSet;
use crate::Location;

/// Per-category validity flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidityState {
    model: Arc<Vec<Validity>>,
    dependency_parse: Arc<Vec<Validity>>,
    ner_oie: Arc<Vec<Validity>>,
}

impl ValidityState {
    /// Fresh flags for a prediction set, every candidate unreviewed
    pub fn reset(predictions: &PredictionSet) -> Self {
        let fresh = |category| Arc::new(vec![Validity::default(); predictions.len(category)]);
        Self {
            model: fresh(Category::Model),
            dependency_parse: fresh(Category::DependencyParse),
            ner_oie: fresh(Category::NerOie),
        }
    }

    fn slot(&self, category: Category) -> Result<&Arc<Vec<Validity>>> {
        match category {
            Category::Model => Ok(&self.model),
            Category::DependencyParse => Ok(&self.dependency_parse),
            Category::NerOie => Ok(&self.ner_oie),
            Category::User => Err(RelannError::InvalidCategory(category.to_string())),
        }
    }

    fn slot_mut(&mut self, category: Category) -> Result<&mut Arc<Vec<Validity>>> {
        match category {
            Category::Model => Ok(&mut self.model),
            Category::DependencyParse => Ok(&mut self.dependency_parse),
            Category::NerOie => Ok(&mut self.ner_oie),
            Category::User => Err(RelannError::InvalidCategory(category.to_string())),
        }
    }

    /// Flags of one category
    pub fn flags(&self, category: Category) -> Result<&[Validity]> {
        self.slot(category).map(|flags| flags.as_slice())
    }

    /// Number of flags in one category
    pub fn len(&self, category: Category) -> Result<usize> {
        self.flags(category).map(<[Validity]>::len)
    }

    /// Flag of one candidate
    pub fn get(&self, category: Category, index: usize) -> Result<Validity> {
        let flags = self.flags(category)?;
        flags
            .get(index)
            .copied()
            .ok_or(RelannError::IndexOutOfRange {
                category,
                index,
                len: flags.len(),
            })
    }

    /// New snapshot with one flag changed
    ///
    /// Does not propagate; see [`crate::DuplicateResolver::propagate`].
    pub fn set(&self, category: Category, index: usize, value: Validity) -> Result<Self> {
        self.set_all(&[Location::new(category, index)], value)
    }

    /// New snapshot with every listed flag set to `value`
    ///
    /// Fails without producing a snapshot if any location is out of range.
    pub fn set_all(&self, locations: &[Location], value: Validity) -> Result<Self> {
        let mut next = self.clone();
        for location in locations {
            let flags = Arc::make_mut(next.slot_mut(location.category)?);
            let len = flags.len();
            let flag = flags
                .get_mut(location.index)
                .ok_or(RelannError::IndexOutOfRange {
                    category: location.category,
                    index: location.index,
                    len,
                })?;
            *flag = value;
        }
        Ok(next)
    }

    /// Number of flags equal to `value` across all categories
    pub fn count(&self, value: Validity) -> usize {
        [&self.model, &self.dependency_parse, &self.ner_oie]
            .iter()
            .map(|flags| flags.iter().filter(|flag| **flag == value).count())
            .sum()
    }

    /// Whether every category matches the length of `predictions`
    pub fn is_aligned_with(&self, predictions: &PredictionSet) -> bool {
        Category::PREDICTED
            .into_iter()
            .all(|category| self.len(category).ok() == Some(predictions.len(category)))
    }
}
