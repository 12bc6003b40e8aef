//! Candidate triples for the sentence under review
//!
//! A [`PredictionSet`] holds one ordered list per extraction source.
//! Positions are stable for the lifetime of a sentence: they are the
//! addressing scheme used by validity flags and the duplicate index.

use relann_core::{Category, ExtractionResponse, RelannError, Result, Triple};

use crate::Location;

/// Ordered candidates per extraction source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredictionSet {
    model: Vec<Triple>,
    dependency_parse: Vec<Triple>,
    ner_oie: Vec<Triple>,
}

impl PredictionSet {
    /// Create an empty prediction set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an extraction response, replacing every category at once
    pub fn from_response(response: ExtractionResponse) -> Self {
        Self {
            model: response.model_prediction,
            dependency_parse: response.dp_prediction,
            ner_oie: response.ner_oie_prediction,
        }
    }

    fn slot(&self, category: Category) -> Option<&Vec<Triple>> {
        match category {
            Category::Model => Some(&self.model),
            Category::DependencyParse => Some(&self.dependency_parse),
            Category::NerOie => Some(&self.ner_oie),
            Category::User => None,
        }
    }

    /// Candidates of one category
    pub fn get(&self, category: Category) -> Result<&[Triple]> {
        self.slot(category)
            .map(Vec::as_slice)
            .ok_or_else(|| RelannError::InvalidCategory(category.to_string()))
    }

    /// Candidate at one position
    pub fn triple(&self, category: Category, index: usize) -> Result<&Triple> {
        let triples = self.get(category)?;
        triples.get(index).ok_or(RelannError::IndexOutOfRange {
            category,
            index,
            len: triples.len(),
        })
    }

    /// Number of candidates in one category (zero for `User`)
    pub fn len(&self, category: Category) -> usize {
        self.slot(category).map_or(0, Vec::len)
    }

    /// Total candidates across all categories
    pub fn total(&self) -> usize {
        self.model.len() + self.dependency_parse.len() + self.ner_oie.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// All candidates in category-then-index order
    pub fn iter(&self) -> impl Iterator<Item = (Location, &Triple)> + '_ {
        Category::PREDICTED.into_iter().flat_map(move |category| {
            self.get(category)
                .unwrap_or_default()
                .iter()
                .enumerate()
                .map(move |(index, triple)| (Location::new(category, index), triple))
        })
    }
}
