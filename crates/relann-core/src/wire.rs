//! Wire types for the external services
//!
//! Request and response bodies exchanged with the extraction service,
//! the persistence service, and the sentence queue.

use serde::{Deserialize, Serialize};

use crate::{Category, Triple};

/// Body carrying a single sentence
///
/// Used for extraction requests and for marking a sentence skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceRequest {
    pub sentence: String,
}

impl SentenceRequest {
    pub fn new(sentence: impl Into<String>) -> Self {
        Self {
            sentence: sentence.into(),
        }
    }
}

/// Next unreviewed sentence from the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceResponse {
    pub sentence: String,
}

/// Candidate triples returned by the extraction service
///
/// Missing keys decode as empty lists. Older service deployments send the
/// model candidates as `oie_prediction`; that key is used only when
/// `model_prediction` is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawExtractionResponse")]
pub struct ExtractionResponse {
    pub model_prediction: Vec<Triple>,
    pub dp_prediction: Vec<Triple>,
    pub ner_oie_prediction: Vec<Triple>,
}

#[derive(Deserialize)]
struct RawExtractionResponse {
    #[serde(default)]
    model_prediction: Option<Vec<Triple>>,
    #[serde(default)]
    oie_prediction: Option<Vec<Triple>>,
    #[serde(default)]
    dp_prediction: Vec<Triple>,
    #[serde(default)]
    ner_oie_prediction: Vec<Triple>,
}

impl From<RawExtractionResponse> for ExtractionResponse {
    fn from(raw: RawExtractionResponse) -> Self {
        Self {
            model_prediction: raw
                .model_prediction
                .or(raw.oie_prediction)
                .unwrap_or_default(),
            dp_prediction: raw.dp_prediction,
            ner_oie_prediction: raw.ner_oie_prediction,
        }
    }
}

impl ExtractionResponse {
    /// Candidates for one category (`User` has none)
    pub fn predictions(&self, category: Category) -> &[Triple] {
        match category {
            Category::Model => &self.model_prediction,
            Category::DependencyParse => &self.dp_prediction,
            Category::NerOie => &self.ner_oie_prediction,
            Category::User => &[],
        }
    }

    /// True when no category carries any candidate
    pub fn is_empty(&self) -> bool {
        Category::PREDICTED
            .iter()
            .all(|category| self.predictions(*category).is_empty())
    }

    /// Total number of candidates across categories
    pub fn total(&self) -> usize {
        Category::PREDICTED
            .iter()
            .map(|category| self.predictions(*category).len())
            .sum()
    }
}

/// Confirmed annotations handed to the persistence service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistRequest {
    pub sentence: String,
    pub valid_instances: Vec<Triple>,
    pub invalid_instances: Vec<Triple>,
}
