//! RelAnn Client - External services and the review workflow
//!
//! Defines the traits for the three collaborators a review depends on
//! (extraction, persistence, sentence queue), HTTP implementations of
//! them, and [`ReviewWorkflow`], which drives one sentence from fetch to
//! persisted confirmation.

use async_trait::async_trait;

use relann_core::{ExtractionResponse, PersistRequest, Result};

pub mod http;
pub mod workflow;

pub use http::HttpServices;
pub use workflow::{ConfirmOutcome, ReviewWorkflow};

/// Produces candidate triples for a sentence
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Run every extraction strategy on `sentence`
    async fn predict(&self, sentence: &str) -> Result<ExtractionResponse>;
}

/// Stores confirmed annotations
#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// Store one confirmation; the acknowledgement body is opaque
    async fn persist(&self, request: &PersistRequest) -> Result<serde_json::Value>;
}

/// Hands out sentences awaiting review
#[async_trait]
pub trait SentenceQueue: Send + Sync {
    /// Fetch the next unreviewed sentence
    async fn next_sentence(&self) -> Result<String>;

    /// Mark `sentence` as skipped
    async fn skip(&self, sentence: &str) -> Result<()>;
}
