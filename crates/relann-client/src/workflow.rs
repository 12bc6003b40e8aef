//! Review workflow
//!
//! Drives one sentence at a time through the external services:
//! fetch or submit a sentence, ingest its candidates, let the reviewer
//! work on the session, then persist the confirmation and reset.
//! A failed service call leaves the review as it was so the reviewer
//! can retry: the session only switches sentences once extraction for
//! the new sentence has succeeded.

use std::sync::Arc;

use relann_core::{AppConfig, ExtractionResponse, Result, ValidationError};
use relann_review::{
    Confirmation, ConfirmationAssembler, ExtractionTicket, IngestOutcome, ReviewEvent,
    ReviewSession, ReviewUpdate,
};

use crate::http::HttpServices;
use crate::{ExtractionService, PersistenceService, SentenceQueue};

/// Result of a persisted confirmation
#[derive(Debug, Clone)]
pub struct ConfirmOutcome {
    pub confirmation: Confirmation,
    /// Opaque acknowledgement from the persistence service
    pub acknowledgement: serde_json::Value,
}

/// Review session wired to its external services
pub struct ReviewWorkflow {
    session: ReviewSession,
    extraction: Arc<dyn ExtractionService>,
    persistence: Arc<dyn PersistenceService>,
    queue: Arc<dyn SentenceQueue>,
}

impl ReviewWorkflow {
    /// Create a workflow over the given services
    pub fn new(
        extraction: Arc<dyn ExtractionService>,
        persistence: Arc<dyn PersistenceService>,
        queue: Arc<dyn SentenceQueue>,
    ) -> Self {
        Self {
            session: ReviewSession::new(),
            extraction,
            persistence,
            queue,
        }
    }

    /// Create from config, using HTTP for every service
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let services = Arc::new(HttpServices::from_config(&config.services)?);
        Ok(Self::new(services.clone(), services.clone(), services)
            .with_assembler(ConfirmationAssembler::from_config(&config.review)))
    }

    /// Set the confirmation assembler
    pub fn with_assembler(mut self, assembler: ConfirmationAssembler) -> Self {
        self.session = self.session.with_assembler(assembler);
        self
    }

    pub fn session(&self) -> &ReviewSession {
        &self.session
    }

    /// Forward a reviewer intent to the session
    ///
    /// `Confirm` here only assembles; use [`Self::confirm`] to persist.
    pub fn apply(&mut self, event: ReviewEvent) -> Result<ReviewUpdate> {
        self.session.apply(event)
    }

    /// Request `sentence` without contacting any service
    ///
    /// The current review stays in place until the matching response is
    /// passed to [`Self::ingest`].
    pub fn begin(&mut self, sentence: impl Into<String>) -> ExtractionTicket {
        self.session.begin(sentence)
    }

    /// Run extraction for a ticket; the session is not touched
    ///
    /// Several of these may be in flight; pair each result with
    /// [`Self::ingest`], which discards answers for superseded sentences.
    pub async fn extract(
        &self,
        ticket: ExtractionTicket,
    ) -> Result<(ExtractionTicket, ExtractionResponse)> {
        let response = self.extraction.predict(&ticket.sentence).await?;
        Ok((ticket, response))
    }

    /// Apply an extraction response to the session
    pub fn ingest(
        &mut self,
        ticket: &ExtractionTicket,
        response: ExtractionResponse,
    ) -> IngestOutcome {
        self.session.ingest(ticket, response)
    }

    /// Start reviewing `sentence`: extract and ingest its candidates
    ///
    /// On an extraction failure the previous review is kept.
    pub async fn submit(&mut self, sentence: impl Into<String>) -> Result<IngestOutcome> {
        let ticket = self.begin(sentence);
        let (ticket, response) = self.extract(ticket).await?;
        Ok(self.ingest(&ticket, response))
    }

    /// Fetch the next sentence from the queue and submit it
    pub async fn next_sentence(&mut self) -> Result<(String, IngestOutcome)> {
        let sentence = self.queue.next_sentence().await?;
        tracing::info!(sentence = %sentence, "fetched next sentence");
        let outcome = self.submit(sentence.clone()).await?;
        Ok((sentence, outcome))
    }

    /// Mark the current sentence skipped and reset the session
    pub async fn skip(&mut self) -> Result<()> {
        let sentence = self
            .session
            .sentence()
            .ok_or(ValidationError::NoSentence)?
            .to_string();
        self.queue.skip(&sentence).await?;
        tracing::info!(sentence = %sentence, "sentence skipped");
        self.session.reset();
        Ok(())
    }

    /// Assemble, persist, and reset for the next sentence
    ///
    /// A `NoInstances` warning does not stop persistence. If the
    /// persistence call fails the session is kept for a retry.
    pub async fn confirm(&mut self) -> Result<ConfirmOutcome> {
        let confirmation = self.session.confirm()?;
        if let Some(warning) = confirmation.warning {
            tracing::warn!(%warning, "confirming anyway");
        }

        let acknowledgement = self
            .persistence
            .persist(&confirmation.to_persist_request())
            .await?;
        self.session.reset();

        Ok(ConfirmOutcome {
            confirmation,
            acknowledgement,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use relann_core::{Category, PersistRequest, RelannError, Service, Triple, Validity};
    use std::sync::Mutex;

    const FIRST: &str = "Bob died in July 1984 in Bosnia.";
    const SECOND: &str = "Bob killed Conrad in London";

    /// Extraction that returns fixed candidates, or fails for one sentence
    struct Fixed {
        response: ExtractionResponse,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl ExtractionService for Fixed {
        async fn predict(&self, sentence: &str) -> Result<ExtractionResponse> {
            if self.fail_on == Some(sentence) {
                return Err(RelannError::unavailable(Service::Extraction, "model not loaded"));
            }
            Ok(self.response.clone())
        }
    }

    /// Persistence that records requests or fails on demand
    #[derive(Default)]
    struct Recorder {
        fail: bool,
        stored: Mutex<Vec<PersistRequest>>,
    }

    #[async_trait]
    impl PersistenceService for Recorder {
        async fn persist(&self, request: &PersistRequest) -> Result<serde_json::Value> {
            if self.fail {
                return Err(RelannError::unavailable(Service::Persistence, "connection refused"));
            }
            self.stored.lock().unwrap().push(request.clone());
            Ok(serde_json::json!("Ok"))
        }
    }

    /// Queue that hands out one fixed sentence, or none
    struct Queue(Option<&'static str>);

    #[async_trait]
    impl SentenceQueue for Queue {
        async fn next_sentence(&self) -> Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| RelannError::unavailable(Service::Queue, "no sentences"))
        }

        async fn skip(&self, _sentence: &str) -> Result<()> {
            Ok(())
        }
    }

    fn build(
        recorder: Arc<Recorder>,
        fail_on: Option<&'static str>,
        queue: Option<&'static str>,
    ) -> ReviewWorkflow {
        let extraction = Fixed {
            response: ExtractionResponse {
                model_prediction: vec![Triple::new("Bob", "died in", "Bosnia")],
                ..Default::default()
            },
            fail_on,
        };
        ReviewWorkflow::new(Arc::new(extraction), recorder, Arc::new(Queue(queue)))
    }

    fn workflow(recorder: Arc<Recorder>) -> ReviewWorkflow {
        build(recorder, None, None)
    }

    /// Review of FIRST with one flag set and one user instance
    async fn reviewed(workflow: &mut ReviewWorkflow) {
        workflow.submit(FIRST).await.unwrap();
        workflow
            .apply(ReviewEvent::Toggle {
                category: Category::Model,
                index: 0,
            })
            .unwrap();
        workflow
            .apply(ReviewEvent::AddUser {
                entity1: "Bob".to_string(),
                relation: "died".to_string(),
                entity2: "Bosnia".to_string(),
            })
            .unwrap();
    }

    fn assert_review_intact(workflow: &ReviewWorkflow) {
        let session = workflow.session();
        assert_eq!(session.sentence(), Some(FIRST));
        assert_eq!(session.predictions().total(), 1);
        assert_eq!(session.get(Category::Model, 0).unwrap(), Validity::Valid);
        assert_eq!(session.user_instances().len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_persists_and_resets() {
        let recorder = Arc::new(Recorder::default());
        let mut workflow = workflow(recorder.clone());

        workflow.submit(FIRST).await.unwrap();
        workflow
            .apply(ReviewEvent::Toggle {
                category: Category::Model,
                index: 0,
            })
            .unwrap();
        let outcome = workflow.confirm().await.unwrap();
        assert_eq!(outcome.acknowledgement, serde_json::json!("Ok"));

        let stored = recorder.stored.lock().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].valid_instances.len(), 1);
        assert!(workflow.session().sentence().is_none());
    }

    #[tokio::test]
    async fn test_failed_persist_keeps_session() {
        let recorder = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });
        let mut workflow = workflow(recorder);

        workflow.submit(FIRST).await.unwrap();
        let err = workflow.confirm().await.unwrap_err();
        assert!(matches!(err, RelannError::ServiceUnavailable { .. }));
        assert_eq!(workflow.session().predictions().total(), 1);
    }

    #[tokio::test]
    async fn test_failed_extraction_keeps_review() {
        let mut workflow = build(Arc::new(Recorder::default()), Some(SECOND), None);
        reviewed(&mut workflow).await;

        let err = workflow.submit(SECOND).await.unwrap_err();
        assert!(matches!(
            err,
            RelannError::ServiceUnavailable {
                service: Service::Extraction,
                ..
            }
        ));
        assert_review_intact(&workflow);

        // the reviewer can carry on and confirm the original sentence
        let outcome = workflow.confirm().await.unwrap();
        assert_eq!(outcome.confirmation.sentence, FIRST);
        assert_eq!(outcome.confirmation.accepted.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_extraction_of_queued_sentence_keeps_review() {
        let mut workflow = build(Arc::new(Recorder::default()), Some(SECOND), Some(SECOND));
        reviewed(&mut workflow).await;

        assert!(workflow.next_sentence().await.is_err());
        assert_review_intact(&workflow);
    }

    #[tokio::test]
    async fn test_retry_after_failed_extraction() {
        let mut workflow = build(Arc::new(Recorder::default()), Some(SECOND), None);
        reviewed(&mut workflow).await;
        assert!(workflow.submit(SECOND).await.is_err());

        assert_eq!(workflow.submit(FIRST).await.unwrap(), IngestOutcome::Applied);
        assert_eq!(workflow.session().sentence(), Some(FIRST));
        assert!(workflow.session().user_instances().is_empty());
    }

    #[tokio::test]
    async fn test_skip_without_sentence() {
        let mut workflow = workflow(Arc::new(Recorder::default()));
        let err = workflow.skip().await.unwrap_err();
        assert!(matches!(
            err,
            RelannError::Validation(ValidationError::NoSentence)
        ));
    }

    #[tokio::test]
    async fn test_queue_failure_leaves_session_untouched() {
        let mut workflow = workflow(Arc::new(Recorder::default()));
        workflow.submit(FIRST).await.unwrap();

        assert!(workflow.next_sentence().await.is_err());
        assert_eq!(workflow.session().sentence(), Some(FIRST));
    }
}
