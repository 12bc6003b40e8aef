//! Review session: owner of all per-sentence state
//!
//! Front ends never reach into the engine's structures. They send
//! [`ReviewEvent`]s to the session and render the immutable
//! [`SessionSnapshot`] it hands back.
//!
//! Extraction runs asynchronously, so a response can arrive after the
//! reviewer moved on to another sentence. Each request is paired with an
//! [`ExtractionTicket`]; a response whose ticket does not name the most
//! recently requested sentence is discarded without touching any state.
//! Requesting a sentence changes nothing under review: the session only
//! switches sentences when that sentence's response is ingested, so a
//! failed request leaves the current review intact.

use std::sync::Arc;

use uuid::Uuid;

use relann_core::{Category, ExtractionResponse, Result, Triple, Validity};

use crate::confirm::{Confirmation, ConfirmationAssembler};
use crate::duplicate::DuplicateResolver;
use crate::prediction::PredictionSet;
use crate::stats::ReviewStats;
use crate::user::{validate_user_triple, UserInstances};
use crate::validity::ValidityState;
use crate::Location;

// ============================================================================
// Tickets and outcomes
// ============================================================================

/// Pairs an in-flight extraction request with the sentence it was sent for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionTicket {
    pub id: Uuid,
    pub sentence: String,
}

impl ExtractionTicket {
    pub fn new(sentence: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sentence: sentence.into(),
        }
    }
}

/// What `ingest` did with an extraction response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Candidates replaced, flags and user instances reset
    Applied,
    /// Empty response: all candidates, flags, and user instances cleared
    Cleared,
    /// Response answered a superseded request; nothing changed
    Stale,
}

// ============================================================================
// Events
// ============================================================================

/// Reviewer intent sent to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewEvent {
    /// Flip one candidate between valid and invalid
    Toggle { category: Category, index: usize },
    /// Force one candidate to a decision
    SetValidity {
        category: Category,
        index: usize,
        value: Validity,
    },
    /// Add a reviewer-authored triple
    AddUser {
        entity1: String,
        relation: String,
        entity2: String,
    },
    /// Remove a reviewer-authored triple by position
    RemoveUser { index: usize },
    /// Assemble the accepted/rejected partition
    Confirm,
}

/// New state produced by a [`ReviewEvent`]
#[derive(Debug, Clone)]
pub enum ReviewUpdate {
    Validity(ValidityState),
    UserInstances(UserInstances),
    Confirmed(Confirmation),
}

// ============================================================================
// Snapshots
// ============================================================================

/// One candidate as a front end renders it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateView {
    pub location: Location,
    pub triple: Triple,
    pub validity: Validity,
    /// Other locations holding the same triple
    pub duplicates: usize,
}

/// Immutable view of the session at one point in time
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub sentence: Option<String>,
    pub predictions: Arc<PredictionSet>,
    pub validity: ValidityState,
    pub user: UserInstances,
    resolver: Arc<DuplicateResolver>,
}

impl SessionSnapshot {
    /// Every candidate with its flag, in category-then-index order
    pub fn candidates(&self) -> Vec<CandidateView> {
        self.predictions
            .iter()
            .map(|(location, triple)| CandidateView {
                location,
                triple: triple.clone(),
                validity: self
                    .validity
                    .get(location.category, location.index)
                    .unwrap_or_default(),
                duplicates: self.resolver.duplicates_of(&self.predictions, location),
            })
            .collect()
    }
}

// ============================================================================
// Session
// ============================================================================

/// Owner and sole mutator of one sentence's review state
#[derive(Debug, Clone, Default)]
pub struct ReviewSession {
    sentence: Option<String>,
    requested: Option<String>,
    predictions: Arc<PredictionSet>,
    resolver: Arc<DuplicateResolver>,
    validity: ValidityState,
    user: UserInstances,
    assembler: ConfirmationAssembler,
}

impl ReviewSession {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the confirmation assembler
    pub fn with_assembler(mut self, assembler: ConfirmationAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Sentence under review, if any
    pub fn sentence(&self) -> Option<&str> {
        self.sentence.as_deref()
    }

    pub fn predictions(&self) -> &PredictionSet {
        &self.predictions
    }

    pub fn validity(&self) -> &ValidityState {
        &self.validity
    }

    pub fn user_instances(&self) -> &UserInstances {
        &self.user
    }

    pub fn resolver(&self) -> &DuplicateResolver {
        &self.resolver
    }

    /// Sentence most recently passed to [`Self::begin`]
    pub fn requested(&self) -> Option<&str> {
        self.requested.as_deref()
    }

    /// Request `sentence` and get the ticket for its extraction
    ///
    /// The review in progress is untouched until the response for this
    /// ticket is ingested. Any ticket issued earlier becomes stale.
    pub fn begin(&mut self, sentence: impl Into<String>) -> ExtractionTicket {
        let ticket = ExtractionTicket::new(sentence);
        self.requested = Some(ticket.sentence.clone());
        tracing::debug!(ticket = %ticket.id, sentence = %ticket.sentence, "extraction requested");
        ticket
    }

    /// Apply an extraction response, unless it is stale
    ///
    /// A response for a different sentence than the one under review
    /// switches the session to it, dropping the previous review.
    pub fn ingest(
        &mut self,
        ticket: &ExtractionTicket,
        response: ExtractionResponse,
    ) -> IngestOutcome {
        if self.requested.as_deref() != Some(ticket.sentence.as_str()) {
            tracing::debug!(
                ticket = %ticket.id,
                answered = %ticket.sentence,
                requested = ?self.requested,
                "discarding stale extraction response"
            );
            return IngestOutcome::Stale;
        }

        if self.sentence.as_deref() != Some(ticket.sentence.as_str()) {
            tracing::info!(sentence = %ticket.sentence, "review started");
            self.sentence = Some(ticket.sentence.clone());
        }

        if response.is_empty() {
            self.clear_review();
            tracing::info!(ticket = %ticket.id, "empty extraction response, review cleared");
            return IngestOutcome::Cleared;
        }

        let predictions = PredictionSet::from_response(response);
        self.resolver = Arc::new(DuplicateResolver::index(&predictions));
        self.validity = ValidityState::reset(&predictions);
        self.predictions = Arc::new(predictions);
        self.user = UserInstances::new();

        tracing::info!(
            ticket = %ticket.id,
            candidates = self.predictions.total(),
            duplicate_groups = self.resolver.duplicate_groups().len(),
            "extraction response applied"
        );
        IngestOutcome::Applied
    }

    /// Flag of one candidate
    pub fn get(&self, category: Category, index: usize) -> Result<Validity> {
        self.validity.get(category, index)
    }

    /// Flip one candidate and every copy of its triple
    pub fn toggle(&mut self, category: Category, index: usize) -> Result<ValidityState> {
        let current = self.validity.get(category, index)?;
        self.set_validity(category, index, current.toggled())
    }

    /// Set one candidate and every copy of its triple
    pub fn set_validity(
        &mut self,
        category: Category,
        index: usize,
        value: Validity,
    ) -> Result<ValidityState> {
        let next =
            self.resolver
                .propagate(&self.predictions, &self.validity, category, index, value)?;
        self.validity = next.clone();
        Ok(next)
    }

    /// Validate and append a reviewer-authored triple
    pub fn add_user(
        &mut self,
        entity1: &str,
        relation: &str,
        entity2: &str,
    ) -> Result<UserInstances> {
        let sentence = self.sentence.as_deref().unwrap_or_default();
        let triple = validate_user_triple(sentence, entity1, relation, entity2)?;
        tracing::debug!(%triple, "user instance added");
        self.user = self.user.add(triple);
        Ok(self.user.clone())
    }

    /// Remove a reviewer-authored triple; later entries shift down by one
    pub fn remove_user(&mut self, index: usize) -> Result<UserInstances> {
        let (next, removed) = self.user.remove(index)?;
        tracing::debug!(triple = %removed, index, "user instance removed");
        self.user = next;
        Ok(self.user.clone())
    }

    /// Assemble the accepted/rejected partition without changing state
    pub fn confirm(&self) -> Result<Confirmation> {
        self.assembler.assemble(
            self.sentence.as_deref().unwrap_or_default(),
            &self.predictions,
            &self.validity,
            &self.user,
        )
    }

    /// Dispatch one reviewer intent
    pub fn apply(&mut self, event: ReviewEvent) -> Result<ReviewUpdate> {
        match event {
            ReviewEvent::Toggle { category, index } => {
                self.toggle(category, index).map(ReviewUpdate::Validity)
            }
            ReviewEvent::SetValidity {
                category,
                index,
                value,
            } => self
                .set_validity(category, index, value)
                .map(ReviewUpdate::Validity),
            ReviewEvent::AddUser {
                entity1,
                relation,
                entity2,
            } => self
                .add_user(&entity1, &relation, &entity2)
                .map(ReviewUpdate::UserInstances),
            ReviewEvent::RemoveUser { index } => {
                self.remove_user(index).map(ReviewUpdate::UserInstances)
            }
            ReviewEvent::Confirm => self.confirm().map(ReviewUpdate::Confirmed),
        }
    }

    /// Current state as data for rendering
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            sentence: self.sentence.clone(),
            predictions: Arc::clone(&self.predictions),
            validity: self.validity.clone(),
            user: self.user.clone(),
            resolver: Arc::clone(&self.resolver),
        }
    }

    /// Counts for the sentence under review
    pub fn stats(&self) -> ReviewStats {
        ReviewStats {
            candidates: self.predictions.total(),
            valid: self.validity.count(Validity::Valid),
            invalid: self.validity.count(Validity::Invalid),
            user_instances: self.user.len(),
            duplicate_groups: self.resolver.duplicate_groups().len(),
        }
    }

    /// Forget the sentence and everything reviewed for it
    pub fn reset(&mut self) {
        self.clear_review();
        self.sentence = None;
        self.requested = None;
    }

    fn clear_review(&mut self) {
        self.predictions = Arc::default();
        self.resolver = Arc::default();
        self.validity = ValidityState::default();
        self.user = UserInstances::new();
    }
}

// ============================================================================
// Tests
// ============================================================================
