//! RelAnn Core - Domain models and shared types
//!
//! This crate defines the core abstractions used throughout RelAnn:
//! - Relation triples and their source categories
//! - Validity flags for reviewed candidates
//! - Common error and warning types
//! - Wire types for the extraction, persistence, and sentence-queue services
//! - Configuration management

pub mod config;
pub mod wire;

pub use config::{AppConfig, ConfigError, LoggingConfig, ReviewConfig, ServiceConfig};
pub use wire::{ExtractionResponse, PersistRequest, SentenceRequest, SentenceResponse};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for RelAnn operations
#[derive(Error, Debug)]
pub enum RelannError {
    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Index {index} out of range for {category} (length {len})")]
    IndexOutOfRange {
        category: Category,
        index: usize,
        len: usize,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{service} service unavailable: {message}")]
    ServiceUnavailable { service: Service, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RelannError>;

impl RelannError {
    /// Shorthand for a transport-level failure of an external service
    pub fn unavailable(service: Service, message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            service,
            message: message.into(),
        }
    }
}

/// Reason a reviewer-authored triple was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Predict on a valid sentence first")]
    NoSentence,

    #[error("Ensure all fields are filled in ({field} is empty)")]
    EmptyField { field: TripleField },

    #[error("Ensure arguments are contained within sentence ({field} \"{value}\" not found)")]
    NotInSentence { field: TripleField, value: String },
}

/// User-visible condition that does not abort an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewWarning {
    /// Confirmation ran with no candidates and no user instances
    NoInstances,
}

impl std::fmt::Display for ReviewWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoInstances => write!(f, "Please process a valid sentence"),
        }
    }
}

/// External collaborator a request was addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Extraction,
    Persistence,
    Queue,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extraction => write!(f, "extraction"),
            Self::Persistence => write!(f, "persistence"),
            Self::Queue => write!(f, "sentence queue"),
        }
    }
}

// ============================================================================
// Triples
// ============================================================================

/// Position of a field inside a triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripleField {
    Entity1,
    Relation,
    Entity2,
}

impl std::fmt::Display for TripleField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entity1 => write!(f, "entity one"),
            Self::Relation => write!(f, "relation"),
            Self::Entity2 => write!(f, "entity two"),
        }
    }
}

/// A relation triple (entity1, relation, entity2)
///
/// Triples are immutable once built and compare structurally: two triples
/// are equal when all three text spans are equal. On the wire a triple is
/// a three-element array `[entity1, relation, entity2]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[String; 3]", into = "[String; 3]")]
pub struct Triple {
    entity1: String,
    relation: String,
    entity2: String,
}

impl Triple {
    /// Create a new triple
    pub fn new(
        entity1: impl Into<String>,
        relation: impl Into<String>,
        entity2: impl Into<String>,
    ) -> Self {
        Self {
            entity1: entity1.into(),
            relation: relation.into(),
            entity2: entity2.into(),
        }
    }

    pub fn entity1(&self) -> &str {
        &self.entity1
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn entity2(&self) -> &str {
        &self.entity2
    }

    /// Fields paired with their position, in order
    pub fn fields(&self) -> [(TripleField, &str); 3] {
        [
            (TripleField::Entity1, self.entity1.as_str()),
            (TripleField::Relation, self.relation.as_str()),
            (TripleField::Entity2, self.entity2.as_str()),
        ]
    }
}

impl From<[String; 3]> for Triple {
    fn from([entity1, relation, entity2]: [String; 3]) -> Self {
        Self {
            entity1,
            relation,
            entity2,
        }
    }
}

impl From<Triple> for [String; 3] {
    fn from(triple: Triple) -> Self {
        [triple.entity1, triple.relation, triple.entity2]
    }
}

impl std::fmt::Display for Triple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.entity1, self.relation, self.entity2)
    }
}

// ============================================================================
// Categories
// ============================================================================

/// Origin of a candidate triple
///
/// - `Model`: statistical relation-extraction model
/// - `DependencyParse`: dependency-parse heuristic
/// - `NerOie`: named-entity + open information extraction heuristic
/// - `User`: reviewer-authored, always valid, removed rather than toggled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "MODEL", alias = "OIE")]
    Model,
    #[serde(rename = "DP", alias = "DEPENDENCY_PARSE")]
    DependencyParse,
    #[serde(rename = "NER-OIE", alias = "NER_OIE")]
    NerOie,
    #[serde(rename = "USER")]
    User,
}

impl Category {
    /// Categories produced by the extraction service, in confirmation order
    pub const PREDICTED: [Category; 3] = [Self::Model, Self::DependencyParse, Self::NerOie];

    /// Get the canonical tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "MODEL",
            Self::DependencyParse => "DP",
            Self::NerOie => "NER-OIE",
            Self::User => "USER",
        }
    }

    /// Whether candidates of this category carry a validity flag
    pub fn is_predicted(&self) -> bool {
        !matches!(self, Self::User)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = RelannError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "model" | "oie" | "m" => Ok(Self::Model),
            "dp" | "dependency_parse" | "dependency-parse" | "d" => Ok(Self::DependencyParse),
            "ner-oie" | "ner_oie" | "neroie" | "n" => Ok(Self::NerOie),
            "user" | "u" => Ok(Self::User),
            _ => Err(RelannError::InvalidCategory(s.to_string())),
        }
    }
}

// ============================================================================
// Validity
// ============================================================================

/// Reviewer decision for one candidate
///
/// A fresh candidate starts as `Invalid`: "not yet reviewed" and "rejected"
/// share the zero value, so confirming without touching a candidate reports
/// it as rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Validity {
    #[default]
    Invalid,
    Valid,
}

impl Validity {
    /// The opposite decision
    pub fn toggled(self) -> Self {
        match self {
            Self::Invalid => Self::Valid,
            Self::Valid => Self::Invalid,
        }
    }

    pub fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl From<bool> for Validity {
    fn from(valid: bool) -> Self {
        if valid {
            Self::Valid
        } else {
            Self::Invalid
        }
    }
}

impl std::fmt::Display for Validity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid => write!(f, "invalid"),
            Self::Valid => write!(f, "valid"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triple_structural_equality() {
        let a = Triple::new("Mary", "is", "Harry");
        let b = Triple::new(String::from("Mary"), "is", "Harry");
        let c = Triple::new("Mary", "is", "Harriet");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_triple_wire_format() {
        let triple = Triple::new("Bob", "died in", "Bosnia");
        let json = serde_json::to_value(&triple).unwrap();
        assert_eq!(json, serde_json::json!(["Bob", "died in", "Bosnia"]));

        let parsed: Triple = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, triple);
    }

    #[test]
    fn test_triple_rejects_short_array() {
        let parsed = serde_json::from_str::<Triple>(r#"["Bob", "died in"]"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("MODEL".parse::<Category>().unwrap(), Category::Model);
        assert_eq!("dp".parse::<Category>().unwrap(), Category::DependencyParse);
        assert_eq!("NER-OIE".parse::<Category>().unwrap(), Category::NerOie);
        assert_eq!("USER".parse::<Category>().unwrap(), Category::User);

        let err = "SRL".parse::<Category>().unwrap_err();
        assert!(matches!(err, RelannError::InvalidCategory(tag) if tag == "SRL"));
    }

    #[test]
    fn test_category_display_round_trip() {
        for category in Category::PREDICTED {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert!(!Category::User.is_predicted());
    }

    #[test]
    fn test_validity_toggle() {
        assert_eq!(Validity::default(), Validity::Invalid);
        assert_eq!(Validity::Invalid.toggled(), Validity::Valid);
        assert_eq!(Validity::Valid.toggled().toggled(), Validity::Valid);
        assert!(Validity::from(true).is_valid());
    }

    #[test]
    fn test_validation_error_messages() {
        let empty = ValidationError::EmptyField {
            field: TripleField::Relation,
        };
        assert!(empty.to_string().contains("relation is empty"));

        let missing = ValidationError::NotInSentence {
            field: TripleField::Entity2,
            value: "brady".to_string(),
        };
        assert!(missing.to_string().contains("\"brady\""));
    }
}
