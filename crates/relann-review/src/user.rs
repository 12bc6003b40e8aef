//! Reviewer-authored instances
//!
//! Triples typed in by the reviewer are always accepted. They never carry
//! a validity flag; they are removed instead of being marked invalid.

use std::sync::Arc;

use relann_core::{Category, RelannError, Result, Triple, ValidationError};

/// Ordered reviewer-authored triples
///
/// Addressed by position. Removing an entry shifts every later entry down
/// by one, so callers holding an index must re-check it after a removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInstances {
    instances: Arc<Vec<Triple>>,
}

impl UserInstances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn as_slice(&self) -> &[Triple] {
        &self.instances
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.instances.iter()
    }

    /// Instance at one position
    pub fn get(&self, index: usize) -> Result<&Triple> {
        self.instances.get(index).ok_or(RelannError::IndexOutOfRange {
            category: Category::User,
            index,
            len: self.instances.len(),
        })
    }

    /// New snapshot with `triple` appended
    ///
    /// The triple is expected to have passed [`validate_user_triple`].
    pub fn add(&self, triple: Triple) -> Self {
        let mut instances = Arc::clone(&self.instances);
        Arc::make_mut(&mut instances).push(triple);
        Self { instances }
    }

    /// New snapshot without the entry at `index`, plus the removed triple
    pub fn remove(&self, index: usize) -> Result<(Self, Triple)> {
        self.get(index)?;
        let mut instances = Arc::clone(&self.instances);
        let removed = Arc::make_mut(&mut instances).remove(index);
        Ok((Self { instances }, removed))
    }
}

/// Check a reviewer-authored triple against the sentence under review
///
/// Every field must be non-blank and appear verbatim (case-sensitive
/// substring) in `sentence`. Blank fields are reported before fields
/// missing from the sentence.
pub fn validate_user_triple(
    sentence: &str,
    entity1: &str,
    relation: &str,
    entity2: &str,
) -> std::result::Result<Triple, ValidationError> {
    if sentence.trim().is_empty() {
        return Err(ValidationError::NoSentence);
    }

    let triple = Triple::new(entity1, relation, entity2);
    let fields = triple.fields();

    if let Some((field, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(ValidationError::EmptyField { field: *field });
    }

    if let Some((field, value)) = fields.iter().find(|(_, value)| !sentence.contains(*value)) {
        return Err(ValidationError::NotInSentence {
            field: *field,
            value: value.to_string(),
        });
    }

    Ok(triple)
}
