//! The immutable operation value type.
//!
//! An [`Operation`] describes a single edit to flat character-sequence
//! content, tagged with enough metadata to reconcile it against concurrent
//! edits: the participant that generated it, a per-participant sequence
//! counter, and the document version it was generated against.
//!
//! Operations are never mutated after construction; transforms and rebases
//! produce new values. Equality is by value, not identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OtError;

/// Identity of an editing participant.
///
/// The wire representation is a plain string. Ordering is lexicographic and
/// participates in the deterministic tie-break for concurrent operations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// The three edit primitives.
///
/// Positions and lengths are character offsets/counts, not byte offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpKind {
    /// Splice `text` in at `position`.
    Insert { position: usize, text: String },
    /// Remove `length` characters starting at `position`.
    Delete { position: usize, length: usize },
    /// No-op placeholder used for cursor math and serialization alignment.
    Retain { length: usize },
}

/// A single immutable edit with reconciliation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    kind: OpKind,
    originator: ParticipantId,
    sequence: u64,
    base_version: u64,
}

impl Operation {
    /// Create an insert operation.
    ///
    /// Rejects empty text: an insert that splices nothing is not a valid
    /// edit (use [`Operation::retain`] for a placeholder).
    pub fn insert(
        position: usize,
        text: impl Into<String>,
        originator: ParticipantId,
        sequence: u64,
        base_version: u64,
    ) -> Result<Self, OtError> {
        let text = text.into();
        if text.is_empty() {
            return Err(OtError::validation("insert text must be non-empty"));
        }
        Ok(Self {
            kind: OpKind::Insert { position, text },
            originator,
            sequence,
            base_version,
        })
    }

    /// Create a delete operation. Rejects zero-length deletions.
    pub fn delete(
        position: usize,
        length: usize,
        originator: ParticipantId,
        sequence: u64,
        base_version: u64,
    ) -> Result<Self, OtError> {
        if length == 0 {
            return Err(OtError::validation("delete length must be positive"));
        }
        Ok(Self {
            kind: OpKind::Delete { position, length },
            originator,
            sequence,
            base_version,
        })
    }

    /// Create a retain (no-op) operation.
    pub fn retain(
        length: usize,
        originator: ParticipantId,
        sequence: u64,
        base_version: u64,
    ) -> Self {
        Self {
            kind: OpKind::Retain { length },
            originator,
            sequence,
            base_version,
        }
    }

    pub fn kind(&self) -> &OpKind {
        &self.kind
    }

    pub fn originator(&self) -> &ParticipantId {
        &self.originator
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Document version this operation was generated against.
    pub fn base_version(&self) -> u64 {
        self.base_version
    }

    /// Character count this operation inserts or spans.
    pub fn effective_len(&self) -> usize {
        match &self.kind {
            OpKind::Insert { text, .. } => text.chars().count(),
            OpKind::Delete { length, .. } | OpKind::Retain { length } => *length,
        }
    }

    /// Whether this operation leaves content untouched.
    pub fn is_noop(&self) -> bool {
        matches!(self.kind, OpKind::Retain { .. })
    }

    /// Deterministic total order over concurrent operations.
    ///
    /// The lower `(originator, sequence)` tuple is treated as "first" when
    /// positions alone cannot order two operations.
    pub fn precedes(&self, other: &Operation) -> bool {
        (&self.originator, self.sequence) < (&other.originator, other.sequence)
    }

    /// Re-express this operation against a new base version.
    ///
    /// The content shape is unchanged; only used by the session after a
    /// transform has already re-expressed the positions.
    pub fn with_base_version(&self, base_version: u64) -> Operation {
        Operation {
            base_version,
            ..self.clone()
        }
    }

    /// Derive a new operation with the same identity but a different shape.
    pub(crate) fn with_kind(&self, kind: OpKind) -> Operation {
        Operation {
            kind,
            ..self.clone()
        }
    }
}
