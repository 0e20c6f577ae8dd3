//! Wire messages for broadcast operations.
//!
//! One message per operation, tagged with the document it belongs to:
//!
//! ```text
//! { kind, position, length?, text?, originatorId, sequenceNo,
//!   baseVersion, documentId }
//! ```
//!
//! The binary encoding is bincode (the transport's native format); a JSON
//! rendition with exactly the field names above is provided for debugging
//! and interop. Decoding validates kind-specific required fields before
//! handing the payload to the operation constructors, so a malformed
//! message never reaches a queue.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use scribe_ot::{OpKind, Operation, OtError, ParticipantId};

/// Identity of a document, a plain string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
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

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Wire-level operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireKind {
    Insert,
    Delete,
    Retain,
}

/// A broadcast operation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationMessage {
    pub kind: WireKind,
    pub position: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub originator_id: String,
    pub sequence_no: u64,
    pub base_version: u64,
    pub document_id: String,
}

impl OperationMessage {
    /// Package an operation for broadcast.
    pub fn from_operation(op: &Operation, document_id: &DocumentId) -> Self {
        let (kind, position, length, text) = match op.kind() {
            OpKind::Insert { position, text } => (
                WireKind::Insert,
                *position as u64,
                None,
                Some(text.clone()),
            ),
            OpKind::Delete { position, length } => (
                WireKind::Delete,
                *position as u64,
                Some(*length as u64),
                None,
            ),
            OpKind::Retain { length } => (WireKind::Retain, 0, Some(*length as u64), None),
        };
        Self {
            kind,
            position,
            length,
            text,
            originator_id: op.originator().as_str().to_string(),
            sequence_no: op.sequence(),
            base_version: op.base_version(),
            document_id: document_id.as_str().to_string(),
        }
    }

    /// Validate and convert into an operation.
    pub fn to_operation(&self) -> Result<Operation, ProtocolError> {
        let originator = ParticipantId::new(self.originator_id.clone());
        let position = usize::try_from(self.position)
            .map_err(|_| ProtocolError::Malformed("position does not fit this platform".into()))?;
        match self.kind {
            WireKind::Insert => {
                let text = self
                    .text
                    .as_ref()
                    .ok_or_else(|| ProtocolError::Malformed("insert requires text".into()))?;
                Ok(Operation::insert(
                    position,
                    text.clone(),
                    originator,
                    self.sequence_no,
                    self.base_version,
                )?)
            }
            WireKind::Delete => {
                let length = self
                    .length
                    .ok_or_else(|| ProtocolError::Malformed("delete requires length".into()))?;
                let length = usize::try_from(length).map_err(|_| {
                    ProtocolError::Malformed("length does not fit this platform".into())
                })?;
                Ok(Operation::delete(
                    position,
                    length,
                    originator,
                    self.sequence_no,
                    self.base_version,
                )?)
            }
            WireKind::Retain => {
                let length = self
                    .length
                    .ok_or_else(|| ProtocolError::Malformed("retain requires length".into()))?;
                let length = usize::try_from(length).map_err(|_| {
                    ProtocolError::Malformed("length does not fit this platform".into())
                })?;
                Ok(Operation::retain(
                    length,
                    originator,
                    self.sequence_no,
                    self.base_version,
                ))
            }
        }
    }

    /// Serialize to the binary wire format.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| ProtocolError::Serialization(e.to_string()))
    }

    /// Deserialize from the binary wire format.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let (msg, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| ProtocolError::Deserialization(e.to_string()))?;
        Ok(msg)
    }

    /// JSON rendition with the canonical wire field names.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(json).map_err(|e| ProtocolError::Deserialization(e.to_string()))
    }
}

/// Protocol errors.
#[derive(Debug, Clone, Error)]
pub enum ProtocolError {
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("deserialization error: {0}")]
    Deserialization(String),
    #[error("malformed message: {0}")]
    Malformed(String),
    /// The payload decoded but failed operation validation.
    #[error(transparent)]
    InvalidOperation(#[from] OtError),
}
