//! Applies operations to document content.
//!
//! Content is a flat character sequence; operation positions are character
//! offsets. The byte-offset mapping for Rust's UTF-8 strings happens here
//! and nowhere else.

use crate::error::OtError;
use crate::operation::{OpKind, Operation};

/// Number of characters in `content`.
pub fn char_len(content: &str) -> usize {
    content.chars().count()
}

/// Byte offset of character index `pos`, if `pos <= char_len(content)`.
fn byte_offset(content: &str, pos: usize) -> Option<usize> {
    content
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(content.len()))
        .nth(pos)
}

/// Apply `op` to `content`, producing the new content.
///
/// Out-of-bounds positions fail with [`OtError::OutOfRange`]; callers must
/// resynchronize rather than silently truncate.
pub fn apply(content: &str, op: &Operation) -> Result<String, OtError> {
    match op.kind() {
        OpKind::Insert { position, text } => {
            let at = byte_offset(content, *position).ok_or(OtError::OutOfRange {
                position: *position,
                length: 0,
                content_len: char_len(content),
            })?;
            let mut out = String::with_capacity(content.len() + text.len());
            out.push_str(&content[..at]);
            out.push_str(text);
            out.push_str(&content[at..]);
            Ok(out)
        }
        OpKind::Delete { position, length } => {
            let content_len = char_len(content);
            if position + length > content_len {
                return Err(OtError::OutOfRange {
                    position: *position,
                    length: *length,
                    content_len,
                });
            }
            // Both offsets are in bounds after the check above.
            let start = byte_offset(content, *position).unwrap_or(content.len());
            let end = byte_offset(content, position + length).unwrap_or(content.len());
            let mut out = String::with_capacity(content.len() - (end - start));
            out.push_str(&content[..start]);
            out.push_str(&content[end..]);
            Ok(out)
        }
        OpKind::Retain { .. } => Ok(content.to_string()),
    }
}

/// Algebraic inverse of `op`, relative to the content it was applied to.
///
/// Submitting the inverse as a new local edit reverts an unacknowledged
/// operation; the session re-mints the sequence counter on submission.
pub fn invert(op: &Operation, content_before: &str) -> Result<Operation, OtError> {
    match op.kind() {
        OpKind::Insert { position, text } => Operation::delete(
            *position,
            text.chars().count(),
            op.originator().clone(),
            op.sequence(),
            op.base_version(),
        ),
        OpKind::Delete { position, length } => {
            let content_len = char_len(content_before);
            if position + length > content_len {
                return Err(OtError::OutOfRange {
                    position: *position,
                    length: *length,
                    content_len,
                });
            }
            let removed: String = content_before
                .chars()
                .skip(*position)
                .take(*length)
                .collect();
            Operation::insert(
                *position,
                removed,
                op.originator().clone(),
                op.sequence(),
                op.base_version(),
            )
        }
        OpKind::Retain { length } => Ok(Operation::retain(
            *length,
            op.originator().clone(),
            op.sequence(),
            op.base_version(),
        )),
    }
}
