//! Local edit translation.
//!
//! Converts a raw text-field mutation into edit primitives. Intent is
//! consumed directly from the input event — the selected character range
//! plus its replacement text — and a replacement always expands to an
//! explicit delete followed by an insert. Reconstructing intent by diffing
//! old against new content cannot represent a replace-selection edit and
//! misidentifies operation boundaries on multi-point edits, so no diffing
//! happens anywhere in this layer.

use scribe_ot::OtError;

/// A raw edit as reported by the text field: the selected character range
/// `[start, end)` and the text that replaced it.
///
/// A collapsed range (`start == end`) with text is a plain insertion; a
/// non-empty range with empty text is a plain deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDelta {
    start: usize,
    end: usize,
    replacement: String,
}

/// A primitive edit produced by translation, in application order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditPrimitive {
    Insert { position: usize, text: String },
    Delete { position: usize, length: usize },
}

impl EditDelta {
    pub fn new(
        start: usize,
        end: usize,
        replacement: impl Into<String>,
    ) -> Result<Self, OtError> {
        if end < start {
            return Err(OtError::validation(format!(
                "edit range end {end} precedes start {start}"
            )));
        }
        Ok(Self {
            start,
            end,
            replacement: replacement.into(),
        })
    }

    /// Caret insertion with no selection.
    pub fn insertion(caret: usize, text: impl Into<String>) -> Self {
        Self {
            start: caret,
            end: caret,
            replacement: text.into(),
        }
    }

    /// Plain deletion of `length` characters at `start`.
    pub fn deletion(start: usize, length: usize) -> Self {
        Self {
            start,
            end: start + length,
            replacement: String::new(),
        }
    }

    /// Selection replaced by `text`.
    pub fn replacement(start: usize, end: usize, text: impl Into<String>) -> Result<Self, OtError> {
        Self::new(start, end, text)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Whether this delta changes nothing.
    pub fn is_empty(&self) -> bool {
        self.start == self.end && self.replacement.is_empty()
    }

    /// Expand into primitive edits, in application order: the selection is
    /// deleted first, then the replacement is inserted at the same spot.
    pub fn translate(&self) -> Vec<EditPrimitive> {
        let mut primitives = Vec::with_capacity(2);
        if self.end > self.start {
            primitives.push(EditPrimitive::Delete {
                position: self.start,
                length: self.end - self.start,
            });
        }
        if !self.replacement.is_empty() {
            primitives.push(EditPrimitive::Insert {
                position: self.start,
                text: self.replacement.clone(),
            });
        }
        primitives
    }
}
