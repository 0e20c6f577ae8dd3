//! Per-document state owned by a session.

use std::collections::HashMap;

use scribe_ot::{adjust_cursor, apply, CursorPosition, Operation, OtError, ParticipantId};

/// The mutable state of one open document.
///
/// Created when a document is opened (seeded from persisted content at a
/// known version), mutated exclusively through the owning session's apply
/// paths, and discarded when the document is closed.
///
/// Invariants: `version == seed_version + applied_log.len()`, and replaying
/// the applied log over the seed content reproduces `content` exactly.
#[derive(Debug, Clone)]
pub struct DocumentState {
    content: String,
    version: u64,
    seed_version: u64,
    applied_log: Vec<Operation>,
    cursors: HashMap<ParticipantId, CursorPosition>,
}

impl DocumentState {
    /// Seed from persisted content at a known version.
    pub fn new(seed_content: impl Into<String>, seed_version: u64) -> Self {
        Self {
            content: seed_content.into(),
            version: seed_version,
            seed_version,
            applied_log: Vec::new(),
            cursors: HashMap::new(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn seed_version(&self) -> u64 {
        self.seed_version
    }

    /// Append-only record of every operation applied since the seed.
    pub fn applied_log(&self) -> &[Operation] {
        &self.applied_log
    }

    /// Apply `op`, advancing the version, appending to the audit log, and
    /// re-adjusting every tracked cursor. Leaves the state untouched on
    /// failure.
    pub fn apply_operation(&mut self, op: &Operation) -> Result<(), OtError> {
        let next = apply(&self.content, op)?;
        self.content = next;
        self.version += 1;
        self.applied_log.push(op.clone());
        for cursor in self.cursors.values_mut() {
            *cursor = adjust_cursor(cursor, op);
        }
        Ok(())
    }

    pub fn set_cursor(&mut self, cursor: CursorPosition) {
        self.cursors.insert(cursor.participant.clone(), cursor);
    }

    pub fn remove_cursor(&mut self, participant: &ParticipantId) -> Option<CursorPosition> {
        self.cursors.remove(participant)
    }

    pub fn cursor(&self, participant: &ParticipantId) -> Option<&CursorPosition> {
        self.cursors.get(participant)
    }

    /// All tracked cursors; iteration order is not meaningful.
    pub fn cursors(&self) -> Vec<CursorPosition> {
        self.cursors.values().cloned().collect()
    }

    /// Audit helper: replay the applied log over `seed` from scratch.
    ///
    /// With the original seed content this must reproduce `content`
    /// exactly; a divergence means the log or state has been corrupted.
    pub fn replay_from(&self, seed: &str) -> Result<String, OtError> {
        let mut content = seed.to_string();
        for op in &self.applied_log {
            content = apply(&content, op)?;
        }
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: &str) -> ParticipantId {
        ParticipantId::from(id)
    }

    fn ins(pos: usize, text: &str, seq: u64, base: u64) -> Operation {
        Operation::insert(pos, text, p("u1"), seq, base).unwrap()
    }

    #[test]
    fn test_seeded_state() {
        let doc = DocumentState::new("hello", 7);
        assert_eq!(doc.content(), "hello");
        assert_eq!(doc.version(), 7);
        assert_eq!(doc.seed_version(), 7);
        assert!(doc.applied_log().is_empty());
    }

    #[test]
    fn test_apply_advances_version_and_log() {
        let mut doc = DocumentState::new("ab", 0);
        doc.apply_operation(&ins(1, "X", 1, 0)).unwrap();
        doc.apply_operation(&ins(3, "Y", 2, 1)).unwrap();

        assert_eq!(doc.content(), "aXbY");
        assert_eq!(doc.version(), 2);
        assert_eq!(doc.applied_log().len(), 2);
    }

    #[test]
    fn test_version_tracks_log_length() {
        let mut doc = DocumentState::new("seed", 40);
        doc.apply_operation(&ins(0, "x", 1, 40)).unwrap();
        assert_eq!(
            doc.version(),
            doc.seed_version() + doc.applied_log().len() as u64
        );
    }

    #[test]
    fn test_failed_apply_leaves_state_untouched() {
        let mut doc = DocumentState::new("ab", 0);
        let bad = ins(9, "X", 1, 0);
        assert!(doc.apply_operation(&bad).is_err());
        assert_eq!(doc.content(), "ab");
        assert_eq!(doc.version(), 0);
        assert!(doc.applied_log().is_empty());
    }

    #[test]
    fn test_replay_reproduces_content() {
        let mut doc = DocumentState::new("base", 0);
        doc.apply_operation(&ins(4, "ball", 1, 0)).unwrap();
        doc.apply_operation(&Operation::delete(0, 2, p("u2"), 1, 1).unwrap())
            .unwrap();

        assert_eq!(doc.replay_from("base").unwrap(), doc.content());
    }

    #[test]
    fn test_cursors_follow_applied_operations() {
        let mut doc = DocumentState::new("abcdef", 0);
        doc.set_cursor(CursorPosition::new(p("viewer"), 4));

        doc.apply_operation(&ins(0, "xx", 1, 0)).unwrap();
        assert_eq!(doc.cursor(&p("viewer")).unwrap().position, 6);

        doc.apply_operation(&Operation::delete(0, 3, p("u2"), 1, 1).unwrap())
            .unwrap();
        assert_eq!(doc.cursor(&p("viewer")).unwrap().position, 3);
    }

    #[test]
    fn test_remove_cursor() {
        let mut doc = DocumentState::new("ab", 0);
        doc.set_cursor(CursorPosition::new(p("viewer"), 1));
        assert!(doc.remove_cursor(&p("viewer")).is_some());
        assert!(doc.cursor(&p("viewer")).is_none());
        assert!(doc.cursors().is_empty());
    }
}
