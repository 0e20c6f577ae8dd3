//! Per-document reconciliation session.
//!
//! A [`DocumentSession`] owns everything mutable about one open document:
//! the content and version, the append-only applied log, the tracked
//! cursors, and the FIFO queue of locally generated operations that have
//! been applied optimistically but not yet acknowledged. All mutation is
//! serialized through the session — one logical thread of control per
//! document; different documents are fully independent.
//!
//! ```text
//! local edit ──► translate ──► apply ──► PendingQueue ──► OperationReady
//!                                             │
//! remote msg ──► dedupe ──► baseline check ──► transform through queue
//!                                             │
//!                                  apply ──► adjust cursors ──► events
//! ```
//!
//! The session keeps every pending entry re-expressed against
//! `synced_version`, the count of operations integrated into the
//! authoritative order. Local operations are minted against it, and the
//! queue is rebased each time an ingest or acknowledgment advances it —
//! which is what makes every pairwise transform inside the reconciliation
//! loop see equal base versions.
//!
//! Reference: Kleppmann, Chapter 5 — Replication

use std::collections::{HashMap, VecDeque};

use thiserror::Error;

use scribe_ot::{char_len, transform, CursorPosition, Operation, OtError, ParticipantId};

use crate::document::DocumentState;
use crate::edit::{EditDelta, EditPrimitive};
use crate::protocol::{DocumentId, OperationMessage, ProtocolError};

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No document open.
    Idle,
    /// Content loaded, version known.
    Open,
    /// Terminal.
    Closed,
}

/// Events emitted by the session, drained by the embedder.
///
/// `OperationReady` goes to the transport for broadcast; the other two go
/// to the UI layer. The session itself performs no I/O.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A local operation (or a re-transformed pending one) is ready to
    /// broadcast.
    OperationReady(OperationMessage),
    /// Content changed.
    ContentChanged { content: String, version: u64 },
    /// The cursor set changed or moved.
    CursorsChanged(Vec<CursorPosition>),
}

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Ot(#[from] OtError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("session is {actual:?}, expected {expected:?}")]
    WrongState {
        expected: SessionState,
        actual: SessionState,
    },

    #[error("message for document {received} reached session for {expected}")]
    DocumentMismatch { expected: String, received: String },

    /// Remote operation based on a version this session cannot reconcile.
    #[error(
        "stale operation for document {document_id}: based on {actual}, session synced at {expected}"
    )]
    StaleOperation {
        document_id: String,
        expected: u64,
        actual: u64,
    },

    #[error("acknowledgment for sequence {received} does not match pending head {expected:?}")]
    AckMismatch {
        expected: Option<u64>,
        received: u64,
    },

    /// Reconciliation failed; the session refuses further work until
    /// [`DocumentSession::resync`] re-seeds it from the authoritative
    /// store.
    #[error("session for document {document_id} is desynchronized; resync required")]
    Desynchronized { document_id: String },

    /// External transport failure, surfaced but never produced here.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Per-document session state machine.
pub struct DocumentSession {
    document_id: DocumentId,
    local: ParticipantId,
    state: SessionState,
    doc: Option<DocumentState>,
    /// Locally applied but unacknowledged operations, FIFO, never
    /// reordered.
    pending: VecDeque<Operation>,
    /// Operations integrated into the authoritative order (remote ingests
    /// plus acknowledged local operations).
    synced_version: u64,
    /// Per-originator sequence counter for locally minted operations.
    next_sequence: u64,
    /// High-water sequence per originator, for duplicate suppression.
    seen: HashMap<ParticipantId, u64>,
    desynced: bool,
    events: VecDeque<SessionEvent>,
}

impl DocumentSession {
    pub fn new(document_id: DocumentId, local: ParticipantId) -> Self {
        Self {
            document_id,
            local,
            state: SessionState::Idle,
            doc: None,
            pending: VecDeque::new(),
            synced_version: 0,
            next_sequence: 1,
            seen: HashMap::new(),
            desynced: false,
            events: VecDeque::new(),
        }
    }

    // ── lifecycle ────────────────────────────────────────────────────

    /// Idle → Open: seed the document from persisted content.
    pub fn open_document(
        &mut self,
        seed_content: impl Into<String>,
        seed_version: u64,
    ) -> Result<(), SessionError> {
        self.expect_state(SessionState::Idle)?;
        self.doc = Some(DocumentState::new(seed_content, seed_version));
        self.synced_version = seed_version;
        self.state = SessionState::Open;
        log::info!(
            "opened document {} at version {seed_version}",
            self.document_id
        );
        self.emit_content();
        Ok(())
    }

    /// Open → Closed: discard all pending state.
    pub fn close_document(&mut self) -> Result<(), SessionError> {
        self.expect_state(SessionState::Open)?;
        log::info!(
            "closed document {} ({} pending operations discarded)",
            self.document_id,
            self.pending.len()
        );
        self.state = SessionState::Closed;
        self.doc = None;
        self.pending.clear();
        self.events.clear();
        Ok(())
    }

    /// Recover from desynchronization: discard the pending queue and
    /// re-seed from authoritative content. The session stays open.
    pub fn resync(
        &mut self,
        seed_content: impl Into<String>,
        seed_version: u64,
    ) -> Result<(), SessionError> {
        self.expect_state(SessionState::Open)?;
        log::info!(
            "resyncing document {} to version {seed_version} ({} pending operations discarded)",
            self.document_id,
            self.pending.len()
        );
        self.doc = Some(DocumentState::new(seed_content, seed_version));
        self.pending.clear();
        self.synced_version = seed_version;
        self.desynced = false;
        self.emit_content();
        self.emit_cursors();
        Ok(())
    }

    // ── ingress ──────────────────────────────────────────────────────

    /// Translate a raw text-field mutation into operations, apply them
    /// optimistically, and queue them for broadcast.
    ///
    /// Returns the minted operations, already tagged with the pre-edit
    /// authoritative baseline as their base version.
    pub fn submit_local_edit(&mut self, delta: &EditDelta) -> Result<Vec<Operation>, SessionError> {
        self.check_reconcilable()?;

        // Reject the whole delta up front so a replacement can never be
        // half-applied.
        let content_len = char_len(self.doc_ref()?.content());
        if delta.end() > content_len {
            return Err(OtError::OutOfRange {
                position: delta.start(),
                length: delta.end() - delta.start(),
                content_len,
            }
            .into());
        }

        let mut minted = Vec::new();
        for primitive in delta.translate() {
            let sequence = self.next_sequence;
            let op = match primitive {
                EditPrimitive::Insert { position, text } => Operation::insert(
                    position,
                    text,
                    self.local.clone(),
                    sequence,
                    self.synced_version,
                )?,
                EditPrimitive::Delete { position, length } => Operation::delete(
                    position,
                    length,
                    self.local.clone(),
                    sequence,
                    self.synced_version,
                )?,
            };
            self.doc_mut()?.apply_operation(&op)?;
            self.next_sequence += 1;
            self.seen.insert(self.local.clone(), sequence);
            self.pending.push_back(op.clone());
            self.events.push_back(SessionEvent::OperationReady(
                OperationMessage::from_operation(&op, &self.document_id),
            ));
            minted.push(op);
        }

        if !minted.is_empty() {
            log::debug!(
                "document {}: {} local operation(s) applied, {} pending",
                self.document_id,
                minted.len(),
                self.pending.len()
            );
            self.emit_content();
            self.emit_cursors();
        }
        Ok(minted)
    }

    /// Ingest a remote broadcast: dedupe, check the baseline, transform
    /// through the pending queue in FIFO order, apply, and republish the
    /// transformed pending operations.
    ///
    /// A reconciliation failure marks the session desynchronized; the
    /// caller must fetch authoritative content and call
    /// [`DocumentSession::resync`].
    pub fn ingest_remote_operation(&mut self, msg: &OperationMessage) -> Result<(), SessionError> {
        self.check_reconcilable()?;
        if msg.document_id != self.document_id.as_str() {
            return Err(SessionError::DocumentMismatch {
                expected: self.document_id.as_str().to_string(),
                received: msg.document_id.clone(),
            });
        }

        let remote = msg.to_operation()?;

        // Idempotent reapplication: an already-integrated (originator,
        // sequence) pair is a no-op.
        if let Some(&high_water) = self.seen.get(remote.originator()) {
            if remote.sequence() <= high_water {
                log::debug!(
                    "document {}: duplicate operation {}#{} ignored",
                    self.document_id,
                    remote.originator(),
                    remote.sequence()
                );
                return Ok(());
            }
        }

        if remote.base_version() != self.synced_version {
            log::warn!(
                "document {}: operation {}#{} based on {}, session synced at {}",
                self.document_id,
                remote.originator(),
                remote.sequence(),
                remote.base_version(),
                self.synced_version
            );
            return Err(SessionError::StaleOperation {
                document_id: self.document_id.as_str().to_string(),
                expected: self.synced_version,
                actual: remote.base_version(),
            });
        }

        // Transform the remote operation against every pending entry in
        // generation order, carrying the progressively transformed remote
        // forward while collecting the re-expressed queue. Nothing is
        // committed until the whole pass has succeeded.
        let mut incoming = remote;
        let mut reconciled = VecDeque::with_capacity(self.pending.len());
        let mut failure = None;
        for entry in &self.pending {
            match transform(&incoming, entry) {
                Ok((next_incoming, next_entry)) => {
                    incoming = next_incoming;
                    reconciled.push_back(next_entry);
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        if let Some(e) = failure {
            return Err(self.mark_desynced(e));
        }

        let applied = self.doc_mut()?.apply_operation(&incoming);
        if let Err(e) = applied {
            return Err(self.mark_desynced(e));
        }

        self.pending = reconciled;
        self.synced_version += 1;
        self.seen
            .insert(incoming.originator().clone(), incoming.sequence());

        // Republish the queue, re-expressed against the new baseline.
        for entry in self.pending.iter_mut() {
            *entry = entry.with_base_version(self.synced_version);
            self.events.push_back(SessionEvent::OperationReady(
                OperationMessage::from_operation(entry, &self.document_id),
            ));
        }

        log::debug!(
            "document {}: integrated {}#{}, now at version {} ({} pending)",
            self.document_id,
            incoming.originator(),
            incoming.sequence(),
            self.synced_version,
            self.pending.len()
        );
        self.emit_content();
        self.emit_cursors();
        Ok(())
    }

    /// Remove the head of the pending queue once the transport confirms
    /// durable broadcast of the matching operation.
    ///
    /// The surviving queue is rebased to the advanced baseline and
    /// republished: the copies broadcast earlier referenced the old base
    /// version and are superseded.
    pub fn acknowledge_local_operation(&mut self, sequence_no: u64) -> Result<(), SessionError> {
        self.check_reconcilable()?;
        let head = self.pending.front().map(Operation::sequence);
        if head != Some(sequence_no) {
            log::warn!(
                "document {}: acknowledgment for {sequence_no} does not match pending head {head:?}",
                self.document_id
            );
            return Err(SessionError::AckMismatch {
                expected: head,
                received: sequence_no,
            });
        }
        self.pending.pop_front();
        self.synced_version += 1;
        let synced_version = self.synced_version;
        for entry in self.pending.iter_mut() {
            *entry = entry.with_base_version(synced_version);
            self.events.push_back(SessionEvent::OperationReady(
                OperationMessage::from_operation(entry, &self.document_id),
            ));
        }
        log::debug!(
            "document {}: acknowledged #{sequence_no}, {} still pending",
            self.document_id,
            self.pending.len()
        );
        Ok(())
    }

    // ── cursors ──────────────────────────────────────────────────────

    /// Record or move a participant's cursor. Presentation metadata is
    /// passed through untouched; positions are subsequently maintained by
    /// the operation stream.
    pub fn update_cursor(&mut self, cursor: CursorPosition) -> Result<(), SessionError> {
        self.expect_state(SessionState::Open)?;
        self.doc_mut()?.set_cursor(cursor);
        self.emit_cursors();
        Ok(())
    }

    pub fn remove_cursor(&mut self, participant: &ParticipantId) -> Result<(), SessionError> {
        self.expect_state(SessionState::Open)?;
        let removed = self.doc_mut()?.remove_cursor(participant).is_some();
        if removed {
            self.emit_cursors();
        }
        Ok(())
    }

    // ── observers ────────────────────────────────────────────────────

    /// Drain queued events for the transport and UI layers.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.local
    }

    pub fn document(&self) -> Option<&DocumentState> {
        self.doc.as_ref()
    }

    pub fn content(&self) -> Option<&str> {
        self.doc.as_ref().map(DocumentState::content)
    }

    pub fn version(&self) -> Option<u64> {
        self.doc.as_ref().map(DocumentState::version)
    }

    /// The authoritative baseline this session has integrated up to.
    pub fn synced_version(&self) -> u64 {
        self.synced_version
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether reconciliation failed and a [`DocumentSession::resync`] is
    /// required before further edits.
    pub fn needs_resync(&self) -> bool {
        self.desynced
    }

    // ── internals ────────────────────────────────────────────────────

    fn expect_state(&self, expected: SessionState) -> Result<(), SessionError> {
        if self.state != expected {
            return Err(SessionError::WrongState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    fn check_reconcilable(&self) -> Result<(), SessionError> {
        self.expect_state(SessionState::Open)?;
        if self.desynced {
            return Err(SessionError::Desynchronized {
                document_id: self.document_id.as_str().to_string(),
            });
        }
        Ok(())
    }

    fn doc_ref(&self) -> Result<&DocumentState, SessionError> {
        self.doc.as_ref().ok_or(SessionError::WrongState {
            expected: SessionState::Open,
            actual: self.state,
        })
    }

    fn doc_mut(&mut self) -> Result<&mut DocumentState, SessionError> {
        let actual = self.state;
        self.doc.as_mut().ok_or(SessionError::WrongState {
            expected: SessionState::Open,
            actual,
        })
    }

    fn mark_desynced(&mut self, cause: OtError) -> SessionError {
        log::warn!(
            "document {}: reconciliation failed ({cause}); resync required",
            self.document_id
        );
        self.desynced = true;
        cause.into()
    }

    fn emit_content(&mut self) {
        if let Some(doc) = &self.doc {
            self.events.push_back(SessionEvent::ContentChanged {
                content: doc.content().to_string(),
                version: doc.version(),
            });
        }
    }

    fn emit_cursors(&mut self) {
        if let Some(doc) = &self.doc {
            self.events
                .push_back(SessionEvent::CursorsChanged(doc.cursors()));
        }
    }
}
