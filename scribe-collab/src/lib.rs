//! # scribe-collab — Collaborative editing session layer for Scribe
//!
//! Stateful reconciliation on top of the `scribe-ot` edit algebra:
//! per-document sessions that apply local edits optimistically, transform
//! incoming remote operations against the unacknowledged pending queue,
//! and keep every replica's content and cursors convergent.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   EditDelta    ┌──────────────────┐   OperationMessage
//! │  text field  │ ─────────────► │ DocumentSession  │ ─────────────────►
//! └──────────────┘                │  ┌────────────┐  │   (transport,
//!                                 │  │ Document   │  │    external)
//!   OperationMessage              │  │ State      │  │
//! ─────────────────────────────►  │  ├────────────┤  │   ContentChanged /
//!   (from remote replicas)        │  │ Pending    │  │   CursorsChanged
//!                                 │  │ Queue      │  │ ─────────────────►
//!                                 │  └────────────┘  │   (UI, external)
//!                                 └──────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`document`] — per-document content, version, applied log, cursors
//! - [`edit`] — intent-based translation of raw text-field mutations
//! - [`protocol`] — the broadcast wire message (bincode + JSON)
//! - [`session`] — the reconciliation state machine and pending queue
//!
//! Persistence, authentication, and presence transport are external
//! collaborators: this crate performs no I/O and suspends nowhere. The
//! only touch points are the two ingress calls
//! ([`session::DocumentSession::submit_local_edit`],
//! [`session::DocumentSession::ingest_remote_operation`]) and the drained
//! [`session::SessionEvent`] egress.

pub mod document;
pub mod edit;
pub mod protocol;
pub mod session;

// Re-exports for convenience
pub use document::DocumentState;
pub use edit::{EditDelta, EditPrimitive};
pub use protocol::{DocumentId, OperationMessage, ProtocolError, WireKind};
pub use session::{DocumentSession, SessionError, SessionEvent, SessionState};
