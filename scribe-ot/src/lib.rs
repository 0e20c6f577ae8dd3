//! # scribe-ot — Operational transformation core for Scribe
//!
//! Pure edit algebra for collaborative plain-text editing: the operation
//! value type, the pairwise transform that reconciles concurrent edits, the
//! content applier, and cursor adjustment. No I/O, no async, no session
//! state — the stateful reconciliation loop lives in `scribe-collab`.
//!
//! ## Architecture
//!
//! ```text
//! participant edit                     remote operation
//!       │                                     │
//!       ▼                                     ▼
//! ┌─────────────┐    transform()       ┌─────────────┐
//! │  Operation  │ ◄──────────────────► │  Operation  │
//! └──────┬──────┘   (diamond property) └──────┬──────┘
//!        │                                    │
//!        ▼                                    ▼
//!    apply()  ──────► new content ◄──────  apply()
//!        │                                    │
//!        ▼                                    ▼
//! adjust_cursor() ─► repositioned carets ◄─ adjust_cursor()
//! ```
//!
//! ## Modules
//!
//! - [`operation`] — immutable insert/delete/retain value type with
//!   originator, sequence, and base-version metadata
//! - [`transform`] — pairwise transform for every kind pairing, with the
//!   deterministic `(originator, sequence)` tie-break
//! - [`apply`] — character-offset content splicing and operation inversion
//! - [`cursor`] — caret/selection repositioning driven by the operation
//!   stream
//! - [`error`] — the recoverable error taxonomy
//!
//! The transform guarantees convergence: for operations `a`, `b` generated
//! against the same content, applying `a` then `b'` equals applying `b`
//! then `a'`. Ingestion order may differ across replicas; the transform is
//! what makes the final content identical, not a global sequencer.

pub mod apply;
pub mod cursor;
pub mod error;
pub mod operation;
pub mod transform;

// Re-exports for convenience
pub use apply::{apply, char_len, invert};
pub use cursor::{adjust_cursor, CursorColor, CursorPosition, Selection};
pub use error::OtError;
pub use operation::{OpKind, Operation, ParticipantId};
pub use transform::transform;
