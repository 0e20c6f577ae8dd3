//! Pairwise operational transformation.
//!
//! [`transform`] re-expresses two operations generated against the same
//! document version in terms of each other, so that either application
//! order converges on identical content:
//!
//! ```text
//!            S
//!          /   \
//!        a       b
//!        │       │
//!      S·a       S·b
//!        │       │
//!       b'       a'
//!        \       /
//!      identical content
//! ```
//!
//! Reference: Ellis & Gibbs 1989 — Concurrency Control in Groupware Systems

use crate::error::OtError;
use crate::operation::{OpKind, Operation};

/// Transform `a` and `b` against each other.
///
/// Returns `(a', b')` where `a'` is `a` re-expressed to apply *after* `b`,
/// and `b'` is `b` re-expressed to apply *after* `a`. Refuses with
/// [`OtError::VersionMismatch`] when the operations were not generated
/// against the same base version — the caller must resynchronize rather
/// than guess.
pub fn transform(a: &Operation, b: &Operation) -> Result<(Operation, Operation), OtError> {
    if a.base_version() != b.base_version() {
        return Err(OtError::VersionMismatch {
            expected: a.base_version(),
            actual: b.base_version(),
        });
    }

    let (ka, kb) = match (a.kind(), b.kind()) {
        // Retain pairs with anything as a pure pass-through.
        (OpKind::Retain { .. }, _) | (_, OpKind::Retain { .. }) => {
            (a.kind().clone(), b.kind().clone())
        }
        (
            OpKind::Insert {
                position: pa,
                text: ta,
            },
            OpKind::Insert {
                position: pb,
                text: tb,
            },
        ) => insert_insert(*pa, ta, *pb, tb, a.precedes(b)),
        (
            OpKind::Insert { position, text },
            OpKind::Delete {
                position: dp,
                length: dl,
            },
        ) => insert_delete(*position, text, *dp, *dl),
        (
            OpKind::Delete {
                position: dp,
                length: dl,
            },
            OpKind::Insert { position, text },
        ) => {
            let (ki, kd) = insert_delete(*position, text, *dp, *dl);
            (kd, ki)
        }
        (
            OpKind::Delete {
                position: pa,
                length: la,
            },
            OpKind::Delete {
                position: pb,
                length: lb,
            },
        ) => (
            delete_minus(*pa, *la, *pb, *lb),
            delete_minus(*pb, *lb, *pa, *la),
        ),
    };

    Ok((a.with_kind(ka), b.with_kind(kb)))
}

/// Concurrent inserts: the one at the lower position stays, the other
/// shifts right by the winner's inserted length. Equal positions fall back
/// to the `(originator, sequence)` tie-break, `a_first` carrying the
/// verdict.
fn insert_insert(pa: usize, ta: &str, pb: usize, tb: &str, a_first: bool) -> (OpKind, OpKind) {
    let la = ta.chars().count();
    let lb = tb.chars().count();
    if pa < pb || (pa == pb && a_first) {
        (
            OpKind::Insert {
                position: pa,
                text: ta.to_string(),
            },
            OpKind::Insert {
                position: pb + la,
                text: tb.to_string(),
            },
        )
    } else {
        (
            OpKind::Insert {
                position: pa + lb,
                text: ta.to_string(),
            },
            OpKind::Insert {
                position: pb,
                text: tb.to_string(),
            },
        )
    }
}

/// Insert vs. delete. Returns `(insert', delete')`.
///
/// An insert strictly inside the deleted range is swallowed: the delete
/// grows to cover the new text and the insert degenerates to a retain,
/// keeping both replicas on the deleting party's intent.
fn insert_delete(ip: usize, text: &str, dp: usize, dl: usize) -> (OpKind, OpKind) {
    let il = text.chars().count();
    let dend = dp + dl;
    if ip <= dp {
        (
            OpKind::Insert {
                position: ip,
                text: text.to_string(),
            },
            OpKind::Delete {
                position: dp + il,
                length: dl,
            },
        )
    } else if ip >= dend {
        (
            OpKind::Insert {
                position: ip - dl,
                text: text.to_string(),
            },
            OpKind::Delete {
                position: dp,
                length: dl,
            },
        )
    } else {
        (
            OpKind::Retain { length: 0 },
            OpKind::Delete {
                position: dp,
                length: dl + il,
            },
        )
    }
}

/// The surviving part of delete `[s, s+l)` once the other delete
/// `[os, os+ol)` has already run.
///
/// Concurrent deletes resolve as interval subtraction: each side removes
/// what the other has not, so the final content is the base minus the
/// union of both ranges. A fully subsumed delete degenerates to a retain.
fn delete_minus(s: usize, l: usize, os: usize, ol: usize) -> OpKind {
    let e = s + l;
    let oe = os + ol;
    let overlap = e.min(oe).saturating_sub(s.max(os));
    let length = l - overlap;
    if length == 0 {
        return OpKind::Retain { length: 0 };
    }
    let position = if oe <= s {
        s - ol
    } else if os < s {
        os
    } else {
        s
    };
    OpKind::Delete { position, length }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::apply;
    use crate::operation::ParticipantId;

    fn p(id: &str) -> ParticipantId {
        ParticipantId::from(id)
    }

    fn ins(pos: usize, text: &str, id: &str, seq: u64) -> Operation {
        Operation::insert(pos, text, p(id), seq, 0).unwrap()
    }

    fn del(pos: usize, len: usize, id: &str, seq: u64) -> Operation {
        Operation::delete(pos, len, p(id), seq, 0).unwrap()
    }

    /// Both application orders must land on identical content.
    fn assert_converges(base: &str, a: &Operation, b: &Operation) -> String {
        let (a2, b2) = transform(a, b).unwrap();
        let via_a = apply(&apply(base, a).unwrap(), &b2).unwrap();
        let via_b = apply(&apply(base, b).unwrap(), &a2).unwrap();
        assert_eq!(via_a, via_b, "divergence for {a:?} / {b:?} on {base:?}");
        via_a
    }

    #[test]
    fn test_version_mismatch_refused() {
        let a = Operation::insert(0, "x", p("u1"), 1, 3).unwrap();
        let b = Operation::insert(0, "y", p("u2"), 1, 4).unwrap();
        let err = transform(&a, &b).unwrap_err();
        assert_eq!(
            err,
            OtError::VersionMismatch {
                expected: 3,
                actual: 4
            }
        );
    }

    #[test]
    fn test_insert_insert_disjoint() {
        let a = ins(1, "X", "u1", 1);
        let b = ins(4, "YY", "u2", 1);
        let (a2, b2) = transform(&a, &b).unwrap();
        // Lower position untouched, higher shifted right by one char.
        assert_eq!(a2.kind(), a.kind());
        assert_eq!(
            b2.kind(),
            &OpKind::Insert {
                position: 5,
                text: "YY".into()
            }
        );
        assert_eq!(assert_converges("abcdef", &a, &b), "aXbcdYYef");
    }

    #[test]
    fn test_insert_insert_equal_position_tiebreak() {
        let a = ins(2, "A", "u1", 1);
        let b = ins(2, "B", "u2", 1);
        // "u1" < "u2": a stays first, b shifts past it.
        let (a2, b2) = transform(&a, &b).unwrap();
        assert_eq!(a2.kind(), a.kind());
        assert_eq!(
            b2.kind(),
            &OpKind::Insert {
                position: 3,
                text: "B".into()
            }
        );
        assert_eq!(assert_converges("wxyz", &a, &b), "wxAByz");
    }

    #[test]
    fn test_insert_insert_equal_position_sequence_tiebreak() {
        // Same originator ordering falls through to the sequence counter.
        let a = Operation::insert(0, "1", p("u1"), 1, 0).unwrap();
        let b = Operation::insert(0, "2", p("u1"), 2, 0).unwrap();
        assert_eq!(assert_converges("", &a, &b), "12");
    }

    #[test]
    fn test_insert_before_delete_shifts_delete() {
        let a = ins(1, "X", "u1", 1);
        let b = del(1, 2, "u2", 1);
        let (a2, b2) = transform(&a, &b).unwrap();
        assert_eq!(a2.kind(), a.kind());
        assert_eq!(
            b2.kind(),
            &OpKind::Delete {
                position: 2,
                length: 2
            }
        );
        assert_eq!(assert_converges("abcde", &a, &b), "aXde");
    }

    #[test]
    fn test_insert_after_delete_shifts_insert() {
        let a = ins(3, "X", "u1", 1);
        let b = del(1, 2, "u2", 1);
        let (a2, b2) = transform(&a, &b).unwrap();
        assert_eq!(
            a2.kind(),
            &OpKind::Insert {
                position: 1,
                text: "X".into()
            }
        );
        assert_eq!(b2.kind(), b.kind());
        assert_eq!(assert_converges("abcde", &a, &b), "aXde");
    }

    #[test]
    fn test_insert_inside_delete_is_swallowed() {
        let a = ins(2, "X", "u1", 1);
        let b = del(1, 3, "u2", 1);
        let (a2, b2) = transform(&a, &b).unwrap();
        assert!(a2.is_noop());
        assert_eq!(
            b2.kind(),
            &OpKind::Delete {
                position: 1,
                length: 4
            }
        );
        assert_eq!(assert_converges("abcde", &a, &b), "ae");
    }

    #[test]
    fn test_concurrent_insert_and_delete_at_origin() {
        // insert(1, "X") vs delete(0, 1) over "ab" lands on "Xb".
        let a = ins(1, "X", "u1", 1);
        let b = del(0, 1, "u2", 1);
        assert_eq!(assert_converges("ab", &a, &b), "Xb");
    }

    #[test]
    fn test_delete_delete_disjoint() {
        let a = del(1, 2, "u1", 1);
        let b = del(5, 2, "u2", 1);
        let (a2, b2) = transform(&a, &b).unwrap();
        assert_eq!(a2.kind(), a.kind());
        assert_eq!(
            b2.kind(),
            &OpKind::Delete {
                position: 3,
                length: 2
            }
        );
        assert_eq!(assert_converges("abcdefgh", &a, &b), "adeh");
    }

    #[test]
    fn test_delete_delete_adjacent_merges_spans() {
        // [1,3) and [3,5) — the union [1,5) disappears.
        let a = del(1, 2, "u1", 1);
        let b = del(3, 2, "u2", 1);
        assert_eq!(assert_converges("abcdef", &a, &b), "af");
    }

    #[test]
    fn test_delete_delete_partial_overlap() {
        let a = del(1, 3, "u1", 1);
        let b = del(2, 3, "u2", 1);
        let (a2, b2) = transform(&a, &b).unwrap();
        assert_eq!(
            a2.kind(),
            &OpKind::Delete {
                position: 1,
                length: 1
            }
        );
        assert_eq!(
            b2.kind(),
            &OpKind::Delete {
                position: 1,
                length: 1
            }
        );
        assert_eq!(assert_converges("abcdef", &a, &b), "af");
    }

    #[test]
    fn test_delete_delete_overlapping_prefixes() {
        // delete "Hel" and delete "llo" over "HelloWorld" → "World".
        let a = del(0, 3, "u1", 1);
        let b = del(2, 3, "u2", 1);
        assert_eq!(assert_converges("HelloWorld", &a, &b), "World");
    }

    #[test]
    fn test_delete_delete_subsumed_becomes_retain() {
        let a = del(1, 4, "u1", 1);
        let b = del(2, 1, "u2", 1);
        let (a2, b2) = transform(&a, &b).unwrap();
        assert_eq!(
            a2.kind(),
            &OpKind::Delete {
                position: 1,
                length: 3
            }
        );
        assert!(b2.is_noop());
        assert_eq!(assert_converges("abcdef", &a, &b), "af");
    }

    #[test]
    fn test_delete_delete_identical_ranges() {
        let a = del(2, 3, "u1", 1);
        let b = del(2, 3, "u2", 1);
        let (a2, b2) = transform(&a, &b).unwrap();
        assert!(a2.is_noop());
        assert!(b2.is_noop());
        assert_eq!(assert_converges("abcdef", &a, &b), "abf");
    }

    #[test]
    fn test_retain_passes_through() {
        let a = Operation::retain(3, p("u1"), 1, 0);
        let b = ins(0, "X", "u2", 1);
        let (a2, b2) = transform(&a, &b).unwrap();
        assert_eq!(a2, a);
        assert_eq!(b2, b);
    }

    #[test]
    fn test_transform_preserves_identity_fields() {
        let a = ins(4, "X", "u1", 9);
        let b = del(0, 2, "u2", 3);
        let (a2, b2) = transform(&a, &b).unwrap();
        assert_eq!(a2.originator().as_str(), "u1");
        assert_eq!(a2.sequence(), 9);
        assert_eq!(b2.originator().as_str(), "u2");
        assert_eq!(b2.sequence(), 3);
    }

    #[test]
    fn test_multibyte_text_shifts_by_chars() {
        let a = ins(0, "héé", "u1", 1);
        let b = ins(1, "X", "u2", 1);
        let (_, b2) = transform(&a, &b).unwrap();
        // Three characters inserted, not five bytes.
        assert_eq!(
            b2.kind(),
            &OpKind::Insert {
                position: 4,
                text: "X".into()
            }
        );
        assert_eq!(assert_converges("ab", &a, &b), "hééaXb");
    }
}
