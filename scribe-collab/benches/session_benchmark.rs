use criterion::{black_box, criterion_group, criterion_main, Criterion};
use scribe_collab::{DocumentId, DocumentSession, EditDelta, OperationMessage};
use scribe_ot::{Operation, ParticipantId};

fn open_session() -> DocumentSession {
    let mut session = DocumentSession::new(DocumentId::from("bench-doc"), ParticipantId::from("local"));
    session.open_document("abcdefgh".repeat(64), 0).unwrap();
    session.drain_events();
    session
}

fn bench_message_encode(c: &mut Criterion) {
    let op = Operation::insert(100, "hello", ParticipantId::from("u1"), 1, 0).unwrap();
    let msg = OperationMessage::from_operation(&op, &DocumentId::from("bench-doc"));

    c.bench_function("message_encode", |b| {
        b.iter(|| black_box(msg.encode().unwrap()))
    });
}

fn bench_message_decode(c: &mut Criterion) {
    let op = Operation::insert(100, "hello", ParticipantId::from("u1"), 1, 0).unwrap();
    let msg = OperationMessage::from_operation(&op, &DocumentId::from("bench-doc"));
    let encoded = msg.encode().unwrap();

    c.bench_function("message_decode", |b| {
        b.iter(|| black_box(OperationMessage::decode(black_box(&encoded)).unwrap()))
    });
}

fn bench_submit_local_edit(c: &mut Criterion) {
    c.bench_function("submit_local_edit", |b| {
        b.iter_batched(
            open_session,
            |mut session| {
                session
                    .submit_local_edit(&EditDelta::insertion(10, "x"))
                    .unwrap();
                black_box(session)
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_ingest_through_pending_queue(c: &mut Criterion) {
    // Remote operation reconciled against 16 locally pending edits.
    let setup = || {
        let mut session = open_session();
        for i in 0..16 {
            session
                .submit_local_edit(&EditDelta::insertion(i, "q"))
                .unwrap();
        }
        session.drain_events();
        let remote = Operation::insert(0, "r", ParticipantId::from("remote"), 1, 0).unwrap();
        let msg = OperationMessage::from_operation(&remote, &DocumentId::from("bench-doc"));
        (session, msg)
    };

    c.bench_function("ingest_through_16_pending", |b| {
        b.iter_batched(
            setup,
            |(mut session, msg)| {
                session.ingest_remote_operation(&msg).unwrap();
                black_box(session)
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_message_encode,
    bench_message_decode,
    bench_submit_local_edit,
    bench_ingest_through_pending_queue,
);
criterion_main!(benches);
