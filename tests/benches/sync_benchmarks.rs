//! # PoP Sync Benchmarks
//!
//! | Path | What is measured |
//! |------|------------------|
//! | Envelope | sign, verify, content id |
//! | Dispatcher | roll calls committed per second on a LAO without witnesses |
//! | Witnessing | one update consolidated after k witness signatures |
//! | Replay | deferred signatures resolved by a late update |

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use pop_crypto::{hash_parts, sign_message, Ed25519Provider, KeyPair};
use pop_sync::domain::ids;
use pop_sync::{Dispatcher, MessageSender, SyncConfig, SyncContext, SyncResult};
use pop_types::data::{CreateLao, CreateRollCall, UpdateLao, WitnessMessageSignature};
use pop_types::envelope::witness_payload;
use pop_types::{Channel, Data, MessageId, SignedMessage};
use std::sync::Arc;
use std::time::Duration;

/// Side effects go nowhere; handlers run outside a runtime here anyway.
struct NullSender;

#[async_trait]
impl MessageSender for NullSender {
    async fn subscribe(&self, _channel: &Channel) -> SyncResult<()> {
        Ok(())
    }

    async fn publish(&self, _channel: &Channel, _data: &Data) -> SyncResult<MessageId> {
        Ok(MessageId::new("unpublished"))
    }
}

struct Fixture {
    organizer: KeyPair,
    witnesses: Vec<KeyPair>,
    create: SignedMessage,
    lao_id: String,
}

impl Fixture {
    fn new(witness_count: u8) -> Self {
        let organizer = KeyPair::from_seed([1; 32]);
        let witnesses: Vec<_> = (0..witness_count)
            .map(|i| KeyPair::from_seed([10 + i; 32]))
            .collect();
        let lao_id = ids::lao_id(&Ed25519Provider, &organizer.public_key(), 1000, "Bench");
        let create = sign_message(
            &organizer,
            &Data::CreateLao(CreateLao {
                id: lao_id.clone(),
                name: "Bench".into(),
                creation: 1000,
                organizer: organizer.public_key(),
                witnesses: witnesses.iter().map(KeyPair::public_key).collect(),
            }),
        )
        .expect("sign create");
        Self {
            organizer,
            witnesses,
            create,
            lao_id,
        }
    }

    fn channel(&self) -> Channel {
        Channel::lao(&self.lao_id)
    }

    /// A dispatcher that already knows the LAO.
    fn dispatcher(&self) -> Dispatcher {
        let cx = SyncContext::new(
            SyncConfig::default(),
            self.organizer.public_key(),
            Arc::new(Ed25519Provider),
            Arc::new(NullSender),
        );
        let mut dispatcher = Dispatcher::new(cx);
        assert!(dispatcher.process(&Channel::root(), self.create.clone()).is_processed());
        dispatcher
    }

    fn roll_calls(&self, count: usize) -> Vec<SignedMessage> {
        (0..count)
            .map(|i| {
                let name = format!("rc-{i}");
                let creation = 1100 + i as i64;
                let data = Data::CreateRollCall(CreateRollCall {
                    id: ids::create_roll_call_id(&Ed25519Provider, &self.lao_id, creation, &name),
                    name,
                    creation,
                    proposed_start: creation + 100,
                    proposed_end: creation + 200,
                    location: "Hall".into(),
                    description: None,
                });
                sign_message(&self.organizer, &data).expect("sign roll call")
            })
            .collect()
    }

    fn update(&self) -> SignedMessage {
        let data = Data::UpdateLao(UpdateLao {
            id: self.lao_id.clone(),
            name: "Renamed".into(),
            last_modified: 2000,
            witnesses: self.witnesses.iter().map(KeyPair::public_key).collect(),
        });
        sign_message(&self.organizer, &data).expect("sign update")
    }

    fn signatures(&self, message_id: &MessageId) -> Vec<SignedMessage> {
        self.witnesses
            .iter()
            .map(|w| {
                let data = Data::WitnessMessageSignature(WitnessMessageSignature {
                    message_id: message_id.clone(),
                    signature: w.sign(&witness_payload(message_id)),
                });
                sign_message(w, &data).expect("sign witness signature")
            })
            .collect()
    }
}

fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope");
    let fixture = Fixture::new(0);
    let data = fixture.create.decode_data().expect("decode");

    group.bench_function("sign", |b| {
        b.iter(|| black_box(sign_message(&fixture.organizer, &data).is_ok()))
    });
    group.bench_function("verify", |b| {
        b.iter(|| black_box(fixture.create.verify(&Ed25519Provider).is_ok()))
    });
    group.bench_function("content_id", |b| {
        b.iter(|| {
            black_box(hash_parts(&[
                fixture.create.data.as_str(),
                fixture.create.signature.as_str(),
            ]))
        })
    });
    group.finish();
}

fn bench_dispatcher(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatcher");
    group.measurement_time(Duration::from_secs(10));
    let fixture = Fixture::new(0);
    let channel = fixture.channel();

    for count in [10usize, 100, 1000] {
        let messages = fixture.roll_calls(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("roll_calls", count), &messages, |b, messages| {
            b.iter_batched(
                || (fixture.dispatcher(), messages.clone()),
                |(mut dispatcher, messages)| {
                    for message in messages {
                        black_box(dispatcher.process(&channel, message));
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_witnessing(c: &mut Criterion) {
    let mut group = c.benchmark_group("witnessing");

    for witness_count in [1u8, 8, 32] {
        let fixture = Fixture::new(witness_count);
        let channel = fixture.channel();
        let update = fixture.update();
        let signatures = fixture.signatures(&update.message_id);

        group.bench_function(BenchmarkId::new("consolidate", witness_count), |b| {
            b.iter_batched(
                || fixture.dispatcher(),
                |mut dispatcher| {
                    dispatcher.process(&channel, update.clone());
                    for signature in &signatures {
                        dispatcher.process(&channel, signature.clone());
                    }
                    black_box(dispatcher)
                },
                BatchSize::SmallInput,
            )
        });

        // signatures first: every one is parked until the update arrives
        group.bench_function(BenchmarkId::new("replay", witness_count), |b| {
            b.iter_batched(
                || fixture.dispatcher(),
                |mut dispatcher| {
                    for signature in &signatures {
                        dispatcher.process(&channel, signature.clone());
                    }
                    dispatcher.process(&channel, update.clone());
                    black_box(dispatcher.replay_deferred())
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_envelope, bench_dispatcher, bench_witnessing);
criterion_main!(benches);
