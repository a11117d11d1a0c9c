//! # Delivery Semantics
//!
//! Duplicates, out-of-order arrival and forged envelopes, as seen by a node
//! receiving messages the network already carried.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{create_lao, LaoSetup, TestNetwork};
    use pop_bus::InMemoryTransport;
    use pop_crypto::KeyPair;
    use pop_sync::{ProcessOutcome, SyncApi, SyncConfig, SyncError, SyncService};
    use pop_types::data::{CreateRollCall, UpdateLao, WitnessMessageSignature};
    use pop_types::{Channel, Data, SignedMessage};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    /// Organizer, one witness, and a rename to "X" that has been witnessed
    /// and consolidated.
    async fn consolidated_rename() -> LaoSetup {
        let mut setup = LaoSetup::new(1).await;
        let update = Data::UpdateLao(UpdateLao {
            id: setup.lao_id.clone(),
            name: "X".into(),
            last_modified: 2000,
            witnesses: vec![setup.witnesses[0].public_key()],
        });
        let update_id = setup.organizer.publish(&setup.lao_channel(), update).await;
        setup.settle().await;
        setup.witnesses[0]
            .service
            .witness_message(&setup.lao_id, &update_id)
            .await
            .expect("witness");
        setup.settle().await;
        assert_eq!(setup.organizer.lao(&setup.lao_id).name, "X");
        setup
    }

    fn find(history: &[SignedMessage], pred: impl Fn(&Data) -> bool) -> SignedMessage {
        history
            .iter()
            .find(|m| m.decode_data().map(|d| pred(&d)).unwrap_or(false))
            .cloned()
            .expect("message in history")
    }

    #[tokio::test]
    async fn test_redelivery_leaves_state_untouched() {
        let mut setup = consolidated_rename().await;
        let history = setup.network.history(&setup.lao_channel()).await;
        let node = &setup.witnesses[0];
        let before = node.lao(&setup.lao_id);

        for message in &history {
            let outcome = node
                .service
                .on_broadcast(&setup.lao_channel(), message.clone())
                .await;
            assert!(outcome.is_processed());
        }
        let outcomes = node
            .service
            .catchup(&setup.lao_channel())
            .await
            .expect("catchup");
        assert!(outcomes.iter().all(ProcessOutcome::is_processed));
        setup.settle().await;

        let after = setup.witnesses[0].lao(&setup.lao_id);
        assert!(Arc::ptr_eq(&before, &after));
    }

    /// A node that sees the StateLao before the update it consolidates
    /// parks it and applies it once the update shows up.
    #[tokio::test]
    async fn test_state_waits_for_its_update() {
        let setup = consolidated_rename().await;
        let root_history = setup.network.history(&Channel::root()).await;
        let lao_history = setup.network.history(&setup.lao_channel()).await;
        let create = find(&root_history, |d| matches!(d, Data::CreateLao(_)));
        let update = find(&lao_history, |d| matches!(d, Data::UpdateLao(_)));
        let state = find(&lao_history, |d| matches!(d, Data::StateLao(_)));

        // a separate network, so nothing else reaches this node
        let late = TestNetwork::new().node("late", 50).await;
        let channel = setup.lao_channel();
        assert!(late.service.on_broadcast(&Channel::root(), create).await.is_processed());

        let outcome = late.service.on_broadcast(&channel, state).await;
        assert!(
            matches!(outcome, ProcessOutcome::Deferred(SyncError::InvalidMessageId(_))),
            "got {outcome:?}"
        );
        assert_eq!(late.service.deferred_len().await, 1);
        assert_eq!(late.lao(&setup.lao_id).name, "Club");

        assert!(late.service.on_broadcast(&channel, update).await.is_processed());
        assert_eq!(late.service.deferred_len().await, 0);
        let lao = late.lao(&setup.lao_id);
        assert_eq!(lao.name, "X");
        assert!(lao.pending_updates.is_empty());
    }

    #[tokio::test]
    async fn test_tampered_envelope_rejected() {
        let setup = LaoSetup::new(1).await;
        let channel = setup.lao_channel();
        let roll_call = |name: &str| {
            Data::CreateRollCall(CreateRollCall {
                id: format!("rc-{name}"),
                name: name.into(),
                creation: 1100,
                proposed_start: 1200,
                proposed_end: 1300,
                location: "Hall".into(),
                description: None,
            })
        };

        let mut tampered = setup.organizer.sign(&roll_call("Real"));
        tampered.data = setup.organizer.sign(&roll_call("Forged")).data;

        let outcome = setup.witnesses[0].service.on_broadcast(&channel, tampered).await;
        assert!(
            matches!(outcome, ProcessOutcome::Rejected(SyncError::InvalidSignature(_))),
            "got {outcome:?}"
        );
        assert!(setup.witnesses[0].lao(&setup.lao_id).witness_messages.is_empty());
    }

    #[tokio::test]
    async fn test_bad_witness_signature_not_counted() {
        let mut setup = LaoSetup::new(1).await;
        let update = Data::UpdateLao(UpdateLao {
            id: setup.lao_id.clone(),
            name: "X".into(),
            last_modified: 2000,
            witnesses: vec![setup.witnesses[0].public_key()],
        });
        let update_id = setup.organizer.publish(&setup.lao_channel(), update).await;
        setup.settle().await;

        // well-formed envelope, but the inner signature covers other bytes
        let witness = &setup.witnesses[0];
        let forged = witness.sign(&Data::WitnessMessageSignature(WitnessMessageSignature {
            message_id: update_id.clone(),
            signature: witness.keys.sign(b"not the message id"),
        }));
        let outcome = setup
            .organizer
            .service
            .on_broadcast(&setup.lao_channel(), forged)
            .await;
        assert!(outcome.is_rejected(), "got {outcome:?}");

        let lao = setup.organizer.lao(&setup.lao_id);
        assert!(lao.witness_messages[&update_id].witnesses.is_empty());
        assert_eq!(lao.name, "Club");
    }

    #[tokio::test]
    async fn test_message_for_unknown_lao_rejected() {
        let setup = LaoSetup::new(0).await;
        let stray = setup.organizer.sign(&Data::CreateRollCall(CreateRollCall {
            id: "rc".into(),
            name: "Stray".into(),
            creation: 1100,
            proposed_start: 1200,
            proposed_end: 1300,
            location: "Nowhere".into(),
            description: None,
        }));

        let outcome = setup
            .organizer
            .service
            .on_broadcast(&Channel::lao("missing"), stray)
            .await;
        assert!(
            matches!(outcome, ProcessOutcome::Rejected(SyncError::UnknownLao(_))),
            "got {outcome:?}"
        );
        assert_eq!(setup.organizer.service.deferred_len().await, 0);
    }

    #[tokio::test]
    async fn test_run_loop_handles_deliveries() {
        let transport = Arc::new(InMemoryTransport::new());
        let deliveries = transport.deliveries();
        let keys = KeyPair::from_seed([3; 32]);
        let organizer = keys.public_key();
        let service = Arc::new(SyncService::new(SyncConfig::default(), keys, transport.clone()));
        service.subscribe(&Channel::root()).await.expect("join root");

        let runner = tokio::spawn(service.clone().run(deliveries));

        let create = create_lao(&organizer, "Live", &[]);
        service
            .publish(&Channel::root(), &Data::CreateLao(create.clone()))
            .await
            .expect("publish");

        timeout(Duration::from_secs(5), async {
            while service.get_lao_view(&create.id).is_err()
                || !transport.is_subscribed(&Channel::lao(&create.id))
            {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("LAO created by the run loop");

        assert_eq!(service.get_lao_view(&create.id).expect("lao").name, "Live");
        runner.abort();
    }
}
