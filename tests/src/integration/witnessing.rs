//! # Witnessed Changes Across Nodes
//!
//! Updates, roll calls and elections sent by the organizer only take effect
//! once every witness has co-signed them, on every node.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::LaoSetup;
    use pop_crypto::Ed25519Provider;
    use pop_sync::domain::ids;
    use pop_sync::{RollCallState, SyncApi};
    use pop_types::data::{CreateRollCall, OpenRollCall, UpdateLao};
    use pop_types::{Data, MessageId};

    fn rename(setup: &LaoSetup, name: &str, at: i64) -> Data {
        Data::UpdateLao(UpdateLao {
            id: setup.lao_id.clone(),
            name: name.into(),
            last_modified: at,
            witnesses: setup.witnesses.iter().map(|w| w.public_key()).collect(),
        })
    }

    async fn witness(setup: &LaoSetup, index: usize, message_id: &MessageId) {
        setup.witnesses[index]
            .service
            .witness_message(&setup.lao_id, message_id)
            .await
            .expect("witness");
    }

    /// Organizer O, witnesses W1 and W2. An update is pending until both
    /// have signed, then applied everywhere.
    #[tokio::test]
    async fn test_update_applied_after_both_witnesses_sign() {
        let mut setup = LaoSetup::new(2).await;

        let update_id = setup
            .organizer
            .publish(&setup.lao_channel(), rename(&setup, "X", 2000))
            .await;
        setup.settle().await;

        for node in setup.nodes() {
            let lao = node.lao(&setup.lao_id);
            assert_eq!(lao.name, "Club", "{} applied too early", node.name);
            assert_eq!(lao.pending_updates.len(), 1);
            assert!(lao.witness_messages.contains_key(&update_id));
        }

        witness(&setup, 0, &update_id).await;
        setup.settle().await;
        assert_eq!(setup.organizer.lao(&setup.lao_id).name, "Club");

        witness(&setup, 1, &update_id).await;
        setup.settle().await;

        for node in setup.nodes() {
            let lao = node.lao(&setup.lao_id);
            assert_eq!(lao.name, "X", "{} did not consolidate", node.name);
            assert!(lao.pending_updates.is_empty());
            assert_eq!(lao.modification_id.as_ref(), Some(&update_id));
        }
    }

    /// Three witnesses sign out of order with a duplicate: the organizer
    /// consolidates exactly once.
    #[tokio::test]
    async fn test_threshold_fires_once_in_any_order() {
        let mut setup = LaoSetup::new(3).await;

        let update_id = setup
            .organizer
            .publish(&setup.lao_channel(), rename(&setup, "Renamed", 2000))
            .await;
        setup.settle().await;

        for index in [2, 0, 0] {
            witness(&setup, index, &update_id).await;
            setup.settle().await;
            assert_eq!(setup.organizer.lao(&setup.lao_id).name, "Club");
        }
        witness(&setup, 1, &update_id).await;
        setup.settle().await;
        // late duplicate
        witness(&setup, 2, &update_id).await;
        setup.settle().await;

        let states = setup
            .network
            .history(&setup.lao_channel())
            .await
            .into_iter()
            .filter(|m| matches!(m.decode_data(), Ok(Data::StateLao(_))))
            .count();
        assert_eq!(states, 1);
        assert_eq!(setup.witnesses[0].lao(&setup.lao_id).name, "Renamed");
    }

    #[tokio::test]
    async fn test_roll_call_committed_after_witness() {
        let mut setup = LaoSetup::new(1).await;
        let create = CreateRollCall {
            id: ids::create_roll_call_id(&Ed25519Provider, &setup.lao_id, 1100, "Morning"),
            name: "Morning".into(),
            creation: 1100,
            proposed_start: 1200,
            proposed_end: 1300,
            location: "Hall".into(),
            description: Some("Weekly".into()),
        };
        let create_id = setup
            .organizer
            .publish(&setup.lao_channel(), Data::CreateRollCall(create.clone()))
            .await;
        setup.settle().await;
        assert!(setup.witnesses[0].lao(&setup.lao_id).roll_calls.is_empty());

        witness(&setup, 0, &create_id).await;
        setup.settle().await;

        for node in setup.nodes() {
            let roll_call = node
                .service
                .get_roll_call_with_id(&setup.lao_id, &create.id)
                .expect("roll call");
            assert_eq!(roll_call.state, RollCallState::Created);
        }

        // open is witnessed too, and re-identifies the roll call
        let open = OpenRollCall {
            update_id: ids::update_roll_call_id(&Ed25519Provider, &setup.lao_id, &create.id, 1200),
            opens: create.id.clone(),
            opened_at: 1200,
        };
        let open_id = setup
            .organizer
            .publish(&setup.lao_channel(), Data::OpenRollCall(open.clone()))
            .await;
        setup.settle().await;
        witness(&setup, 0, &open_id).await;
        setup.settle().await;

        let lao = setup.organizer.lao(&setup.lao_id);
        assert!(lao.roll_call(&create.id).is_none());
        let opened = lao.roll_call(&open.update_id).expect("opened roll call");
        assert_eq!(opened.state, RollCallState::Opened);
        assert_eq!(opened.persistent_id, create.id);
    }

    #[tokio::test]
    async fn test_witness_signature_before_request_is_replayed() {
        let mut setup = LaoSetup::new(1).await;

        // the witness signs an update it has not seen yet
        let update = rename(&setup, "Early", 2000);
        let signed = setup.organizer.sign(&update);
        witness(&setup, 0, &signed.message_id).await;
        setup.settle().await;
        assert!(setup.organizer.service.deferred_len().await >= 1);

        setup
            .organizer
            .service
            .on_broadcast(&setup.lao_channel(), signed.clone())
            .await;
        setup.settle().await;

        assert_eq!(setup.organizer.lao(&setup.lao_id).name, "Early");
        assert_eq!(setup.organizer.service.deferred_len().await, 0);
    }
}
