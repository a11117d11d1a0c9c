//! # Consensus Across Nodes
//!
//! Elect / Elect-Accept / Learn on `/root/<lao>/consensus`, observed through
//! every participant's derived node state.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::LaoSetup;
    use pop_crypto::Ed25519Provider;
    use pop_sync::domain::ids;
    use pop_sync::{InstanceState, NodeState, SyncApi};
    use pop_types::channel::CONSENSUS;
    use pop_types::data::{
        ConsensusElect, ConsensusElectAccept, ConsensusFailure, ConsensusKey, ConsensusLearn,
        LearnValue,
    };
    use pop_types::{Channel, Data, MessageId};

    fn election_state_key() -> ConsensusKey {
        ConsensusKey {
            kind: "election".into(),
            id: "E1".into(),
            property: "state".into(),
        }
    }

    fn consensus_channel(setup: &LaoSetup) -> Channel {
        setup.lao_channel().sub_channel(CONSENSUS)
    }

    async fn elect(setup: &mut LaoSetup, created_at: i64) -> MessageId {
        let channel = consensus_channel(setup);
        let id = setup
            .organizer
            .publish(
                &channel,
                Data::ConsensusElect(ConsensusElect {
                    created_at,
                    key: election_state_key(),
                    value: "started".into(),
                }),
            )
            .await;
        setup.settle().await;
        id
    }

    fn learn(instance_id: &str, elect_id: &MessageId) -> Data {
        Data::ConsensusLearn(ConsensusLearn {
            instance_id: instance_id.into(),
            message_id: elect_id.clone(),
            created_at: 1700,
            value: LearnValue { decision: true },
            acceptor_signatures: vec![],
        })
    }

    fn assert_all_nodes(setup: &LaoSetup, instance_id: &str, expected: NodeState) {
        for observer in setup.nodes() {
            for subject in setup.nodes() {
                let state = observer
                    .service
                    .node_state(&setup.lao_id, &subject.public_key(), instance_id)
                    .expect("node state");
                assert_eq!(
                    state, expected,
                    "{} sees {} in {state}",
                    observer.name, subject.name
                );
            }
        }
    }

    /// Elect from O puts W1 in STARTING; W1 accepts; a Learn accepts the
    /// instance for every node.
    #[tokio::test]
    async fn test_elect_accept_learn() {
        let mut setup = LaoSetup::new(2).await;
        let instance_id = ids::instance_id(&Ed25519Provider, &election_state_key());
        assert_all_nodes(&setup, &instance_id, NodeState::Waiting);

        let elect_id = elect(&mut setup, 1500).await;
        assert_all_nodes(&setup, &instance_id, NodeState::Starting);

        let channel = consensus_channel(&setup);
        let accept_id = setup.witnesses[0]
            .publish(
                &channel,
                Data::ConsensusElectAccept(ConsensusElectAccept {
                    instance_id: instance_id.clone(),
                    message_id: elect_id.clone(),
                    accept: true,
                }),
            )
            .await;
        setup.settle().await;

        let lao = setup.organizer.lao(&setup.lao_id);
        let instance = &lao.elect_instances[&elect_id];
        assert_eq!(
            instance.acceptor_responses.get(&setup.witnesses[0].public_key()),
            Some(&accept_id)
        );

        setup
            .organizer
            .publish(&channel, learn(&instance_id, &elect_id))
            .await;
        setup.settle().await;
        assert_all_nodes(&setup, &instance_id, NodeState::Accepted);
    }

    /// Once accepted, failures and late accepts leave the instance alone.
    #[tokio::test]
    async fn test_terminal_state_is_final() {
        let mut setup = LaoSetup::new(1).await;
        let instance_id = ids::instance_id(&Ed25519Provider, &election_state_key());
        let elect_id = elect(&mut setup, 1500).await;
        let channel = consensus_channel(&setup);

        setup
            .organizer
            .publish(&channel, learn(&instance_id, &elect_id))
            .await;
        setup.settle().await;

        setup
            .organizer
            .publish(
                &channel,
                Data::ConsensusFailure(ConsensusFailure {
                    instance_id: instance_id.clone(),
                    message_id: elect_id.clone(),
                    created_at: 1800,
                }),
            )
            .await;
        setup.witnesses[0]
            .publish(
                &channel,
                Data::ConsensusElectAccept(ConsensusElectAccept {
                    instance_id: instance_id.clone(),
                    message_id: elect_id.clone(),
                    accept: false,
                }),
            )
            .await;
        setup.settle().await;

        for node in setup.nodes() {
            let lao = node.lao(&setup.lao_id);
            assert_eq!(lao.elect_instances[&elect_id].state, InstanceState::Accepted);
        }
        assert_all_nodes(&setup, &instance_id, NodeState::Accepted);
    }

    /// A newer Elect for the same instance id takes over every node.
    #[tokio::test]
    async fn test_latest_elect_wins() {
        let mut setup = LaoSetup::new(1).await;
        let instance_id = ids::instance_id(&Ed25519Provider, &election_state_key());
        let first = elect(&mut setup, 1500).await;
        let channel = consensus_channel(&setup);

        setup
            .organizer
            .publish(&channel, learn(&instance_id, &first))
            .await;
        setup.settle().await;
        assert_all_nodes(&setup, &instance_id, NodeState::Accepted);

        let second = elect(&mut setup, 1600).await;
        assert_ne!(first, second);
        assert_all_nodes(&setup, &instance_id, NodeState::Starting);
        assert_eq!(
            setup.organizer.lao(&setup.lao_id).elect_instances[&first].state,
            InstanceState::Accepted
        );
    }

    #[tokio::test]
    async fn test_failure_marks_instance_failed() {
        let mut setup = LaoSetup::new(1).await;
        let instance_id = ids::instance_id(&Ed25519Provider, &election_state_key());
        let elect_id = elect(&mut setup, 1500).await;

        setup
            .witnesses[0]
            .publish(
                &consensus_channel(&setup),
                Data::ConsensusFailure(ConsensusFailure {
                    instance_id: instance_id.clone(),
                    message_id: elect_id,
                    created_at: 1800,
                }),
            )
            .await;
        setup.settle().await;
        assert_all_nodes(&setup, &instance_id, NodeState::Failed);
    }
}
