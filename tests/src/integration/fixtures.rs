//! Test network and nodes.

use pop_bus::{InMemoryTransport, Subscription};
use pop_crypto::{sign_message, Ed25519Provider, KeyPair};
use pop_sync::domain::ids;
use pop_sync::{Lao, SyncApi, SyncConfig, SyncService};
use pop_telemetry::{init_logging, TelemetryConfig};
use pop_types::data::CreateLao;
use pop_types::{Channel, Data, MessageId, PublicKey, SignedMessage};
use std::sync::{Arc, Once};

static LOGGING: Once = Once::new();

/// Install a subscriber when `POP_LOG_LEVEL` is set.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        if std::env::var("POP_LOG_LEVEL").is_ok() {
            let _ = init_logging(&TelemetryConfig::for_node("tests"));
        }
    });
}

/// One in-memory network.
pub struct TestNetwork {
    transport: InMemoryTransport,
}

impl TestNetwork {
    pub fn new() -> Self {
        init_test_logging();
        Self {
            transport: InMemoryTransport::new(),
        }
    }

    /// A node with a deterministic key, joined to `/root`.
    pub async fn node(&self, name: &'static str, seed: u8) -> TestNode {
        let endpoint = self.transport.peer();
        let deliveries = endpoint.deliveries();
        let service = Arc::new(SyncService::new(
            SyncConfig::default(),
            KeyPair::from_seed([seed; 32]),
            Arc::new(endpoint.clone()),
        ));
        service
            .subscribe(&Channel::root())
            .await
            .expect("join root");

        TestNode {
            name,
            keys: KeyPair::from_seed([seed; 32]),
            service,
            endpoint,
            deliveries,
        }
    }

    /// Every envelope ever published on `channel`.
    pub async fn history(&self, channel: &Channel) -> Vec<SignedMessage> {
        use pop_bus::Transport;
        self.transport.catchup(channel).await.expect("catchup")
    }
}

impl Default for TestNetwork {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TestNode {
    pub name: &'static str,
    pub keys: KeyPair,
    pub service: Arc<SyncService<InMemoryTransport>>,
    pub endpoint: InMemoryTransport,
    deliveries: Subscription,
}

impl TestNode {
    pub fn public_key(&self) -> PublicKey {
        self.keys.public_key()
    }

    pub async fn publish(&self, channel: &Channel, data: Data) -> MessageId {
        self.service.publish(channel, &data).await.expect("publish")
    }

    /// Handle everything delivered so far.
    pub async fn settle(&mut self) -> usize {
        self.service.settle(&mut self.deliveries).await
    }

    pub fn lao(&self, lao_id: &str) -> Arc<Lao> {
        self.service
            .get_lao_view(lao_id)
            .unwrap_or_else(|e| panic!("{} has no LAO {lao_id}: {e}", self.name))
    }

    /// Sign `data` without broadcasting it.
    pub fn sign(&self, data: &Data) -> SignedMessage {
        sign_message(&self.keys, data).expect("sign")
    }
}

/// Settle nodes until none of them has anything left to handle.
pub async fn settle_all(nodes: &mut [&mut TestNode]) {
    loop {
        let mut handled = 0;
        for node in nodes.iter_mut() {
            handled += node.settle().await;
        }
        if handled == 0 {
            return;
        }
    }
}

/// `lao/create` payload with a valid id.
pub fn create_lao(organizer: &PublicKey, name: &str, witnesses: &[PublicKey]) -> CreateLao {
    CreateLao {
        id: ids::lao_id(&Ed25519Provider, organizer, 1000, name),
        name: name.into(),
        creation: 1000,
        organizer: organizer.clone(),
        witnesses: witnesses.to_vec(),
    }
}

/// Organizer plus `witness_count` witnesses, all joined to one LAO.
pub struct LaoSetup {
    pub network: TestNetwork,
    pub organizer: TestNode,
    pub witnesses: Vec<TestNode>,
    pub lao_id: String,
}

impl LaoSetup {
    pub async fn new(witness_count: u8) -> Self {
        let network = TestNetwork::new();
        let mut organizer = network.node("organizer", 1).await;
        let mut witnesses = Vec::new();
        for i in 0..witness_count {
            witnesses.push(network.node("witness", 10 + i).await);
        }

        let witness_keys: Vec<_> = witnesses.iter().map(TestNode::public_key).collect();
        let create = create_lao(&organizer.public_key(), "Club", &witness_keys);
        organizer
            .publish(&Channel::root(), Data::CreateLao(create.clone()))
            .await;

        let mut setup = Self {
            network,
            organizer,
            witnesses,
            lao_id: create.id,
        };
        setup.settle().await;
        setup
    }

    pub fn lao_channel(&self) -> Channel {
        Channel::lao(&self.lao_id)
    }

    pub async fn settle(&mut self) {
        let mut nodes: Vec<&mut TestNode> = std::iter::once(&mut self.organizer)
            .chain(self.witnesses.iter_mut())
            .collect();
        settle_all(&mut nodes).await;
    }

    /// Every node, organizer first.
    pub fn nodes(&self) -> impl Iterator<Item = &TestNode> {
        std::iter::once(&self.organizer).chain(self.witnesses.iter())
    }
}
