//! # Dispatcher
//!
//! Single entry point for every envelope, whatever channel it came from.
//!
//! ```text
//! envelope ─→ verify ─→ already stored? ─→ decode ─→ route ─→ handler
//!               │            │                │                  │
//!            REJECTED    PROCESSED        REJECTED     Ok ─→ store ─→ PROCESSED
//!                                                      recoverable ─→ DEFERRED (queued)
//!                                                      other ──────→ REJECTED
//! ```
//!
//! Deferred envelopes are replayed by [`Dispatcher::replay_deferred`] after
//! each broadcast and catchup. There are no timers.

use crate::error::{SyncError, SyncResult};
use crate::handlers::{self, Incoming, SyncContext};
use crate::metrics;
use pop_telemetry::log_message_event;
use pop_types::{Channel, Data, MessageId, SignedMessage};
use std::collections::{HashSet, VecDeque};

/// What became of one envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Handled, or already handled before
    Processed,
    /// A dependency is missing; queued for replay
    Deferred(SyncError),
    /// Dropped for good
    Rejected(SyncError),
}

impl ProcessOutcome {
    #[must_use]
    pub fn is_processed(&self) -> bool {
        matches!(self, Self::Processed)
    }

    #[must_use]
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

pub struct Dispatcher {
    cx: SyncContext,
    deferred: VecDeque<(Channel, SignedMessage)>,
    queued: HashSet<MessageId>,
}

impl Dispatcher {
    pub fn new(cx: SyncContext) -> Self {
        Self {
            cx,
            deferred: VecDeque::new(),
            queued: HashSet::new(),
        }
    }

    #[must_use]
    pub fn context(&self) -> &SyncContext {
        &self.cx
    }

    /// Number of envelopes waiting for replay.
    #[must_use]
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Handle one envelope delivered on `channel`.
    pub fn process(&mut self, channel: &Channel, message: SignedMessage) -> ProcessOutcome {
        let outcome = self.try_process(channel, &message);
        match outcome {
            Ok(None) => ProcessOutcome::Processed,
            Ok(Some(object)) => {
                log_message_event!(debug, "Message processed", channel, message.message_id, object);
                metrics::record_processed(object);
                self.queued.remove(&message.message_id);
                self.cx.store.put(message);
                ProcessOutcome::Processed
            }
            Err(err) if err.is_recoverable() => {
                log_message_event!(debug, "Message deferred", channel, message.message_id, reason = %err);
                metrics::record_deferred(err.kind());
                self.enqueue(channel.clone(), message);
                ProcessOutcome::Deferred(err)
            }
            Err(err) => {
                log_message_event!(warn, "Message rejected", channel, message.message_id, reason = %err);
                metrics::record_rejected(err.kind());
                self.queued.remove(&message.message_id);
                ProcessOutcome::Rejected(err)
            }
        }
    }

    /// `Ok(None)` when the envelope was already handled, otherwise the
    /// object tag of the handled payload.
    fn try_process(&self, channel: &Channel, message: &SignedMessage) -> SyncResult<Option<&'static str>> {
        message.verify(self.cx.crypto.as_ref())?;
        if self.cx.store.contains(&message.message_id) {
            return Ok(None);
        }

        let data = message.decode_data()?;
        let incoming = Incoming {
            channel,
            message_id: &message.message_id,
            sender: &message.sender,
        };
        route(&self.cx, &incoming, &data)?;
        Ok(Some(data.object()))
    }

    fn enqueue(&mut self, channel: Channel, message: SignedMessage) {
        if !self.queued.insert(message.message_id.clone()) {
            return;
        }
        if self.deferred.len() >= self.cx.config.max_deferred {
            if let Some((dropped_channel, dropped)) = self.deferred.pop_front() {
                self.queued.remove(&dropped.message_id);
                log_message_event!(warn, "Deferred queue full, oldest message dropped", dropped_channel, dropped.message_id);
                metrics::record_rejected("deferred_overflow");
            }
        }
        self.deferred.push_back((channel, message));
    }

    /// Re-process queued envelopes until a full pass makes no progress.
    ///
    /// # Returns
    ///
    /// How many envelopes left the queue.
    pub fn replay_deferred(&mut self) -> usize {
        let mut resolved = 0;
        loop {
            let batch: Vec<_> = self.deferred.drain(..).collect();
            self.queued.clear();
            let before = batch.len();
            for (channel, message) in batch {
                // a deferred outcome re-queues it
                self.process(&channel, message);
            }
            let progress = before - self.deferred.len();
            resolved += progress;
            if progress == 0 || self.deferred.is_empty() {
                return resolved;
            }
        }
    }
}

/// Total map from payload variant to handler.
fn route(cx: &SyncContext, msg: &Incoming<'_>, data: &Data) -> SyncResult<()> {
    use handlers::{consensus, election, lao, roll_call, witness};

    match data {
        Data::CreateLao(create) => lao::handle_create_lao(cx, msg, create),
        Data::UpdateLao(update) => lao::handle_update_lao(cx, msg, update),
        Data::StateLao(state) => lao::handle_state_lao(cx, msg, state),
        Data::GreetLao(greet) => lao::handle_greet_lao(cx, msg, greet),
        Data::CreateRollCall(create) => roll_call::handle_create_roll_call(cx, msg, create),
        Data::OpenRollCall(open) => roll_call::handle_open_roll_call(cx, msg, open, false),
        Data::ReopenRollCall(open) => roll_call::handle_open_roll_call(cx, msg, open, true),
        Data::CloseRollCall(close) => roll_call::handle_close_roll_call(cx, msg, close),
        Data::ElectionSetup(setup) => election::handle_election_setup(cx, msg, setup),
        Data::OpenElection(open) => election::handle_election_open(cx, msg, open),
        Data::CastVote(cast) => election::handle_cast_vote(cx, msg, cast),
        Data::ElectionEnd(end) => election::handle_election_end(cx, msg, end),
        Data::ElectionResult(result) => election::handle_election_result(cx, msg, result),
        Data::ElectionKey(key) => election::handle_election_key(cx, msg, key),
        Data::WitnessMessageSignature(signature) => witness::handle_witness_signature(cx, msg, signature),
        Data::ConsensusElect(elect) => consensus::handle_elect(cx, msg, elect),
        Data::ConsensusElectAccept(accept) => consensus::handle_elect_accept(cx, msg, accept),
        Data::ConsensusLearn(learn) => consensus::handle_learn(cx, msg, learn),
        Data::ConsensusFailure(failure) => consensus::handle_failure(cx, msg, failure),
        Data::ConsensusPrepare(phase)
        | Data::ConsensusPromise(phase)
        | Data::ConsensusPropose(phase)
        | Data::ConsensusAccept(phase) => consensus::handle_backend_phase(msg, data, phase),
    }
}
