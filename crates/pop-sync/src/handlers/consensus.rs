//! Consensus messages on `/root/<lao>/consensus`.

use super::{Incoming, SyncContext};
use crate::error::{SyncError, SyncResult};
use pop_types::data::{ConsensusElect, ConsensusElectAccept, ConsensusFailure, ConsensusLearn, ConsensusPhase};
use pop_types::Data;
use tracing::debug;

fn consensus_lao<'a>(msg: &Incoming<'a>) -> SyncResult<&'a str> {
    if !msg.channel.is_consensus_channel() {
        return Err(SyncError::DataHandling(format!(
            "consensus message on non-consensus channel {}",
            msg.channel
        )));
    }
    msg.lao_id()
}

/// `consensus/elect`
pub fn handle_elect(cx: &SyncContext, msg: &Incoming<'_>, elect: &ConsensusElect) -> SyncResult<()> {
    let lao_id = consensus_lao(msg)?;
    cx.consensus
        .handle_elect(lao_id, msg.channel, msg.message_id, msg.sender, elect)?;
    Ok(())
}

/// `consensus/elect_accept`
pub fn handle_elect_accept(cx: &SyncContext, msg: &Incoming<'_>, accept: &ConsensusElectAccept) -> SyncResult<()> {
    let lao_id = consensus_lao(msg)?;
    cx.consensus
        .handle_elect_accept(lao_id, msg.message_id, msg.sender, accept)
}

/// `consensus/learn`
pub fn handle_learn(cx: &SyncContext, msg: &Incoming<'_>, learn: &ConsensusLearn) -> SyncResult<()> {
    let lao_id = consensus_lao(msg)?;
    cx.consensus.handle_learn(lao_id, learn)?;
    Ok(())
}

/// `consensus/failure`
pub fn handle_failure(cx: &SyncContext, msg: &Incoming<'_>, failure: &ConsensusFailure) -> SyncResult<()> {
    let lao_id = consensus_lao(msg)?;
    cx.consensus.handle_failure(lao_id, failure)?;
    Ok(())
}

/// Prepare, promise, propose and accept run between backends only.
pub fn handle_backend_phase(msg: &Incoming<'_>, data: &Data, phase: &ConsensusPhase) -> SyncResult<()> {
    consensus_lao(msg)?;
    debug!(
        channel = %msg.channel,
        action = data.action(),
        elect_id = %phase.message_id,
        "Backend consensus phase ignored"
    );
    Ok(())
}
