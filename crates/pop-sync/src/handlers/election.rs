//! Elections: setup is witnessed on the LAO channel, the rest of the
//! lifecycle happens on the election's own channel.

use super::{require_organizer, Incoming, SyncContext};
use crate::domain::{ids, Election, WitnessMessage};
use crate::error::{SyncError, SyncResult};
use crate::witnessing::WitnessedAction;
use pop_types::data::{CastVote, ElectionEnd, ElectionKey, ElectionResult, ElectionSetup, OpenElection};
use tracing::{debug, info};

/// `election/setup`
pub fn handle_election_setup(cx: &SyncContext, msg: &Incoming<'_>, setup: &ElectionSetup) -> SyncResult<()> {
    let lao_id = msg.lao_id()?;
    let lao = cx.repository.get_lao_view(lao_id)?;
    require_organizer(&lao, msg.sender)?;
    if setup.lao != lao_id {
        return Err(SyncError::DataHandling(format!(
            "election setup for LAO {} sent on {}",
            setup.lao, msg.channel
        )));
    }
    let expected = ids::election_id(cx.crypto.as_ref(), lao_id, setup.created_at, &setup.name);
    if setup.id != expected {
        return Err(SyncError::DataHandling(format!(
            "election id {} does not match its fields",
            setup.id
        )));
    }

    let election = Election::from_setup(setup, &lao.channel);
    cx.witnessing.add_witness_message(
        lao_id,
        WitnessMessage::new(
            msg.message_id.clone(),
            "New Election Setup",
            format!("Name : {}\nMessage ID : {}", election.name, msg.message_id),
        ),
    )?;

    let action = WitnessedAction::CommitElection {
        lao_id: lao_id.to_string(),
        election,
    };
    if let Some(ready) = cx
        .witnessing
        .perform_action_when_threshold_reached(lao_id, msg.message_id, action)?
    {
        super::witness::run_actions(cx, vec![ready])?;
    }
    Ok(())
}

/// Lao and election ids from `/root/<lao>/<election>`.
fn election_of<'a>(msg: &Incoming<'a>) -> SyncResult<(&'a str, &'a str)> {
    let lao_id = msg.lao_id()?;
    let election_id = msg
        .channel
        .lao_sub_segment()
        .ok_or_else(|| SyncError::UnknownElection(msg.channel.to_string()))?;
    Ok((lao_id, election_id))
}

/// `election/open`
pub fn handle_election_open(cx: &SyncContext, msg: &Incoming<'_>, open: &OpenElection) -> SyncResult<()> {
    let (lao_id, election_id) = election_of(msg)?;
    let lao = cx.repository.get_lao_view(lao_id)?;
    require_organizer(&lao, msg.sender)?;
    cx.repository
        .update_election(lao_id, election_id, |election| election.open(open.opened_at))?;
    info!(lao_id, election_id, "Election opened");
    Ok(())
}

/// `election/cast_vote`
pub fn handle_cast_vote(cx: &SyncContext, msg: &Incoming<'_>, cast: &CastVote) -> SyncResult<()> {
    let (lao_id, election_id) = election_of(msg)?;
    let replaced = cx.repository.update_election(lao_id, election_id, |election| {
        election.cast_vote(msg.sender, msg.message_id, cast)
    })?;
    if !replaced {
        debug!(lao_id, election_id, voter = %msg.sender, "Older vote ignored");
    }
    Ok(())
}

/// `election/end`
pub fn handle_election_end(cx: &SyncContext, msg: &Incoming<'_>, _end: &ElectionEnd) -> SyncResult<()> {
    let (lao_id, election_id) = election_of(msg)?;
    let lao = cx.repository.get_lao_view(lao_id)?;
    require_organizer(&lao, msg.sender)?;
    cx.repository
        .update_election(lao_id, election_id, Election::end)?;
    info!(lao_id, election_id, "Election ended");
    Ok(())
}

/// `election/result`
pub fn handle_election_result(cx: &SyncContext, msg: &Incoming<'_>, result: &ElectionResult) -> SyncResult<()> {
    let (lao_id, election_id) = election_of(msg)?;
    cx.repository
        .update_election(lao_id, election_id, |election| election.publish_results(result))?;
    info!(lao_id, election_id, questions = result.questions.len(), "Election results received");
    Ok(())
}

/// `election/key`
pub fn handle_election_key(cx: &SyncContext, msg: &Incoming<'_>, key: &ElectionKey) -> SyncResult<()> {
    let (lao_id, election_id) = election_of(msg)?;
    if key.election != election_id {
        return Err(SyncError::DataHandling(format!(
            "key for election {} sent on {}",
            key.election, msg.channel
        )));
    }
    cx.repository.update_election(lao_id, election_id, |election| {
        election.election_key = Some(key.election_key.clone());
        Ok(())
    })
}
