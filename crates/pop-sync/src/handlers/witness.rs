//! Witness signatures and the actions they unlock.

use super::{Incoming, SyncContext};
use crate::domain::{LaoMetadata, RollCallState};
use crate::error::SyncResult;
use crate::witnessing::WitnessedAction;
use pop_telemetry::log_lao_event;
use pop_types::channel::SOCIAL;
use pop_types::data::{StateLao, WitnessMessageSignature};
use pop_types::Data;
use std::collections::VecDeque;

/// `message/witness`
pub fn handle_witness_signature(
    cx: &SyncContext,
    msg: &Incoming<'_>,
    witness: &WitnessMessageSignature,
) -> SyncResult<()> {
    let lao_id = msg.lao_id()?;
    let fired = cx
        .witnessing
        .handle_signature(lao_id, &witness.message_id, msg.sender, &witness.signature)?;
    run_actions(cx, fired)
}

/// Run fired actions in order.
///
/// A consolidated update may change the witness set, so the LAO is
/// re-evaluated after each one and anything newly unlocked is appended.
pub(crate) fn run_actions(cx: &SyncContext, actions: Vec<WitnessedAction>) -> SyncResult<()> {
    let mut queue: VecDeque<_> = actions.into();
    while let Some(action) = queue.pop_front() {
        let lao_id = action.lao_id().to_string();
        let consolidated = matches!(action, WitnessedAction::ConsolidateUpdate { .. });
        apply_action(cx, action)?;
        if consolidated {
            queue.extend(cx.witnessing.reevaluate(&lao_id)?);
        }
    }
    Ok(())
}

fn apply_action(cx: &SyncContext, action: WitnessedAction) -> SyncResult<()> {
    match action {
        WitnessedAction::CommitRollCall {
            lao_id,
            previous_id,
            roll_call,
        } => {
            log_lao_event!(info, "Roll call committed", lao_id, roll_call_id = %roll_call.id, state = %roll_call.state);
            let social = (roll_call.state == RollCallState::Closed).then(|| roll_call.attendees.clone());
            cx.repository
                .upsert_roll_call(&lao_id, previous_id.as_deref(), roll_call)?;

            if let Some(attendees) = social {
                let lao = cx.repository.get_lao_view(&lao_id)?;
                for attendee in attendees {
                    cx.spawn_subscribe(lao.channel.sub_channel(SOCIAL).sub_channel(attendee.as_str()));
                }
            }
            Ok(())
        }
        WitnessedAction::CommitElection { lao_id, election } => {
            log_lao_event!(info, "Election committed", lao_id, election_id = %election.id);
            let channel = election.channel.clone();
            cx.repository.upsert_election(&lao_id, election)?;
            cx.spawn_subscribe(channel);
            Ok(())
        }
        WitnessedAction::ConsolidateUpdate {
            lao_id,
            message_id,
            update,
        } => {
            let lao = cx.repository.get_lao_view(&lao_id)?;
            if update.last_modified < lao.last_modified {
                log_lao_event!(debug, "Witnessed update superseded", lao_id, message_id = %message_id);
                return Ok(());
            }

            cx.repository.update_metadata(
                &lao_id,
                LaoMetadata {
                    name: update.name.clone(),
                    witnesses: update.witnesses.iter().cloned().collect(),
                    last_modified: update.last_modified,
                    modification_id: message_id.clone(),
                },
            )?;
            let lao = cx.repository.get_lao_view(&lao_id)?;

            if lao.is_organizer(&cx.own_key) {
                let modification_signatures = cx
                    .store
                    .get(&message_id)
                    .map(|stored| stored.witness_signatures)
                    .unwrap_or_default();
                let state = StateLao {
                    id: lao.id.clone(),
                    name: lao.name.clone(),
                    creation: lao.creation,
                    last_modified: lao.last_modified,
                    organizer: lao.organizer.clone(),
                    witnesses: lao.witnesses.iter().cloned().collect(),
                    modification_id: message_id,
                    modification_signatures,
                };
                cx.spawn_publish(lao.channel.clone(), Data::StateLao(state));
            }
            cx.join_consensus_if_participant(&lao);
            Ok(())
        }
    }
}
