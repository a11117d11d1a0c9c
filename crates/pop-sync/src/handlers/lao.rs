//! LAO lifecycle: create, update, state, greet.

use super::{require_organizer, Incoming, SyncContext};
use crate::domain::{ids, Lao, PendingUpdate, Server, WitnessMessage};
use crate::error::{SyncError, SyncResult};
use crate::witnessing::WitnessedAction;
use pop_telemetry::log_lao_event;
use pop_types::channel::COIN;
use pop_types::data::{CreateLao, GreetLao, StateLao, UpdateLao};
use std::collections::BTreeSet;

const UPDATE_NAME_TITLE: &str = "Update Lao Name";
const UPDATE_WITNESSES_TITLE: &str = "Update Lao Witnesses";

/// `lao/create`
pub fn handle_create_lao(cx: &SyncContext, msg: &Incoming<'_>, create: &CreateLao) -> SyncResult<()> {
    let expected = ids::lao_id(cx.crypto.as_ref(), &create.organizer, create.creation, &create.name);
    if create.id != expected {
        return Err(SyncError::DataHandling(format!(
            "LAO id {} does not match its fields",
            create.id
        )));
    }
    if msg.sender != &create.organizer {
        return Err(SyncError::DataHandling(format!(
            "LAO {} created by {} on behalf of {}",
            create.id, msg.sender, create.organizer
        )));
    }

    let lao = cx.repository.create_lao(Lao::new(
        create.id.clone(),
        create.name.clone(),
        create.creation,
        create.organizer.clone(),
        create.witnesses.iter().cloned(),
    ))?;

    cx.spawn_subscribe(lao.channel.clone());
    cx.spawn_subscribe(lao.channel.sub_channel(COIN));
    cx.join_consensus_if_participant(&lao);
    Ok(())
}

/// `lao/update_properties`
///
/// Nothing changes until every current witness has signed the update; the
/// consolidation then runs through [`super::witness::run_actions`].
pub fn handle_update_lao(cx: &SyncContext, msg: &Incoming<'_>, update: &UpdateLao) -> SyncResult<()> {
    let lao_id = msg.lao_id()?;
    let lao = cx.repository.get_lao_view(lao_id)?;
    require_organizer(&lao, msg.sender)?;
    if update.id != lao.id {
        return Err(SyncError::DataHandling(format!(
            "update for LAO {} sent on {}",
            update.id, msg.channel
        )));
    }
    if update.last_modified < lao.last_modified {
        return Err(SyncError::DataHandling(format!(
            "update of LAO {} at {} is older than {}",
            lao.id, update.last_modified, lao.last_modified
        )));
    }

    let witnesses: BTreeSet<_> = update.witnesses.iter().filter(|w| !w.is_empty()).cloned().collect();
    let witness_message = if update.name != lao.name {
        WitnessMessage::new(
            msg.message_id.clone(),
            UPDATE_NAME_TITLE,
            format!("Old Name: {}\nNew Name: {}", lao.name, update.name),
        )
    } else if witnesses != lao.witnesses {
        WitnessMessage::new(msg.message_id.clone(), UPDATE_WITNESSES_TITLE, "")
    } else {
        return Err(SyncError::DataHandling(format!(
            "update of LAO {} changes nothing",
            lao.id
        )));
    };

    cx.witnessing.add_witness_message(lao_id, witness_message)?;
    if !lao.witnesses.is_empty() {
        cx.repository.add_pending_update(
            lao_id,
            PendingUpdate {
                modification_time: update.last_modified,
                message_id: msg.message_id.clone(),
            },
        )?;
    }

    let action = WitnessedAction::ConsolidateUpdate {
        lao_id: lao_id.to_string(),
        message_id: msg.message_id.clone(),
        update: update.clone(),
    };
    if let Some(ready) = cx
        .witnessing
        .perform_action_when_threshold_reached(lao_id, msg.message_id, action)?
    {
        super::witness::run_actions(cx, vec![ready])?;
    }
    Ok(())
}

/// `lao/state`
///
/// Deferred until the update it consolidates has been stored.
pub fn handle_state_lao(cx: &SyncContext, msg: &Incoming<'_>, state: &StateLao) -> SyncResult<()> {
    let lao_id = msg.lao_id()?;
    if state.id != lao_id {
        return Err(SyncError::DataHandling(format!(
            "state of LAO {} sent on {}",
            state.id, msg.channel
        )));
    }
    let lao = cx.repository.get_lao_view(lao_id)?;
    require_organizer(&lao, msg.sender)?;

    if cx
        .repository
        .consolidate_state(state, &cx.store, cx.crypto.as_ref())?
    {
        let lao = cx.repository.get_lao_view(lao_id)?;
        cx.join_consensus_if_participant(&lao);
        // witnesses may have changed under pending actions
        let fired = cx.witnessing.reevaluate(lao_id)?;
        super::witness::run_actions(cx, fired)?;
    }
    Ok(())
}

/// `lao/greet`
pub fn handle_greet_lao(cx: &SyncContext, msg: &Incoming<'_>, greet: &GreetLao) -> SyncResult<()> {
    let lao_id = msg.lao_id()?;
    if greet.lao != lao_id {
        return Err(SyncError::DataHandling(format!(
            "greeting for LAO {} sent on {}",
            greet.lao, msg.channel
        )));
    }
    cx.repository.get_lao_view(lao_id)?;

    log_lao_event!(debug, "Backend greeted", lao_id, address = %greet.address, peers = greet.peers.len());
    cx.repository.add_server(
        lao_id,
        Server {
            address: greet.address.clone(),
            backend: msg.sender.clone(),
            frontend: greet.frontend.clone(),
            peers: greet.peers.iter().map(|p| p.address.clone()).collect(),
        },
    )
}
