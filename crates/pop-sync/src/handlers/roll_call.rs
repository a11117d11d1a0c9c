//! Roll call lifecycle. Every transition is witnessed before it is committed.

use super::{require_organizer, Incoming, SyncContext};
use crate::domain::{ids, RollCall, WitnessMessage};
use crate::error::{SyncError, SyncResult};
use crate::witnessing::WitnessedAction;
use pop_types::data::{CloseRollCall, CreateRollCall, OpenRollCall};
use pop_types::Timestamp;

/// `roll_call/create`
pub fn handle_create_roll_call(cx: &SyncContext, msg: &Incoming<'_>, create: &CreateRollCall) -> SyncResult<()> {
    let lao_id = msg.lao_id()?;
    let lao = cx.repository.get_lao_view(lao_id)?;
    require_organizer(&lao, msg.sender)?;

    let expected = ids::create_roll_call_id(cx.crypto.as_ref(), lao_id, create.creation, &create.name);
    if create.id != expected {
        return Err(SyncError::DataHandling(format!(
            "roll call id {} does not match its fields",
            create.id
        )));
    }

    let roll_call = RollCall::from_create(create);
    witness_then_commit(cx, msg, "New Roll Call was created", None, roll_call)
}

/// `roll_call/open` and `roll_call/reopen`
pub fn handle_open_roll_call(
    cx: &SyncContext,
    msg: &Incoming<'_>,
    open: &OpenRollCall,
    reopen: bool,
) -> SyncResult<()> {
    let lao_id = msg.lao_id()?;
    let lao = cx.repository.get_lao_view(lao_id)?;
    require_organizer(&lao, msg.sender)?;
    check_update_id(cx, lao_id, &open.update_id, &open.opens, open.opened_at)?;

    let current = cx.repository.get_roll_call_with_id(lao_id, &open.opens)?;
    let opened = current.opened(open, reopen)?;
    let title = if reopen {
        "Roll Call was reopened"
    } else {
        "Roll Call was opened"
    };
    witness_then_commit(cx, msg, title, Some(current.id), opened)
}

/// `roll_call/close`
pub fn handle_close_roll_call(cx: &SyncContext, msg: &Incoming<'_>, close: &CloseRollCall) -> SyncResult<()> {
    let lao_id = msg.lao_id()?;
    let lao = cx.repository.get_lao_view(lao_id)?;
    require_organizer(&lao, msg.sender)?;
    check_update_id(cx, lao_id, &close.update_id, &close.closes, close.closed_at)?;

    let current = cx.repository.get_roll_call_with_id(lao_id, &close.closes)?;
    let closed = current.closed(close)?;
    witness_then_commit(cx, msg, "Roll Call was closed", Some(current.id), closed)
}

fn check_update_id(
    cx: &SyncContext,
    lao_id: &str,
    update_id: &str,
    previous_id: &str,
    at: Timestamp,
) -> SyncResult<()> {
    if update_id == ids::update_roll_call_id(cx.crypto.as_ref(), lao_id, previous_id, at) {
        Ok(())
    } else {
        Err(SyncError::DataHandling(format!(
            "roll call update id {update_id} does not match its fields"
        )))
    }
}

fn witness_then_commit(
    cx: &SyncContext,
    msg: &Incoming<'_>,
    title: &str,
    previous_id: Option<String>,
    roll_call: RollCall,
) -> SyncResult<()> {
    let lao_id = msg.lao_id()?;
    cx.witnessing.add_witness_message(
        lao_id,
        WitnessMessage::new(
            msg.message_id.clone(),
            title,
            format!("Roll Call Name : {}\nMessage ID : {}", roll_call.name, msg.message_id),
        ),
    )?;

    let action = WitnessedAction::CommitRollCall {
        lao_id: lao_id.to_string(),
        previous_id,
        roll_call,
    };
    if let Some(ready) = cx
        .witnessing
        .perform_action_when_threshold_reached(lao_id, msg.message_id, action)?
    {
        super::witness::run_actions(cx, vec![ready])?;
    }
    Ok(())
}
