//! Then steps for message lifecycle BDD scenarios.

use super::world::{LifecycleWorld, run_async};
use eyre::WrapErr;
use kalaya::delivery::{
    domain::{DeliveryDomainError, EmailAddress, Message, MessageStatus, RecipientDeliveryState},
    services::MessageLifecycleError,
};
use rstest_bdd_macros::then;

fn stored_message(world: &LifecycleWorld) -> Result<Message, eyre::Report> {
    let id = world.message()?.id();
    run_async(world.service.find(id))
        .wrap_err("load scenario message")?
        .ok_or_else(|| eyre::eyre!("scenario message is not stored"))
}

#[then(r#"the message status is "{status}""#)]
fn message_status_is(world: &LifecycleWorld, status: String) -> Result<(), eyre::Report> {
    let expected = MessageStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let message = stored_message(world)?;
    if message.status() != expected {
        return Err(eyre::eyre!(
            "expected status {expected}, found {}",
            message.status()
        ));
    }
    Ok(())
}

#[then("the retry count is {count:u32}")]
fn retry_count_is(world: &LifecycleWorld, count: u32) -> Result<(), eyre::Report> {
    let message = stored_message(world)?;
    if message.retry_count() != count {
        return Err(eyre::eyre!(
            "expected retry count {count}, found {}",
            message.retry_count()
        ));
    }
    Ok(())
}

#[then("the message is terminal")]
fn message_is_terminal(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let message = stored_message(world)?;
    if !message.is_terminal() {
        return Err(eyre::eyre!(
            "expected a terminal message, found {}",
            message.status()
        ));
    }
    Ok(())
}

#[then("no retry is scheduled")]
fn no_retry_scheduled(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let message = stored_message(world)?;
    if let Some(retry_at) = message.next_retry_at() {
        return Err(eyre::eyre!("expected no retry, found one at {retry_at}"));
    }
    Ok(())
}

#[then("exactly one claim succeeds")]
fn exactly_one_claim_succeeds(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let winners = world.claim_results.iter().filter(|claim| claim.is_ok()).count();
    let contended = world
        .claim_results
        .iter()
        .filter_map(|claim| claim.as_ref().err())
        .all(MessageLifecycleError::is_contention);
    if winners != 1 || !contended {
        return Err(eyre::eyre!(
            "expected one winning claim and contention for the rest, got {:?}",
            world.claim_results
        ));
    }
    Ok(())
}

#[then("the claim fails with an invalid transition error")]
fn claim_fails_with_invalid_transition(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let result = world
        .claim_results
        .first()
        .ok_or_else(|| eyre::eyre!("missing claim result"))?;
    if !matches!(
        result,
        Err(MessageLifecycleError::Domain(
            DeliveryDomainError::InvalidTransition { .. }
        ))
    ) {
        return Err(eyre::eyre!(
            "expected InvalidTransition error, got {result:?}"
        ));
    }
    Ok(())
}

#[then(r#"recipient "{recipient}" is "{state}""#)]
fn recipient_state_is(
    world: &LifecycleWorld,
    recipient: String,
    state: String,
) -> Result<(), eyre::Report> {
    let expected = RecipientDeliveryState::try_from(state.as_str())
        .map_err(|err| eyre::eyre!("invalid expected recipient state in scenario: {err}"))?;
    let address = EmailAddress::new(recipient).wrap_err("parse expected recipient")?;
    let id = world.message()?.id();
    let status = run_async(world.service.tracker().find(id, &address))
        .wrap_err("load recipient status")?
        .ok_or_else(|| eyre::eyre!("recipient {address} is not tracked"))?;
    if status.state() != expected {
        return Err(eyre::eyre!(
            "expected recipient state {expected}, found {}",
            status.state()
        ));
    }
    Ok(())
}
