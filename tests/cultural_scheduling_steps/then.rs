//! Then steps for cultural scheduling BDD scenarios.

use super::world::{SchedulingWorld, parse_time};
use kalaya::scheduling::{domain::ResolutionStrategy, services::SchedulingError};
use rstest_bdd_macros::then;

#[then(r#"the strategy is "{strategy}""#)]
fn strategy_is(world: &SchedulingWorld, strategy: String) -> Result<(), eyre::Report> {
    let expected = ResolutionStrategy::try_from(strategy.as_str())
        .map_err(|err| eyre::eyre!("invalid expected strategy in scenario: {err}"))?;
    let decision = world.decision()?;
    if decision.conflict.strategy != expected {
        return Err(eyre::eyre!(
            "expected strategy {expected}, found {}",
            decision.conflict.strategy
        ));
    }
    Ok(())
}

#[then("the send time is not adjusted")]
fn send_time_not_adjusted(world: &SchedulingWorld) -> Result<(), eyre::Report> {
    let decision = world.decision()?;
    if decision.was_adjusted || decision.approved_time != decision.requested_time {
        return Err(eyre::eyre!(
            "expected the requested time to stand, approved {}",
            decision.approved_time
        ));
    }
    Ok(())
}

#[then(r#"the approved time is "{time}""#)]
fn approved_time_is(world: &SchedulingWorld, time: String) -> Result<(), eyre::Report> {
    let expected = parse_time(&time)?;
    let decision = world.decision()?;
    if decision.approved_time != expected {
        return Err(eyre::eyre!(
            "expected approval at {expected}, found {}",
            decision.approved_time
        ));
    }
    Ok(())
}

#[then("confirmation is required")]
fn confirmation_required(world: &SchedulingWorld) -> Result<(), eyre::Report> {
    if !world.decision()?.requires_confirmation {
        return Err(eyre::eyre!("expected the decision to require confirmation"));
    }
    Ok(())
}

#[then("confirmation is not required")]
fn confirmation_not_required(world: &SchedulingWorld) -> Result<(), eyre::Report> {
    if world.decision()?.requires_confirmation {
        return Err(eyre::eyre!("expected an automatic decision"));
    }
    Ok(())
}

#[then("there is no conflict")]
fn no_conflict(world: &SchedulingWorld) -> Result<(), eyre::Report> {
    let decision = world.decision()?;
    if decision.conflict.has_conflict {
        return Err(eyre::eyre!(
            "expected no conflict, found {:?}",
            decision.conflict.conflicting_observance
        ));
    }
    Ok(())
}

#[then("scheduling fails because there are no recipients")]
fn scheduling_fails_without_recipients(world: &SchedulingWorld) -> Result<(), eyre::Report> {
    let outcome = world
        .outcome
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing scheduling outcome"))?;
    if !matches!(outcome, Err(SchedulingError::NoRecipients)) {
        return Err(eyre::eyre!("expected NoRecipients error, got {outcome:?}"));
    }
    Ok(())
}
