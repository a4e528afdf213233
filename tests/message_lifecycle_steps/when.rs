//! When steps for message lifecycle BDD scenarios.

use super::world::{LifecycleWorld, run_async};
use eyre::WrapErr;
use kalaya::delivery::{
    domain::{EmailAddress, RecipientDeliveryState, RecipientUpdate, WorkerId},
    services::AttemptOutcome,
};
use mockable::Clock;
use rstest_bdd_macros::when;

const MAX_ATTEMPTS: usize = 20;

#[when(r#"dispatcher "{name}" attempts delivery until the message settles"#)]
fn attempt_until_settled(world: &mut LifecycleWorld, name: String) -> Result<(), eyre::Report> {
    let worker = WorkerId::new(name).wrap_err("parse dispatcher name")?;
    for _ in 0..MAX_ATTEMPTS {
        let Some(report) =
            run_async(world.service.process_next(&worker)).wrap_err("process next message")?
        else {
            return Err(eyre::eyre!("message was not ready to dispatch"));
        };
        let retry_at = match report.outcome {
            AttemptOutcome::RetryScheduled { retry_at } => Some(retry_at),
            AttemptOutcome::Sent | AttemptOutcome::Exhausted(_) | AttemptOutcome::Rejected(_) => {
                None
            }
        };
        world.message = Some(report.message);
        match retry_at {
            Some(at) => world.clock.set(at),
            None => return Ok(()),
        }
    }
    Err(eyre::eyre!("message did not settle after {MAX_ATTEMPTS} attempts"))
}

#[when(r#"dispatchers "{first}" and "{second}" claim the message together"#)]
fn claim_together(
    world: &mut LifecycleWorld,
    first: String,
    second: String,
) -> Result<(), eyre::Report> {
    let id = world.message()?.id();
    let first_worker = WorkerId::new(first).wrap_err("parse first dispatcher")?;
    let second_worker = WorkerId::new(second).wrap_err("parse second dispatcher")?;
    let (first_claim, second_claim) = run_async(async {
        tokio::join!(
            world.service.claim(id, &first_worker),
            world.service.claim(id, &second_worker)
        )
    });
    world.claim_results = vec![first_claim, second_claim];
    Ok(())
}

#[when(r#"dispatcher "{name}" claims the message"#)]
fn claim_message(world: &mut LifecycleWorld, name: String) -> Result<(), eyre::Report> {
    let id = world.message()?.id();
    let worker = WorkerId::new(name).wrap_err("parse dispatcher name")?;
    let claim = run_async(world.service.claim(id, &worker));
    world.claim_results = vec![claim];
    Ok(())
}

#[when(r#"the provider reports "{recipient}" as "{state}""#)]
fn provider_reports(
    world: &mut LifecycleWorld,
    recipient: String,
    state: String,
) -> Result<(), eyre::Report> {
    let id = world.message()?.id();
    let address = EmailAddress::new(recipient).wrap_err("parse reported recipient")?;
    let reported = RecipientDeliveryState::try_from(state.as_str())
        .map_err(|err| eyre::eyre!("invalid recipient state in scenario: {err}"))?;
    run_async(world.service.record_recipient_event(
        id,
        &address,
        RecipientUpdate::new(reported, world.clock.utc()),
    ))
    .wrap_err("record recipient event")?;
    Ok(())
}
