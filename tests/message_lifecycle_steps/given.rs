//! Given steps for message lifecycle BDD scenarios.

use super::world::{LifecycleWorld, run_async};
use eyre::WrapErr;
use kalaya::delivery::{
    adapters::memory::ScriptedReply,
    domain::{DeliveryFailure, EmailAddress, WorkerId},
    services::CreateMessageRequest,
};
use rstest_bdd_macros::given;

#[given(r#"a queued message to "{recipient}" allowing {retries:u32} retries"#)]
fn queued_message(
    world: &mut LifecycleWorld,
    recipient: String,
    retries: u32,
) -> Result<(), eyre::Report> {
    let request = CreateMessageRequest::new(
        "announcements@kalaya.org",
        [recipient],
        "templates/puthandu-greeting",
    )
    .with_max_retries(retries);
    let created = run_async(world.service.create(request)).wrap_err("create scenario message")?;
    let queued = run_async(world.service.queue(created.id(), None))
        .wrap_err("queue scenario message")?;
    world.message = Some(queued);
    Ok(())
}

#[given(r#"the provider defers "{recipient}" {times:u32} times"#)]
fn provider_defers(
    world: &mut LifecycleWorld,
    recipient: String,
    times: u32,
) -> Result<(), eyre::Report> {
    let address = EmailAddress::new(recipient).wrap_err("parse deferred recipient")?;
    for _ in 0..times {
        world.transport.push_reply(
            &address,
            ScriptedReply::reject(DeliveryFailure::transient("mailbox busy")),
        );
    }
    Ok(())
}

#[given(r#"the provider rejects "{recipient}" permanently"#)]
fn provider_rejects(world: &mut LifecycleWorld, recipient: String) -> Result<(), eyre::Report> {
    let address = EmailAddress::new(recipient).wrap_err("parse rejected recipient")?;
    world.transport.push_reply(
        &address,
        ScriptedReply::reject(DeliveryFailure::permanent("no such mailbox")),
    );
    Ok(())
}

#[given("the message has been cancelled")]
fn message_cancelled(world: &mut LifecycleWorld) -> Result<(), eyre::Report> {
    let id = world.message()?.id();
    let cancelled = run_async(world.service.cancel(id, "festival greeting withdrawn"))
        .wrap_err("cancel scenario message")?;
    world.message = Some(cancelled);
    Ok(())
}

#[given(r#"dispatcher "{name}" has sent the message"#)]
fn message_sent(world: &mut LifecycleWorld, name: String) -> Result<(), eyre::Report> {
    let worker = WorkerId::new(name).wrap_err("parse dispatcher name")?;
    let report = run_async(world.service.process_next(&worker))
        .wrap_err("dispatch scenario message")?
        .ok_or_else(|| eyre::eyre!("queued message was not claimable"))?;
    world.message = Some(report.message);
    Ok(())
}
