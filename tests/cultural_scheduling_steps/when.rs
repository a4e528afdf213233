//! When steps for cultural scheduling BDD scenarios.

use super::world::{SchedulingWorld, parse_time, run_async};
use kalaya::scheduling::{
    adapters::memory::{InMemoryObservanceCalendar, PhraseBookTranslator},
    services::{ScheduleRequest, TimingScheduler},
};
use rstest_bdd_macros::when;
use std::sync::Arc;

#[when(r#"a send is requested for "{time}""#)]
fn send_requested(world: &mut SchedulingWorld, time: String) -> Result<(), eyre::Report> {
    let scheduler = TimingScheduler::new(
        Arc::new(InMemoryObservanceCalendar::with_periods(
            world.periods.iter().cloned(),
        )),
        Arc::new(PhraseBookTranslator::new()),
    );
    let request = ScheduleRequest::new(parse_time(&time)?, world.recipients.iter().cloned());
    world.outcome = Some(run_async(scheduler.schedule(&request)));
    Ok(())
}
