//! Given steps for cultural scheduling BDD scenarios.

use super::world::{SchedulingWorld, parse_time};
use eyre::WrapErr;
use kalaya::scheduling::domain::{
    CommunityId, DiasporaProfile, Location, ObservancePeriod, ObservanceType, Severity,
};
use rstest_bdd_macros::given;

#[given(
    r#"the "{community}" community observes "{name}" as "{kind}" from "{start}" to "{end}" with "{severity}" severity"#
)]
fn community_observes(
    world: &mut SchedulingWorld,
    community: String,
    name: String,
    kind: String,
    start: String,
    end: String,
    severity: String,
) -> Result<(), eyre::Report> {
    let period = ObservancePeriod::new(
        name,
        CommunityId::new(community).wrap_err("parse observing community")?,
        ObservanceType::new(kind).wrap_err("parse observance type")?,
        parse_time(&start)?,
        parse_time(&end)?,
        Severity::try_from(severity.as_str())
            .map_err(|err| eyre::eyre!("invalid severity in scenario: {err}"))?,
    )
    .wrap_err("build observance period")?;
    world.periods.push(period);
    Ok(())
}

#[given(r#"a recipient in "{city}" belonging to "{community}""#)]
fn recipient_in_city(
    world: &mut SchedulingWorld,
    city: String,
    community: String,
) -> Result<(), eyre::Report> {
    let member = CommunityId::new(community).wrap_err("parse recipient community")?;
    world
        .recipients
        .push(DiasporaProfile::new(Location::city(city), [member]));
    Ok(())
}
