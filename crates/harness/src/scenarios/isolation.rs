//! Concurrent scenarios must not observe each other's data

use futures::future::try_join_all;

use crate::check;
use crate::error::{HarnessError, HarnessResult};
use crate::fixtures::FixtureData;
use crate::runner::{Scenario, ScenarioContext};

/// Raffles created at once by the parallel-raffles scenario
pub const PARALLEL_RAFFLES: usize = 16;

pub const SCENARIOS: &[Scenario] = &[
    scenario!("isolation: parallel raffles", ["isolation", "raffle"], parallel_raffles),
    scenario!(
        "isolation: parallel participants",
        ["isolation", "participant"],
        parallel_participants,
    ),
];

/// Create one raffle with a random name and read it back by id
async fn own_raffle(ctx: ScenarioContext) -> HarnessResult<()> {
    let request = FixtureData::raffle_request();
    let id = ctx.api.raffles.create(&request).await?.id;

    let Some(raffle) = ctx.api.raffles.find(&id).await? else {
        return Err(HarnessError::Assertion(format!("raffle {id} not listed")));
    };
    check!(
        raffle.name == request.name,
        "raffle {id} reads back as {:?}, created as {:?}",
        raffle.name,
        request.name
    );
    Ok(())
}

async fn parallel_raffles(ctx: ScenarioContext) -> HarnessResult<()> {
    try_join_all((0..PARALLEL_RAFFLES).map(|_| own_raffle(ctx.clone()))).await?;
    Ok(())
}

async fn parallel_participants(ctx: ScenarioContext) -> HarnessResult<()> {
    let raffle_id = ctx.fixtures.create_raffle().await?.id;

    let ids = try_join_all(
        (0..PARALLEL_RAFFLES).map(|_| ctx.fixtures.create_participant(&raffle_id)),
    )
    .await?;

    let listed = ctx.api.participants.list(&raffle_id).await?;
    check!(
        listed.len() == PARALLEL_RAFFLES,
        "raffle {raffle_id} lists {} participants, expected {PARALLEL_RAFFLES}",
        listed.len()
    );
    check!(
        ids.iter().all(|created| listed.iter().any(|p| p.id == created.id)),
        "raffle {raffle_id} lost a concurrently created participant"
    );
    Ok(())
}
