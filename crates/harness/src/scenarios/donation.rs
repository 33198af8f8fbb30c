//! Donations and ticket arithmetic

use crate::check;
use crate::contract::{expect_not_found, expect_ticket_count, expect_validation, ValidationFailure};
use crate::controllers::donation::{DELETE_NOT_FOUND, GET_NOT_FOUND, PARTICIPANT_NOT_FOUND};
use crate::error::HarnessResult;
use crate::fixtures::FixtureData;
use crate::runner::{Scenario, ScenarioContext};

pub const SCENARIOS: &[Scenario] = &[
    scenario!("donation: create counts tickets", ["donation", "smoke"], create_counts_tickets),
    scenario!("donation: update recomputes tickets", ["donation"], update_recomputes_tickets),
    scenario!("donation: delete", ["donation", "not-found"], delete),
    scenario!("donation: get missing", ["donation", "not-found"], get_missing),
    scenario!("donation: unknown participant", ["donation", "not-found"], unknown_participant),
    scenario!("donation: zero amount", ["donation", "validation"], zero_amount),
    scenario!("donation: listed under its prize", ["donation"], listed_under_prize),
];

async fn create_counts_tickets(ctx: ScenarioContext) -> HarnessResult<()> {
    let graph = ctx.fixtures.raffle_with_prize_and_participant().await?;
    let prize = ctx.api.prizes.get(&graph.raffle_id, &graph.prize_id).await?;

    let request = FixtureData::donation_request(
        &graph.participant_id,
        FixtureData::amount_for(prize.ticket_cost, 3),
    );
    let id = ctx
        .api
        .donations
        .create(&graph.raffle_id, &graph.prize_id, &request)
        .await?
        .id;

    let donation = ctx.api.donations.get(&graph.raffle_id, &graph.prize_id, &id).await?;
    check!(
        donation.amount == request.amount,
        "donation amount {}, expected {}",
        donation.amount,
        request.amount,
    );
    check!(
        donation.participant_id == graph.participant_id,
        "donation participant {}, expected {}",
        donation.participant_id,
        graph.participant_id
    );
    check!(
        donation.tickets_number == 3,
        "donation bought {} tickets, expected 3",
        donation.tickets_number,
    );
    expect_ticket_count(&donation, &prize)
}

async fn update_recomputes_tickets(ctx: ScenarioContext) -> HarnessResult<()> {
    let graph = ctx.fixtures.raffle_with_prize_and_participant().await?;
    let id = ctx
        .fixtures
        .create_donation(&graph.raffle_id, &graph.prize_id, &graph.participant_id)
        .await?
        .id;
    let prize = ctx.api.prizes.get(&graph.raffle_id, &graph.prize_id).await?;

    let update = FixtureData::donation_request(
        &graph.participant_id,
        FixtureData::amount_for(prize.ticket_cost, 7),
    );
    ctx.api
        .donations
        .update(&graph.raffle_id, &graph.prize_id, &id, &update)
        .await?;

    let donation = ctx.api.donations.get(&graph.raffle_id, &graph.prize_id, &id).await?;
    check!(
        donation.amount == update.amount,
        "donation amount {}, expected {}",
        donation.amount,
        update.amount,
    );
    expect_ticket_count(&donation, &prize)
}

async fn delete(ctx: ScenarioContext) -> HarnessResult<()> {
    let graph = ctx.fixtures.raffle_with_prize_and_participant().await?;
    let id = ctx
        .fixtures
        .create_donation(&graph.raffle_id, &graph.prize_id, &graph.participant_id)
        .await?
        .id;

    ctx.api.donations.delete(&graph.raffle_id, &graph.prize_id, &id).await?;
    check!(
        ctx.api
            .donations
            .find(&graph.raffle_id, &graph.prize_id, &id)
            .await?
            .is_none(),
        "donation {id} still listed after delete"
    );

    let response = ctx
        .api
        .donations
        .delete_raw(&graph.raffle_id, &graph.prize_id, &id)
        .await?;
    expect_not_found(&response, DELETE_NOT_FOUND)
}

async fn get_missing(ctx: ScenarioContext) -> HarnessResult<()> {
    let graph = ctx.fixtures.raffle_with_prize_and_participant().await?;
    let response = ctx
        .api
        .donations
        .get_raw(&graph.raffle_id, &graph.prize_id, &FixtureData::missing_id())
        .await?;
    expect_not_found(&response, GET_NOT_FOUND)
}

async fn unknown_participant(ctx: ScenarioContext) -> HarnessResult<()> {
    let graph = ctx.fixtures.raffle_with_prize_and_participant().await?;
    let request = FixtureData::donation_request(&FixtureData::missing_id(), 100);

    let response = ctx
        .api
        .donations
        .create_raw(&graph.raffle_id, &graph.prize_id, &request)
        .await?;
    expect_not_found(&response, PARTICIPANT_NOT_FOUND)?;

    let listed = ctx.api.donations.list(&graph.raffle_id, &graph.prize_id).await?;
    check!(listed.is_empty(), "donation for unknown participant was stored");
    Ok(())
}

async fn zero_amount(ctx: ScenarioContext) -> HarnessResult<()> {
    let graph = ctx.fixtures.raffle_with_prize_and_participant().await?;
    let request = FixtureData::donation_request(&graph.participant_id, 0);

    let response = ctx
        .api
        .donations
        .create_raw(&graph.raffle_id, &graph.prize_id, &request)
        .await?;
    expect_validation(&response, &[ValidationFailure::new("DonationRequest", "Amount", "required")])
}

async fn listed_under_prize(ctx: ScenarioContext) -> HarnessResult<()> {
    let graph = ctx.fixtures.raffle_with_prize_and_participant().await?;
    let other_prize_id = ctx.fixtures.create_prize(&graph.raffle_id).await?.id;

    let mut own = Vec::new();
    for _ in 0..2 {
        let id = ctx
            .fixtures
            .create_donation(&graph.raffle_id, &graph.prize_id, &graph.participant_id)
            .await?
            .id;
        own.push(id);
    }
    let foreign = ctx
        .fixtures
        .create_donation(&graph.raffle_id, &other_prize_id, &graph.participant_id)
        .await?
        .id;

    let listed = ctx.api.donations.list(&graph.raffle_id, &graph.prize_id).await?;
    check!(
        listed.len() == own.len(),
        "prize lists {} donations, expected {}",
        listed.len(),
        own.len(),
    );
    check!(
        own.iter().all(|id| listed.iter().any(|d| &d.id == id)),
        "prize {} is missing one of its donations",
        graph.prize_id
    );
    check!(
        listed.iter().all(|d| d.id != foreign),
        "donation {foreign} to another prize listed under {}",
        graph.prize_id
    );
    Ok(())
}
