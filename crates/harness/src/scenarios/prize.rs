//! Prize lifecycle, validation and drawing

use std::collections::HashSet;

use crate::check;
use crate::contract::{expect_not_found, expect_validation, expected_tickets, ValidationFailure};
use crate::controllers::prize::{DELETE_NOT_FOUND, GET_NOT_FOUND, PLAY_NOT_FOUND, UPDATE_NOT_FOUND};
use crate::error::HarnessResult;
use crate::fixtures::{FixtureData, TEXT_LEN};
use crate::model::{PlayParticipant, Prize, PrizeRequest};
use crate::runner::{Scenario, ScenarioContext};

/// Participants donating before a draw
const PLAYERS: usize = 3;

pub const SCENARIOS: &[Scenario] = &[
    scenario!("prize: create, list, get", ["prize", "smoke"], create_list_get),
    scenario!("prize: update valid", ["prize"], update_valid),
    scenario!("prize: create with invalid name", ["prize", "validation"], create_invalid_name),
    scenario!("prize: create with zero ticket cost", ["prize", "validation"], create_zero_cost),
    scenario!("prize: get missing", ["prize", "not-found"], get_missing),
    scenario!("prize: update missing", ["prize", "not-found"], update_missing),
    scenario!("prize: delete twice", ["prize", "not-found"], delete_twice),
    scenario!("prize: play picks one winner", ["prize", "play"], play),
    scenario!("prize: play missing", ["prize", "play", "not-found"], play_missing),
];

fn failure(field: &str, rule: &str) -> ValidationFailure {
    ValidationFailure::new("PrizeRequest", field, rule)
}

fn expect_matches(prize: &Prize, request: &PrizeRequest) -> HarnessResult<()> {
    check!(prize.name == request.name, "prize name {:?}, expected {:?}", prize.name, request.name);
    check!(
        prize.ticket_cost == request.ticket_cost,
        "prize ticket cost {}, expected {}",
        prize.ticket_cost,
        request.ticket_cost
    );
    check!(
        prize.description == request.description,
        "prize description {:?}, expected {:?}",
        prize.description,
        request.description
    );
    Ok(())
}

async fn create_list_get(ctx: ScenarioContext) -> HarnessResult<()> {
    let raffle_id = ctx.fixtures.create_raffle().await?.id;
    let request = FixtureData::prize_request();
    let id = ctx.api.prizes.create(&raffle_id, &request).await?.id;

    let listed = ctx.api.prizes.list(&raffle_id).await?;
    check!(listed.len() == 1, "raffle {raffle_id} lists {} prizes, expected 1", listed.len());
    expect_matches(&listed[0], &request)?;

    let prize = ctx.api.prizes.get(&raffle_id, &id).await?;
    check!(prize.id == id, "get returned prize {}, expected {id}", prize.id);
    expect_matches(&prize, &request)
}

async fn update_valid(ctx: ScenarioContext) -> HarnessResult<()> {
    let raffle_id = ctx.fixtures.create_raffle().await?.id;
    let id = ctx.fixtures.create_prize(&raffle_id).await?.id;

    let update = FixtureData::prize_request();
    ctx.api.prizes.update(&raffle_id, &id, &update).await?;
    expect_matches(&ctx.api.prizes.get(&raffle_id, &id).await?, &update)
}

async fn create_invalid_name(ctx: ScenarioContext) -> HarnessResult<()> {
    let raffle_id = ctx.fixtures.create_raffle().await?.id;
    let request = PrizeRequest {
        name: FixtureData::invalid_text(TEXT_LEN),
        ..FixtureData::prize_request()
    };
    let response = ctx.api.prizes.create_raw(&raffle_id, &request).await?;
    expect_validation(&response, &[failure("Name", "charsValidation")])
}

async fn create_zero_cost(ctx: ScenarioContext) -> HarnessResult<()> {
    let raffle_id = ctx.fixtures.create_raffle().await?.id;
    let request = PrizeRequest {
        ticket_cost: 0,
        ..FixtureData::prize_request()
    };
    let response = ctx.api.prizes.create_raw(&raffle_id, &request).await?;
    expect_validation(&response, &[failure("TicketCost", "required")])?;

    let listed = ctx.api.prizes.list(&raffle_id).await?;
    check!(listed.is_empty(), "rejected prize was stored in raffle {raffle_id}");
    Ok(())
}

async fn get_missing(ctx: ScenarioContext) -> HarnessResult<()> {
    let raffle_id = ctx.fixtures.create_raffle().await?.id;
    let response = ctx.api.prizes.get_raw(&raffle_id, &FixtureData::missing_id()).await?;
    expect_not_found(&response, GET_NOT_FOUND)
}

async fn update_missing(ctx: ScenarioContext) -> HarnessResult<()> {
    let raffle_id = ctx.fixtures.create_raffle().await?.id;
    let response = ctx
        .api
        .prizes
        .update_raw(&raffle_id, &FixtureData::missing_id(), &FixtureData::prize_request())
        .await?;
    expect_not_found(&response, UPDATE_NOT_FOUND)
}

async fn delete_twice(ctx: ScenarioContext) -> HarnessResult<()> {
    let raffle_id = ctx.fixtures.create_raffle().await?.id;
    let id = ctx.fixtures.create_prize(&raffle_id).await?.id;

    ctx.api.prizes.delete(&raffle_id, &id).await?;
    check!(
        ctx.api.prizes.find(&raffle_id, &id).await?.is_none(),
        "prize {id} still listed after delete"
    );

    let response = ctx.api.prizes.delete_raw(&raffle_id, &id).await?;
    expect_not_found(&response, DELETE_NOT_FOUND)?;

    let response = ctx.api.prizes.get_raw(&raffle_id, &id).await?;
    expect_not_found(&response, GET_NOT_FOUND)
}

/// Totals must agree with the donations they summarize
fn expect_consistent(player: &PlayParticipant, ticket_cost: i64) -> HarnessResult<()> {
    let who = &player.participant.id;
    let donated: i64 = player.donations.iter().map(|d| d.amount).sum();
    let tickets: i64 = player
        .donations
        .iter()
        .map(|d| expected_tickets(d.amount, ticket_cost))
        .sum();

    check!(!player.donations.is_empty(), "player {who} has no donations");
    check!(
        player.total_donation == donated,
        "player {who} total donation {}, donations sum to {donated}",
        player.total_donation
    );
    check!(
        player.total_tickets_number == tickets,
        "player {who} total tickets {}, expected {tickets}",
        player.total_tickets_number
    );
    Ok(())
}

async fn play(ctx: ScenarioContext) -> HarnessResult<()> {
    let raffle_id = ctx.fixtures.create_raffle().await?.id;
    let prize_id = ctx.fixtures.create_prize(&raffle_id).await?.id;

    let mut donors = HashSet::new();
    for _ in 0..PLAYERS {
        let participant_id = ctx.fixtures.create_participant(&raffle_id).await?.id;
        ctx.fixtures
            .create_donation(&raffle_id, &prize_id, &participant_id)
            .await?;
        donors.insert(participant_id);
    }

    let prize = ctx.api.prizes.get(&raffle_id, &prize_id).await?;
    let result = ctx.api.prizes.play(&raffle_id, &prize_id).await?;

    check!(result.winners.len() == 1, "expected exactly one winner, got {}", result.winners.len());
    check!(
        result.winners.len() + result.participants.len() == PLAYERS,
        "draw covers {} winner(s) and {} other participant(s), expected {PLAYERS} in total",
        result.winners.len(),
        result.participants.len()
    );

    let winner = &result.winners[0].participant.id;
    check!(donors.contains(winner), "winner {winner} never donated to prize {prize_id}");
    check!(
        result.participants.iter().all(|p| &p.participant.id != winner),
        "winner {winner} also listed among the other participants"
    );

    for player in result.winners.iter().chain(&result.participants) {
        expect_consistent(player, prize.ticket_cost)?;
    }
    Ok(())
}

async fn play_missing(ctx: ScenarioContext) -> HarnessResult<()> {
    let raffle_id = ctx.fixtures.create_raffle().await?.id;
    let response = ctx.api.prizes.play_raw(&raffle_id, &FixtureData::missing_id()).await?;
    expect_not_found(&response, PLAY_NOT_FOUND)
}
