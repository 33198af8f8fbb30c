//! Raffle lifecycle and validation

use crate::check;
use crate::contract::{expect_not_found, expect_validation, ValidationFailure};
use crate::controllers::raffle::{DELETE_NOT_FOUND, UPDATE_NOT_FOUND};
use crate::error::{HarnessError, HarnessResult};
use crate::fixtures::{FixtureData, TEXT_LEN};
use crate::model::{Raffle, RaffleRequest};
use crate::runner::{Scenario, ScenarioContext};

pub const SCENARIOS: &[Scenario] = &[
    scenario!("raffle: create valid", ["raffle", "smoke"], create_valid),
    scenario!("raffle: create with invalid name", ["raffle", "validation"], create_invalid_name),
    scenario!("raffle: create with invalid note", ["raffle", "validation"], create_invalid_note),
    scenario!(
        "raffle: create with invalid name and note",
        ["raffle", "validation"],
        create_invalid_name_and_note,
    ),
    scenario!("raffle: update valid", ["raffle"], update_valid),
    scenario!("raffle: update with invalid fields", ["raffle", "validation"], update_invalid),
    scenario!("raffle: update missing", ["raffle", "not-found"], update_missing),
    scenario!("raffle: delete", ["raffle"], delete),
    scenario!("raffle: delete missing", ["raffle", "not-found"], delete_missing),
    scenario!("raffle: delete twice", ["raffle", "not-found"], delete_twice),
    scenario!("raffle: create, list, delete", ["raffle", "smoke"], create_list_delete),
    scenario!("raffle: download export", ["raffle", "export"], download_export),
];

fn name_failure(rule: &str) -> ValidationFailure {
    ValidationFailure::new("RaffleRequest", "Name", rule)
}

fn note_failure(rule: &str) -> ValidationFailure {
    ValidationFailure::new("RaffleRequest", "Note", rule)
}

fn expect_stored(raffle: Option<Raffle>, id: &str, request: &RaffleRequest) -> HarnessResult<()> {
    let Some(raffle) = raffle else {
        return Err(HarnessError::Assertion(format!("raffle {id} not listed")));
    };
    check!(
        raffle.name == request.name,
        "raffle {id} name {:?}, expected {:?}",
        raffle.name,
        request.name,
    );
    check!(
        raffle.note == request.note,
        "raffle {id} note {:?}, expected {:?}",
        raffle.note,
        request.note,
    );
    Ok(())
}

async fn create_valid(ctx: ScenarioContext) -> HarnessResult<()> {
    let request = FixtureData::raffle_request();
    let id = ctx.api.raffles.create(&request).await?.id;
    expect_stored(ctx.api.raffles.find(&id).await?, &id, &request)
}

async fn create_invalid_name(ctx: ScenarioContext) -> HarnessResult<()> {
    let request = RaffleRequest {
        name: FixtureData::invalid_text(TEXT_LEN),
        ..FixtureData::raffle_request()
    };
    let response = ctx.api.raffles.create_raw(&request).await?;
    expect_validation(&response, &[name_failure("charsValidation")])
}

async fn create_invalid_note(ctx: ScenarioContext) -> HarnessResult<()> {
    let request = RaffleRequest {
        note: FixtureData::invalid_text(TEXT_LEN),
        ..FixtureData::raffle_request()
    };
    let response = ctx.api.raffles.create_raw(&request).await?;
    expect_validation(&response, &[note_failure("charsValidation")])
}

async fn create_invalid_name_and_note(ctx: ScenarioContext) -> HarnessResult<()> {
    let request = RaffleRequest {
        name: FixtureData::invalid_text(TEXT_LEN),
        note: FixtureData::invalid_text(TEXT_LEN),
    };
    let response = ctx.api.raffles.create_raw(&request).await?;
    expect_validation(
        &response,
        &[name_failure("charsValidation"), note_failure("charsValidation")],
    )
}

async fn update_valid(ctx: ScenarioContext) -> HarnessResult<()> {
    let id = ctx.fixtures.create_raffle().await?.id;
    let update = FixtureData::raffle_request();
    ctx.api.raffles.update(&id, &update).await?;
    expect_stored(ctx.api.raffles.find(&id).await?, &id, &update)
}

async fn update_invalid(ctx: ScenarioContext) -> HarnessResult<()> {
    let original = FixtureData::raffle_request();
    let id = ctx.api.raffles.create(&original).await?.id;

    let bad_name = RaffleRequest {
        name: FixtureData::invalid_text(TEXT_LEN),
        ..FixtureData::raffle_request()
    };
    let response = ctx.api.raffles.update_raw(&id, &bad_name).await?;
    expect_validation(&response, &[name_failure("charsValidation")])?;

    let bad_both = RaffleRequest {
        name: FixtureData::invalid_text(TEXT_LEN),
        note: FixtureData::invalid_text(TEXT_LEN),
    };
    let response = ctx.api.raffles.update_raw(&id, &bad_both).await?;
    expect_validation(
        &response,
        &[name_failure("charsValidation"), note_failure("charsValidation")],
    )?;

    let no_name = RaffleRequest {
        name: String::new(),
        ..FixtureData::raffle_request()
    };
    let response = ctx.api.raffles.update_raw(&id, &no_name).await?;
    expect_validation(&response, &[name_failure("required")])?;

    expect_stored(ctx.api.raffles.find(&id).await?, &id, &original)
}

async fn update_missing(ctx: ScenarioContext) -> HarnessResult<()> {
    let response = ctx
        .api
        .raffles
        .update_raw(&FixtureData::missing_id(), &FixtureData::raffle_request())
        .await?;
    expect_not_found(&response, UPDATE_NOT_FOUND)
}

async fn delete(ctx: ScenarioContext) -> HarnessResult<()> {
    let id = ctx.fixtures.create_raffle().await?.id;
    ctx.api.raffles.delete(&id).await?;
    check!(ctx.api.raffles.find(&id).await?.is_none(), "raffle {id} still listed after delete");
    Ok(())
}

async fn delete_missing(ctx: ScenarioContext) -> HarnessResult<()> {
    let response = ctx.api.raffles.delete_raw(&FixtureData::missing_id()).await?;
    expect_not_found(&response, DELETE_NOT_FOUND)
}

async fn delete_twice(ctx: ScenarioContext) -> HarnessResult<()> {
    let id = ctx.fixtures.create_raffle().await?.id;
    ctx.api.raffles.delete(&id).await?;
    let response = ctx.api.raffles.delete_raw(&id).await?;
    expect_not_found(&response, DELETE_NOT_FOUND)
}

async fn create_list_delete(ctx: ScenarioContext) -> HarnessResult<()> {
    let request = RaffleRequest {
        name: "abc12".into(),
        note: "xyz34".into(),
    };
    let id = ctx.api.raffles.create(&request).await?.id;

    let mut listed: Vec<Raffle> = ctx
        .api
        .raffles
        .list()
        .await?
        .into_iter()
        .filter(|r| r.id == id)
        .collect();
    check!(listed.len() == 1, "raffle {id} listed {} times", listed.len());
    expect_stored(listed.pop(), &id, &request)?;

    ctx.api.raffles.delete(&id).await?;
    let listed = ctx.api.raffles.list().await?;
    check!(listed.iter().all(|r| r.id != id), "raffle {id} still listed after delete");
    Ok(())
}

async fn download_export(ctx: ScenarioContext) -> HarnessResult<()> {
    let graph = ctx.fixtures.raffle_with_prize_and_participant().await?;
    ctx.fixtures
        .create_donation(&graph.raffle_id, &graph.prize_id, &graph.participant_id)
        .await?;

    let export = ctx.api.raffles.download(&graph.raffle_id).await?;
    check!(!export.content.is_empty(), "export of raffle {} is empty", graph.raffle_id);
    check!(export.file_name.is_some(), "export of raffle {} has no file name", graph.raffle_id);
    Ok(())
}
