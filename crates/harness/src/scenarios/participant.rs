//! Participant lifecycle, validation and phone format rules

use crate::check;
use crate::contract::{expect_not_found, expect_validation, ValidationFailure};
use crate::controllers::participant::{DELETE_NOT_FOUND, UPDATE_NOT_FOUND};
use crate::error::{HarnessError, HarnessResult};
use crate::fixtures::{FixtureData, TEXT_LEN};
use crate::model::ParticipantRequest;
use crate::runner::{Scenario, ScenarioContext};

pub const SCENARIOS: &[Scenario] = &[
    scenario!("participant: create valid", ["participant", "smoke"], create_valid),
    scenario!(
        "participant: create with invalid name",
        ["participant", "validation"],
        create_invalid_name,
    ),
    scenario!(
        "participant: create with invalid note",
        ["participant", "validation"],
        create_invalid_note,
    ),
    scenario!(
        "participant: create with empty phone",
        ["participant", "validation"],
        create_empty_phone,
    ),
    scenario!(
        "participant: create with malformed phone",
        ["participant", "validation"],
        create_malformed_phone,
    ),
    scenario!("participant: update valid", ["participant"], update_valid),
    scenario!(
        "participant: rejected update keeps stored values",
        ["participant", "validation"],
        update_invalid_keeps_values,
    ),
    scenario!("participant: update missing", ["participant", "not-found"], update_missing),
    scenario!("participant: delete", ["participant"], delete),
    scenario!(
        "participant: delete under wrong raffle",
        ["participant", "not-found"],
        delete_wrong_raffle,
    ),
    scenario!("participant: delete missing", ["participant", "not-found"], delete_missing),
];

fn failure(field: &str, rule: &str) -> ValidationFailure {
    ValidationFailure::new("ParticipantRequest", field, rule)
}

async fn expect_stored(
    ctx: &ScenarioContext,
    raffle_id: &str,
    participant_id: &str,
    expected: &ParticipantRequest,
) -> HarnessResult<()> {
    let Some(stored) = ctx.api.participants.find(raffle_id, participant_id).await? else {
        return Err(HarnessError::Assertion(format!(
            "participant {participant_id} not listed in raffle {raffle_id}"
        )));
    };
    check!(
        stored.name == expected.name,
        "participant name {:?}, expected {:?}",
        stored.name,
        expected.name,
    );
    check!(
        stored.phone == expected.phone,
        "participant phone {:?}, expected {:?}",
        stored.phone,
        expected.phone,
    );
    check!(
        stored.note == expected.note,
        "participant note {:?}, expected {:?}",
        stored.note,
        expected.note,
    );
    Ok(())
}

/// Create a participant under a fresh raffle with `request`, expecting `failures`
async fn rejected_create(
    ctx: &ScenarioContext,
    request: ParticipantRequest,
    failures: &[ValidationFailure],
) -> HarnessResult<()> {
    let raffle_id = ctx.fixtures.create_raffle().await?.id;
    let response = ctx.api.participants.create_raw(&raffle_id, &request).await?;
    expect_validation(&response, failures)?;

    let listed = ctx.api.participants.list(&raffle_id).await?;
    check!(listed.is_empty(), "rejected participant was stored in raffle {raffle_id}");
    Ok(())
}

async fn create_valid(ctx: ScenarioContext) -> HarnessResult<()> {
    let raffle_id = ctx.fixtures.create_raffle().await?.id;
    let request = FixtureData::participant_request();
    let id = ctx.api.participants.create(&raffle_id, &request).await?.id;
    expect_stored(&ctx, &raffle_id, &id, &request).await
}

async fn create_invalid_name(ctx: ScenarioContext) -> HarnessResult<()> {
    let request = ParticipantRequest {
        name: FixtureData::invalid_text(TEXT_LEN),
        ..FixtureData::participant_request()
    };
    rejected_create(&ctx, request, &[failure("Name", "charsValidation")]).await
}

async fn create_invalid_note(ctx: ScenarioContext) -> HarnessResult<()> {
    let request = ParticipantRequest {
        note: FixtureData::invalid_text(TEXT_LEN),
        ..FixtureData::participant_request()
    };
    rejected_create(&ctx, request, &[failure("Note", "charsValidation")]).await
}

async fn create_empty_phone(ctx: ScenarioContext) -> HarnessResult<()> {
    let request = ParticipantRequest {
        phone: String::new(),
        ..FixtureData::participant_request()
    };
    rejected_create(&ctx, request, &[failure("Phone", "required")]).await
}

async fn create_malformed_phone(ctx: ScenarioContext) -> HarnessResult<()> {
    let request = ParticipantRequest {
        phone: FixtureData::invalid_phone(),
        ..FixtureData::participant_request()
    };
    rejected_create(&ctx, request, &[failure("Phone", "phoneValidation")]).await
}

async fn update_valid(ctx: ScenarioContext) -> HarnessResult<()> {
    let raffle_id = ctx.fixtures.create_raffle().await?.id;
    let id = ctx.fixtures.create_participant(&raffle_id).await?.id;

    let update = FixtureData::participant_request();
    ctx.api.participants.update(&raffle_id, &id, &update).await?;
    expect_stored(&ctx, &raffle_id, &id, &update).await
}

async fn update_invalid_keeps_values(ctx: ScenarioContext) -> HarnessResult<()> {
    let raffle_id = ctx.fixtures.create_raffle().await?.id;
    let original = FixtureData::participant_request();
    let id = ctx.api.participants.create(&raffle_id, &original).await?.id;

    let attempts = [
        (
            ParticipantRequest {
                name: FixtureData::invalid_text(TEXT_LEN),
                ..FixtureData::participant_request()
            },
            failure("Name", "charsValidation"),
        ),
        (
            ParticipantRequest {
                note: FixtureData::invalid_text(TEXT_LEN),
                ..FixtureData::participant_request()
            },
            failure("Note", "charsValidation"),
        ),
        (
            ParticipantRequest {
                phone: FixtureData::invalid_phone(),
                ..FixtureData::participant_request()
            },
            failure("Phone", "phoneValidation"),
        ),
        (
            ParticipantRequest {
                phone: String::new(),
                ..FixtureData::participant_request()
            },
            failure("Phone", "required"),
        ),
    ];

    for (request, expected) in attempts {
        let response = ctx.api.participants.update_raw(&raffle_id, &id, &request).await?;
        expect_validation(&response, &[expected])?;
    }

    expect_stored(&ctx, &raffle_id, &id, &original).await
}

async fn update_missing(ctx: ScenarioContext) -> HarnessResult<()> {
    let raffle_id = ctx.fixtures.create_raffle().await?.id;
    let response = ctx
        .api
        .participants
        .update_raw(&raffle_id, &FixtureData::missing_id(), &FixtureData::participant_request())
        .await?;
    expect_not_found(&response, UPDATE_NOT_FOUND)
}

async fn delete(ctx: ScenarioContext) -> HarnessResult<()> {
    let raffle_id = ctx.fixtures.create_raffle().await?.id;
    let id = ctx.fixtures.create_participant(&raffle_id).await?.id;

    ctx.api.participants.delete(&raffle_id, &id).await?;
    check!(
        ctx.api.participants.find(&raffle_id, &id).await?.is_none(),
        "participant {id} still listed after delete"
    );
    Ok(())
}

async fn delete_wrong_raffle(ctx: ScenarioContext) -> HarnessResult<()> {
    let raffle_id = ctx.fixtures.create_raffle().await?.id;
    let other_raffle_id = ctx.fixtures.create_raffle().await?.id;
    let id = ctx.fixtures.create_participant(&raffle_id).await?.id;

    let response = ctx.api.participants.delete_raw(&other_raffle_id, &id).await?;
    expect_not_found(&response, DELETE_NOT_FOUND)?;

    check!(
        ctx.api.participants.find(&raffle_id, &id).await?.is_some(),
        "participant {id} removed through another raffle"
    );
    Ok(())
}

async fn delete_missing(ctx: ScenarioContext) -> HarnessResult<()> {
    let raffle_id = ctx.fixtures.create_raffle().await?.id;
    let response = ctx
        .api
        .participants
        .delete_raw(&raffle_id, &FixtureData::missing_id())
        .await?;
    expect_not_found(&response, DELETE_NOT_FOUND)
}
