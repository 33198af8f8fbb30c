//! Participant operations, scoped by raffle

use std::sync::Arc;

use super::paths;
use crate::client::{json_body, ApiResponse, RequestExecutor};
use crate::error::HarnessResult;
use crate::model::{Participant, ParticipantRequest, ResponseId};

pub const UPDATE_NOT_FOUND: &str = "get participant";
pub const DELETE_NOT_FOUND: &str = "deleting participant";

#[derive(Clone)]
pub struct ParticipantController {
    http: Arc<dyn RequestExecutor>,
}

impl ParticipantController {
    pub fn new(http: Arc<dyn RequestExecutor>) -> Self {
        Self { http }
    }

    pub async fn list(&self, raffle_id: &str) -> HarnessResult<Vec<Participant>> {
        self.list_raw(raffle_id).await?.expect_ok()?.items()
    }

    pub async fn list_raw(&self, raffle_id: &str) -> HarnessResult<ApiResponse> {
        self.http.get(&paths::participants(raffle_id)).await
    }

    pub async fn find(
        &self,
        raffle_id: &str,
        participant_id: &str,
    ) -> HarnessResult<Option<Participant>> {
        Ok(self
            .list(raffle_id)
            .await?
            .into_iter()
            .find(|p| p.id == participant_id))
    }

    pub async fn create(
        &self,
        raffle_id: &str,
        participant: &ParticipantRequest,
    ) -> HarnessResult<ResponseId> {
        self.create_raw(raffle_id, participant).await?.expect_ok()?.response_id()
    }

    pub async fn create_raw(
        &self,
        raffle_id: &str,
        participant: &ParticipantRequest,
    ) -> HarnessResult<ApiResponse> {
        self.http
            .post(&paths::participants(raffle_id), json_body(participant)?)
            .await
    }

    pub async fn update(
        &self,
        raffle_id: &str,
        participant_id: &str,
        participant: &ParticipantRequest,
    ) -> HarnessResult<()> {
        self.update_raw(raffle_id, participant_id, participant)
            .await?
            .expect_ok()?;
        Ok(())
    }

    pub async fn update_raw(
        &self,
        raffle_id: &str,
        participant_id: &str,
        participant: &ParticipantRequest,
    ) -> HarnessResult<ApiResponse> {
        self.http
            .put(&paths::participant(raffle_id, participant_id), json_body(participant)?)
            .await
    }

    pub async fn delete(&self, raffle_id: &str, participant_id: &str) -> HarnessResult<()> {
        self.delete_raw(raffle_id, participant_id).await?.expect_ok()?;
        Ok(())
    }

    pub async fn delete_raw(
        &self,
        raffle_id: &str,
        participant_id: &str,
    ) -> HarnessResult<ApiResponse> {
        self.http
            .delete(&paths::participant(raffle_id, participant_id))
            .await
    }
}
