//! Prize operations, scoped by raffle

use std::sync::Arc;

use super::paths;
use crate::client::{json_body, ApiResponse, RequestExecutor};
use crate::error::HarnessResult;
use crate::model::{Prize, PrizePlayResult, PrizeRequest, ResponseId};

pub const GET_NOT_FOUND: &str = "get prize";
pub const UPDATE_NOT_FOUND: &str = "get prize";
pub const DELETE_NOT_FOUND: &str = "deleting prize";
pub const PLAY_NOT_FOUND: &str = "get prize to play";

#[derive(Clone)]
pub struct PrizeController {
    http: Arc<dyn RequestExecutor>,
}

impl PrizeController {
    pub fn new(http: Arc<dyn RequestExecutor>) -> Self {
        Self { http }
    }

    pub async fn list(&self, raffle_id: &str) -> HarnessResult<Vec<Prize>> {
        self.list_raw(raffle_id).await?.expect_ok()?.items()
    }

    pub async fn list_raw(&self, raffle_id: &str) -> HarnessResult<ApiResponse> {
        self.http.get(&paths::prizes(raffle_id)).await
    }

    pub async fn find(&self, raffle_id: &str, prize_id: &str) -> HarnessResult<Option<Prize>> {
        Ok(self.list(raffle_id).await?.into_iter().find(|p| p.id == prize_id))
    }

    pub async fn get(&self, raffle_id: &str, prize_id: &str) -> HarnessResult<Prize> {
        self.get_raw(raffle_id, prize_id).await?.expect_ok()?.json()
    }

    pub async fn get_raw(&self, raffle_id: &str, prize_id: &str) -> HarnessResult<ApiResponse> {
        self.http.get(&paths::prize(raffle_id, prize_id)).await
    }

    pub async fn create(&self, raffle_id: &str, prize: &PrizeRequest) -> HarnessResult<ResponseId> {
        self.create_raw(raffle_id, prize).await?.expect_ok()?.response_id()
    }

    pub async fn create_raw(
        &self,
        raffle_id: &str,
        prize: &PrizeRequest,
    ) -> HarnessResult<ApiResponse> {
        self.http.post(&paths::prizes(raffle_id), json_body(prize)?).await
    }

    pub async fn update(
        &self,
        raffle_id: &str,
        prize_id: &str,
        prize: &PrizeRequest,
    ) -> HarnessResult<()> {
        self.update_raw(raffle_id, prize_id, prize).await?.expect_ok()?;
        Ok(())
    }

    pub async fn update_raw(
        &self,
        raffle_id: &str,
        prize_id: &str,
        prize: &PrizeRequest,
    ) -> HarnessResult<ApiResponse> {
        self.http
            .put(&paths::prize(raffle_id, prize_id), json_body(prize)?)
            .await
    }

    pub async fn delete(&self, raffle_id: &str, prize_id: &str) -> HarnessResult<()> {
        self.delete_raw(raffle_id, prize_id).await?.expect_ok()?;
        Ok(())
    }

    pub async fn delete_raw(&self, raffle_id: &str, prize_id: &str) -> HarnessResult<ApiResponse> {
        self.http.delete(&paths::prize(raffle_id, prize_id)).await
    }

    /// Draw the prize among the participants who donated to it
    pub async fn play(&self, raffle_id: &str, prize_id: &str) -> HarnessResult<PrizePlayResult> {
        self.play_raw(raffle_id, prize_id).await?.expect_ok()?.json()
    }

    pub async fn play_raw(&self, raffle_id: &str, prize_id: &str) -> HarnessResult<ApiResponse> {
        self.http.get(&paths::prize_play(raffle_id, prize_id)).await
    }
}
