//! Donation operations, scoped by raffle and prize

use std::sync::Arc;

use super::paths;
use crate::client::{json_body, ApiResponse, RequestExecutor};
use crate::error::HarnessResult;
use crate::model::{Donation, DonationRequest, ResponseId};

pub const GET_NOT_FOUND: &str = "get donation";
pub const UPDATE_NOT_FOUND: &str = "get donation";
pub const DELETE_NOT_FOUND: &str = "deleting donation";
/// Reported when the donation references a participant the raffle lacks
pub const PARTICIPANT_NOT_FOUND: &str = "get participant";

#[derive(Clone)]
pub struct DonationController {
    http: Arc<dyn RequestExecutor>,
}

impl DonationController {
    pub fn new(http: Arc<dyn RequestExecutor>) -> Self {
        Self { http }
    }

    pub async fn list(&self, raffle_id: &str, prize_id: &str) -> HarnessResult<Vec<Donation>> {
        self.list_raw(raffle_id, prize_id).await?.expect_ok()?.items()
    }

    pub async fn list_raw(&self, raffle_id: &str, prize_id: &str) -> HarnessResult<ApiResponse> {
        self.http.get(&paths::donations(raffle_id, prize_id)).await
    }

    pub async fn find(
        &self,
        raffle_id: &str,
        prize_id: &str,
        donation_id: &str,
    ) -> HarnessResult<Option<Donation>> {
        Ok(self
            .list(raffle_id, prize_id)
            .await?
            .into_iter()
            .find(|d| d.id == donation_id))
    }

    pub async fn get(
        &self,
        raffle_id: &str,
        prize_id: &str,
        donation_id: &str,
    ) -> HarnessResult<Donation> {
        self.get_raw(raffle_id, prize_id, donation_id)
            .await?
            .expect_ok()?
            .json()
    }

    pub async fn get_raw(
        &self,
        raffle_id: &str,
        prize_id: &str,
        donation_id: &str,
    ) -> HarnessResult<ApiResponse> {
        self.http
            .get(&paths::donation(raffle_id, prize_id, donation_id))
            .await
    }

    pub async fn create(
        &self,
        raffle_id: &str,
        prize_id: &str,
        donation: &DonationRequest,
    ) -> HarnessResult<ResponseId> {
        self.create_raw(raffle_id, prize_id, donation)
            .await?
            .expect_ok()?
            .response_id()
    }

    pub async fn create_raw(
        &self,
        raffle_id: &str,
        prize_id: &str,
        donation: &DonationRequest,
    ) -> HarnessResult<ApiResponse> {
        self.http
            .post(&paths::donations(raffle_id, prize_id), json_body(donation)?)
            .await
    }

    pub async fn update(
        &self,
        raffle_id: &str,
        prize_id: &str,
        donation_id: &str,
        donation: &DonationRequest,
    ) -> HarnessResult<()> {
        self.update_raw(raffle_id, prize_id, donation_id, donation)
            .await?
            .expect_ok()?;
        Ok(())
    }

    pub async fn update_raw(
        &self,
        raffle_id: &str,
        prize_id: &str,
        donation_id: &str,
        donation: &DonationRequest,
    ) -> HarnessResult<ApiResponse> {
        self.http
            .put(
                &paths::donation(raffle_id, prize_id, donation_id),
                json_body(donation)?,
            )
            .await
    }

    pub async fn delete(
        &self,
        raffle_id: &str,
        prize_id: &str,
        donation_id: &str,
    ) -> HarnessResult<()> {
        self.delete_raw(raffle_id, prize_id, donation_id)
            .await?
            .expect_ok()?;
        Ok(())
    }

    pub async fn delete_raw(
        &self,
        raffle_id: &str,
        prize_id: &str,
        donation_id: &str,
    ) -> HarnessResult<ApiResponse> {
        self.http
            .delete(&paths::donation(raffle_id, prize_id, donation_id))
            .await
    }
}
