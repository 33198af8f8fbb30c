//! Raffle operations

use base64::Engine;
use std::sync::Arc;

use super::paths;
use crate::client::{json_body, ApiResponse, RequestExecutor};
use crate::error::HarnessResult;
use crate::model::{Raffle, RaffleExport, RaffleRequest, ResponseId};

/// Not-found operation reported when updating an unknown raffle
pub const UPDATE_NOT_FOUND: &str = "get raffle";
/// Not-found operation reported when deleting an unknown raffle
pub const DELETE_NOT_FOUND: &str = "deleting raffle";

#[derive(Clone)]
pub struct RaffleController {
    http: Arc<dyn RequestExecutor>,
}

impl RaffleController {
    pub fn new(http: Arc<dyn RequestExecutor>) -> Self {
        Self { http }
    }

    pub async fn list(&self) -> HarnessResult<Vec<Raffle>> {
        self.list_raw().await?.expect_ok()?.items()
    }

    pub async fn list_raw(&self) -> HarnessResult<ApiResponse> {
        self.http.get(paths::RAFFLES).await
    }

    /// List, then pick the raffle with this id
    pub async fn find(&self, raffle_id: &str) -> HarnessResult<Option<Raffle>> {
        Ok(self.list().await?.into_iter().find(|r| r.id == raffle_id))
    }

    pub async fn create(&self, raffle: &RaffleRequest) -> HarnessResult<ResponseId> {
        self.create_raw(raffle).await?.expect_ok()?.response_id()
    }

    pub async fn create_raw(&self, raffle: &RaffleRequest) -> HarnessResult<ApiResponse> {
        self.http.post(paths::RAFFLES, json_body(raffle)?).await
    }

    pub async fn update(&self, raffle_id: &str, raffle: &RaffleRequest) -> HarnessResult<()> {
        self.update_raw(raffle_id, raffle).await?.expect_ok()?;
        Ok(())
    }

    pub async fn update_raw(
        &self,
        raffle_id: &str,
        raffle: &RaffleRequest,
    ) -> HarnessResult<ApiResponse> {
        self.http.put(&paths::raffle(raffle_id), json_body(raffle)?).await
    }

    pub async fn delete(&self, raffle_id: &str) -> HarnessResult<()> {
        self.delete_raw(raffle_id).await?.expect_ok()?;
        Ok(())
    }

    pub async fn delete_raw(&self, raffle_id: &str) -> HarnessResult<ApiResponse> {
        self.http.delete(&paths::raffle(raffle_id)).await
    }

    /// Download the spreadsheet export of a raffle
    pub async fn download(&self, raffle_id: &str) -> HarnessResult<RaffleExport> {
        let response = self.download_raw(raffle_id).await?.expect_ok()?;
        decode_export(&response)
    }

    pub async fn download_raw(&self, raffle_id: &str) -> HarnessResult<ApiResponse> {
        self.http.get(&paths::raffle_export(raffle_id)).await
    }
}

/// The export body is the file encoded as a JSON base64 string; the file
/// name travels in `Content-Disposition`.
pub fn decode_export(response: &ApiResponse) -> HarnessResult<RaffleExport> {
    let encoded: String = response.json()?;
    let content = base64::engine::general_purpose::STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| response.payload_error(format!("export is not base64: {e}")))?;

    let file_name = response
        .header("content-disposition")
        .and_then(|value| value.split("filename=").nth(1))
        .map(|name| name.trim().trim_matches('"').to_string())
        .filter(|name| !name.is_empty());

    Ok(RaffleExport { file_name, content })
}
