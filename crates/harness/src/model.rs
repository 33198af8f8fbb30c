//! Wire types of the raffle API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Acknowledgement of a create call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseId {
    pub id: String,
}

/// Collection responses wrap their items under a single `items` key.
///
/// The key is mandatory; only its value may be `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Items<T> {
    #[serde(deserialize_with = "null_as_empty")]
    pub items: Vec<T>,
}

/// The service encodes empty slices as `null`
pub fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Raffle {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub organizer_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaffleRequest {
    pub name: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRequest {
    pub name: String,
    pub phone: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prize {
    pub id: String,
    pub name: String,
    pub ticket_cost: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrizeRequest {
    pub name: String,
    pub ticket_cost: i64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: String,
    #[serde(default)]
    pub prize_id: String,
    pub participant_id: String,
    pub amount: i64,
    pub tickets_number: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    pub amount: i64,
    pub participant_id: String,
}

/// Result of `GET .../prizes/{id}/play`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizePlayResult {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub winners: Vec<PlayParticipant>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub participants: Vec<PlayParticipant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayParticipant {
    pub participant: Participant,
    pub total_donation: i64,
    pub total_tickets_number: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub donations: Vec<Donation>,
}

/// Spreadsheet export of a raffle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaffleExport {
    pub file_name: Option<String>,
    pub content: Vec<u8>,
}
