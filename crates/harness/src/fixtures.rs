//! Fixture data and composite setup steps
//!
//! [`FixtureData`] is the one place that knows what the service accepts.
//! If its validation rules change, only this file changes.

use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::controllers::Controllers;
use crate::error::HarnessResult;
use crate::model::{DonationRequest, ParticipantRequest, PrizeRequest, RaffleRequest, ResponseId};

/// Length of generated names and notes
pub const TEXT_LEN: usize = 5;

/// Country prefix every accepted phone number starts with
pub const PHONE_PREFIX: &str = "+380";

/// Characters outside the service's allowed set (letters, digits,
/// `!@#$%^&*()_{}[]:;<>,.?~` and Ukrainian Cyrillic)
const DISALLOWED_CHARS: &[char] = &['`', '|', '\\', '/', '+', '=', '§', '±', '€', '¤'];

/// Randomized values that satisfy (or deliberately violate) the service rules
pub struct FixtureData;

impl FixtureData {
    /// Random ASCII letters and digits
    pub fn alphanumeric(len: usize) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    /// Text the service rejects with `charsValidation`
    pub fn invalid_text(len: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..len.max(1))
            .filter_map(|_| DISALLOWED_CHARS.choose(&mut rng).copied())
            .collect()
    }

    /// `+380` followed by 9 or 10 digits
    pub fn phone() -> String {
        let mut rng = rand::thread_rng();
        let digits: u64 = if rng.gen_bool(0.5) {
            rng.gen_range(100_000_000..1_000_000_000)
        } else {
            rng.gen_range(1_000_000_000..10_000_000_000)
        };
        format!("{PHONE_PREFIX}{digits}")
    }

    /// A phone number the service rejects with `phoneValidation`
    pub fn invalid_phone() -> String {
        Self::alphanumeric(3)
    }

    /// Positive ticket cost
    pub fn ticket_cost() -> i64 {
        rand::thread_rng().gen_range(1..=100)
    }

    /// An amount buying exactly `tickets` tickets at `cost`, with change left over
    pub fn amount_for(cost: i64, tickets: i64) -> i64 {
        let change = if cost > 1 {
            rand::thread_rng().gen_range(0..cost)
        } else {
            0
        };
        cost * tickets + change
    }

    /// Identifier no entity has; used to probe not-found handling
    pub fn missing_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn raffle_request() -> RaffleRequest {
        RaffleRequest {
            name: Self::alphanumeric(TEXT_LEN),
            note: Self::alphanumeric(TEXT_LEN),
        }
    }

    pub fn participant_request() -> ParticipantRequest {
        ParticipantRequest {
            name: Self::alphanumeric(TEXT_LEN),
            phone: Self::phone(),
            note: Self::alphanumeric(TEXT_LEN),
        }
    }

    pub fn prize_request() -> PrizeRequest {
        PrizeRequest {
            name: Self::alphanumeric(TEXT_LEN),
            ticket_cost: Self::ticket_cost(),
            description: Self::alphanumeric(TEXT_LEN),
        }
    }

    pub fn donation_request(participant_id: &str, amount: i64) -> DonationRequest {
        DonationRequest {
            amount,
            participant_id: participant_id.to_string(),
        }
    }
}

/// Ids of a raffle holding one prize and one participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaffleGraph {
    pub raffle_id: String,
    pub prize_id: String,
    pub participant_id: String,
}

/// Create ready-to-use entity graphs through the validating controllers
#[derive(Clone)]
pub struct FixtureSteps {
    api: Controllers,
}

impl FixtureSteps {
    pub fn new(api: Controllers) -> Self {
        Self { api }
    }

    pub async fn create_raffle(&self) -> HarnessResult<ResponseId> {
        let id = self.api.raffles.create(&FixtureData::raffle_request()).await?;
        debug!("Fixture raffle {}", id.id);
        Ok(id)
    }

    pub async fn create_participant(&self, raffle_id: &str) -> HarnessResult<ResponseId> {
        self.api
            .participants
            .create(raffle_id, &FixtureData::participant_request())
            .await
    }

    pub async fn create_prize(&self, raffle_id: &str) -> HarnessResult<ResponseId> {
        self.api
            .prizes
            .create(raffle_id, &FixtureData::prize_request())
            .await
    }

    /// Donate an amount worth a few tickets of the prize
    pub async fn create_donation(
        &self,
        raffle_id: &str,
        prize_id: &str,
        participant_id: &str,
    ) -> HarnessResult<ResponseId> {
        let prize = self.api.prizes.get(raffle_id, prize_id).await?;
        let tickets = rand::thread_rng().gen_range(1..=5);
        let request = FixtureData::donation_request(
            participant_id,
            FixtureData::amount_for(prize.ticket_cost, tickets),
        );
        self.api.donations.create(raffle_id, prize_id, &request).await
    }

    pub async fn raffle_with_prize_and_participant(&self) -> HarnessResult<RaffleGraph> {
        let raffle_id = self.create_raffle().await?.id;
        let prize_id = self.create_prize(&raffle_id).await?.id;
        let participant_id = self.create_participant(&raffle_id).await?.id;
        Ok(RaffleGraph {
            raffle_id,
            prize_id,
            participant_id,
        })
    }
}
