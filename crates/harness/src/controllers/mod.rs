//! Typed resource controllers
//!
//! Every operation comes in two flavours: the plain one asserts the success
//! status and decodes the payload, the `*_raw` one hands back the
//! [`ApiResponse`](crate::client::ApiResponse) untouched for negative-path
//! checks.

pub mod donation;
pub mod participant;
pub mod prize;
pub mod raffle;

use std::sync::Arc;

use crate::client::RequestExecutor;

pub use donation::DonationController;
pub use participant::ParticipantController;
pub use prize::PrizeController;
pub use raffle::RaffleController;

/// Path layout of the API. Everything below a raffle is prefixed by its id.
pub mod paths {
    pub const RAFFLES: &str = "/api/raffles";

    pub fn raffle(raffle_id: &str) -> String {
        format!("{RAFFLES}/{raffle_id}")
    }

    pub fn raffle_export(raffle_id: &str) -> String {
        format!("{}/download-xlsx", raffle(raffle_id))
    }

    pub fn participants(raffle_id: &str) -> String {
        format!("{}/participants", raffle(raffle_id))
    }

    pub fn participant(raffle_id: &str, participant_id: &str) -> String {
        format!("{}/{participant_id}", participants(raffle_id))
    }

    pub fn prizes(raffle_id: &str) -> String {
        format!("{}/prizes", raffle(raffle_id))
    }

    pub fn prize(raffle_id: &str, prize_id: &str) -> String {
        format!("{}/{prize_id}", prizes(raffle_id))
    }

    pub fn prize_play(raffle_id: &str, prize_id: &str) -> String {
        format!("{}/play", prize(raffle_id, prize_id))
    }

    pub fn donations(raffle_id: &str, prize_id: &str) -> String {
        format!("{}/donations", prize(raffle_id, prize_id))
    }

    pub fn donation(raffle_id: &str, prize_id: &str, donation_id: &str) -> String {
        format!("{}/{donation_id}", donations(raffle_id, prize_id))
    }
}

/// All four controllers sharing one executor
#[derive(Clone)]
pub struct Controllers {
    pub raffles: RaffleController,
    pub participants: ParticipantController,
    pub prizes: PrizeController,
    pub donations: DonationController,
}

impl Controllers {
    pub fn new(http: Arc<dyn RequestExecutor>) -> Self {
        Self {
            raffles: RaffleController::new(http.clone()),
            participants: ParticipantController::new(http.clone()),
            prizes: PrizeController::new(http.clone()),
            donations: DonationController::new(http),
        }
    }
}
