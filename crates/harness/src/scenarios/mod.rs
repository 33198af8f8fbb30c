//! The scenario catalogue
//!
//! Every scenario creates the entities it needs under fresh identifiers,
//! so any subset can run in parallel against one shared service.

use crate::runner::Scenario;

/// Register an `async fn(ScenarioContext) -> HarnessResult<()>` as a [`Scenario`]
macro_rules! scenario {
    ($name:literal, [$($tag:literal),* $(,)?], $body:path $(,)?) => {
        $crate::runner::Scenario {
            name: $name,
            tags: &[$($tag),*],
            run: |ctx| ::futures::FutureExt::boxed($body(ctx)),
        }
    };
}

pub mod donation;
pub mod isolation;
pub mod participant;
pub mod prize;
pub mod raffle;

/// All scenarios, grouped by entity
pub fn catalogue() -> Vec<Scenario> {
    let mut all = Vec::new();
    all.extend_from_slice(raffle::SCENARIOS);
    all.extend_from_slice(participant::SCENARIOS);
    all.extend_from_slice(prize::SCENARIOS);
    all.extend_from_slice(donation::SCENARIOS);
    all.extend_from_slice(isolation::SCENARIOS);
    all
}
