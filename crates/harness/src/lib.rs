//! Raffle API Verification Harness
//!
//! Black-box end-to-end checks for the raffle HTTP service:
//! - Launches the service as a child process and waits for its port
//! - Drives the REST API through typed per-entity controllers
//! - Asserts the validation and not-found contracts of the service
//! - Runs independent scenarios in parallel against one shared instance
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  run_suite (one per run)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ServiceGuard ── ProcessSupervisor                          │
//! │    ├── spawn(program, args, working_dir)                    │
//! │    ├── probe::wait_for_port(host, port)                     │
//! │    └── stop(): descendants (ps) → SIGTERM → SIGKILL         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ScenarioRunner (buffer_unordered(workers))                 │
//! │    └── Scenario(ScenarioContext)                            │
//! │          ├── FixtureSteps / FixtureData                     │
//! │          ├── Controllers: raffles, participants,            │
//! │          │                prizes, donations                 │
//! │          └── contract: expect_validation, expect_not_found  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  RequestExecutor (trait) ── RequestClient (reqwest)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod error;

pub mod client;
pub mod config;
pub mod contract;
pub mod controllers;
pub mod fixtures;
pub mod model;
pub mod probe;
pub mod proctree;
pub mod runner;
pub mod scenarios;
pub mod supervisor;

pub use client::{ApiResponse, RequestClient, RequestExecutor};
pub use config::HarnessConfig;
pub use controllers::Controllers;
pub use error::{HarnessError, HarnessResult};
pub use fixtures::{FixtureData, FixtureSteps};
pub use runner::{run_suite, Scenario, ScenarioContext, ScenarioRunner, SuiteResult};
pub use supervisor::{LaunchSpec, ProcessSupervisor, ServiceGuard, SupervisorState};
