//! Shared helpers for the integration tests

#![allow(dead_code)]

pub mod stub_service;

use std::sync::Arc;

use raffle_harness::{HarnessConfig, RequestClient, RequestExecutor};

pub use stub_service::{spawn_stub_service, StubService};

/// A config pointing the harness at `port` on localhost
pub fn config_for(port: u16) -> HarnessConfig {
    HarnessConfig {
        host: "127.0.0.1".into(),
        port,
        ..HarnessConfig::default()
    }
}

/// A real reqwest-backed executor talking to the stub
pub fn executor_for(stub: &StubService) -> Arc<dyn RequestExecutor> {
    let client = RequestClient::from_config(&config_for(stub.port())).expect("client builds");
    Arc::new(client)
}
