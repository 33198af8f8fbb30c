//! Scenario runner: bounded parallel execution against one shared service

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::client::RequestExecutor;
use crate::controllers::Controllers;
use crate::error::{HarnessError, HarnessResult};
use crate::fixtures::FixtureSteps;
use crate::supervisor::{LaunchSpec, ServiceGuard};

/// File name of the machine-readable run report
pub const RESULTS_FILE: &str = "test-results.json";

pub type ScenarioFn = fn(ScenarioContext) -> BoxFuture<'static, HarnessResult<()>>;

/// One independent end-to-end check
#[derive(Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub tags: &'static [&'static str],
    pub run: ScenarioFn,
}

impl Scenario {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| *t == tag)
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .finish()
    }
}

/// What a scenario gets to work with. Scenarios never see the supervisor.
#[derive(Clone)]
pub struct ScenarioContext {
    pub api: Controllers,
    pub fixtures: FixtureSteps,
}

impl ScenarioContext {
    pub fn new(executor: Arc<dyn RequestExecutor>) -> Self {
        let api = Controllers::new(executor);
        Self {
            fixtures: FixtureSteps::new(api.clone()),
            api,
        }
    }
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub tags: Vec<String>,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of running a batch of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

/// Keep scenarios carrying `tag` (if given) whose name contains `name` (if given)
pub fn filter(scenarios: &[Scenario], tag: Option<&str>, name: Option<&str>) -> Vec<Scenario> {
    scenarios
        .iter()
        .filter(|s| tag.map_or(true, |t| s.has_tag(t)))
        .filter(|s| name.map_or(true, |n| s.name.contains(n)))
        .copied()
        .collect()
}

/// Runs scenarios with at most `workers` in flight
pub struct ScenarioRunner {
    workers: usize,
    context: ScenarioContext,
}

impl ScenarioRunner {
    pub fn new(executor: Arc<dyn RequestExecutor>, workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            context: ScenarioContext::new(executor),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every scenario; results come back in input order
    pub async fn run(&self, scenarios: &[Scenario]) -> SuiteResult {
        let start = Instant::now();
        info!("Running {} scenario(s) on {} worker(s)...", scenarios.len(), self.workers);

        let mut indexed: Vec<(usize, ScenarioResult)> =
            stream::iter(scenarios.iter().copied().enumerate())
                .map(|(index, scenario)| {
                    let context = self.context.clone();
                    async move { (index, run_one(scenario, context).await) }
                })
                .buffer_unordered(self.workers)
                .collect()
                .await;
        indexed.sort_by_key(|(index, _)| *index);
        let results: Vec<ScenarioResult> = indexed.into_iter().map(|(_, r)| r).collect();

        let passed = results.iter().filter(|r| r.success).count();
        let failed = results.len() - passed;
        let duration_ms = elapsed_ms(start.elapsed());

        info!("");
        info!("Scenario results: {} passed, {} failed ({} ms)", passed, failed, duration_ms);

        SuiteResult {
            total: results.len(),
            passed,
            failed,
            duration_ms,
            results,
        }
    }
}

/// Each scenario runs on its own task so a panic fails only that scenario
async fn run_one(scenario: Scenario, context: ScenarioContext) -> ScenarioResult {
    let start = Instant::now();
    debug!("Running scenario: {}", scenario.name);

    let outcome = match tokio::spawn((scenario.run)(context)).await {
        Ok(outcome) => outcome,
        Err(e) => Err(HarnessError::Assertion(format!("scenario aborted: {e}"))),
    };
    let duration_ms = elapsed_ms(start.elapsed());

    let error = match outcome {
        Ok(()) => {
            info!("✓ {} ({} ms)", scenario.name, duration_ms);
            None
        }
        Err(e) => {
            error!("✗ {} - {}", scenario.name, e);
            Some(e.to_string())
        }
    };

    ScenarioResult {
        name: scenario.name.to_string(),
        tags: scenario.tags.iter().map(|t| t.to_string()).collect(),
        success: error.is_none(),
        duration_ms,
        error,
    }
}

/// Start the service once, run the batch, stop the service once.
///
/// A startup failure aborts before any scenario runs; the guard has already
/// cleaned up whatever it spawned by then.
pub async fn run_suite(
    spec: LaunchSpec,
    executor: Arc<dyn RequestExecutor>,
    workers: usize,
    scenarios: &[Scenario],
) -> HarnessResult<SuiteResult> {
    let guard = ServiceGuard::acquire(spec).await?;
    info!("Service ready (pid {:?})", guard.pid());

    let result = ScenarioRunner::new(executor, workers).run(scenarios).await;

    match guard.release() {
        Some(exit) if !exit.is_clean() => {
            warn!("Service exited abnormally: code {:?}, signal {:?}", exit.code, exit.signal)
        }
        Some(exit) => debug!(
            "Service stopped, {} descendant(s) terminated",
            exit.descendants_terminated
        ),
        None => {}
    }
    Ok(result)
}

/// Write `test-results.json` into `dir`, creating it if needed
pub fn write_results(dir: &Path, result: &SuiteResult) -> HarnessResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(RESULTS_FILE);
    std::fs::write(&path, serde_json::to_string_pretty(result)?)?;
    info!("Results written to {}", path.display());
    Ok(path)
}

fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
