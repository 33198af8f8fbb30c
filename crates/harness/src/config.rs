//! Harness configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{HarnessError, HarnessResult};

/// Environment overrides, checked after the config file is read.
pub const ENV_HOST: &str = "RAFFLE_HARNESS_HOST";
pub const ENV_PORT: &str = "RAFFLE_HARNESS_PORT";
pub const ENV_STARTUP_TIMEOUT_SECS: &str = "RAFFLE_HARNESS_STARTUP_TIMEOUT_SECS";
pub const ENV_WORKERS: &str = "RAFFLE_HARNESS_WORKERS";

/// Header the service reads the organizer identity from.
pub const ORGANIZER_HEADER: &str = "X-Goog-Authenticated-User-Id";

/// Top-level harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Host the service listens on
    pub host: String,

    /// Port the service listens on; also the readiness port
    pub port: u16,

    /// Number of scenarios executed concurrently
    pub workers: usize,

    /// How to launch the service under test
    pub service: ServiceConfig,

    /// HTTP client settings
    pub http: HttpConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8081,
            workers: 8,
            service: ServiceConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

/// Launch settings for the service process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Program to execute
    pub program: String,

    /// Arguments passed to the program
    pub args: Vec<String>,

    /// Directory the program runs in
    pub working_dir: PathBuf,

    /// How long the port may stay closed after spawn
    pub startup_timeout_secs: u64,

    /// Delay between readiness probes
    pub poll_interval_ms: u64,

    /// How long a terminated process gets before it is killed
    pub stop_grace_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            program: "go".to_string(),
            args: ["run", "-tags", "local", "./testinfra/local/run.go"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            working_dir: PathBuf::from(".."),
            startup_timeout_secs: 8,
            poll_interval_ms: 100,
            stop_grace_ms: 500,
        }
    }
}

impl ServiceConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout; 0 leaves requests unbounded
    pub request_timeout_secs: u64,

    /// Value sent in the organizer identity header
    pub organizer_id: String,

    /// Extra headers sent with every request
    pub headers: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 0,
            organizer_id: "dummy_test_user".to_string(),
            headers: BTreeMap::new(),
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

impl HarnessConfig {
    /// Load configuration from file, falling back to defaults when it is absent
    pub fn load(path: &Path) -> HarnessResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> HarnessResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides
    pub fn apply_env(mut self) -> HarnessResult<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(self)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> HarnessResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            let host = host.trim();
            if host.is_empty() {
                return Err(HarnessError::Config(format!("{ENV_HOST} must not be empty")));
            }
            self.host = host.to_string();
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = parse_positive(ENV_PORT, &port)?;
        }
        if let Some(secs) = lookup(ENV_STARTUP_TIMEOUT_SECS) {
            self.service.startup_timeout_secs = parse_positive(ENV_STARTUP_TIMEOUT_SECS, &secs)?;
        }
        if let Some(workers) = lookup(ENV_WORKERS) {
            self.workers = parse_positive(ENV_WORKERS, &workers)?;
        }
        self.validate()
    }

    fn validate(&self) -> HarnessResult<()> {
        if self.host.trim().is_empty() {
            return Err(HarnessError::Config("host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(HarnessError::Config("port must be non-zero".into()));
        }
        if self.workers == 0 {
            return Err(HarnessError::Config("workers must be at least 1".into()));
        }
        if self.service.program.trim().is_empty() {
            return Err(HarnessError::Config("service.program must not be empty".into()));
        }
        Ok(())
    }

    /// Base URI every request is resolved against
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

fn parse_positive<T>(name: &str, raw: &str) -> HarnessResult<T>
where
    T: std::str::FromStr + PartialEq + Default,
{
    let value: T = raw
        .trim()
        .parse()
        .map_err(|_| {
            HarnessError::Config(format!("{name} must be a positive integer, got '{raw}'"))
        })?;
    if value == T::default() {
        return Err(HarnessError::Config(format!("{name} must be greater than zero")));
    }
    Ok(value)
}
