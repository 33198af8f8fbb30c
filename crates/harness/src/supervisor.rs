//! Service process supervision - spawning, readiness and tree teardown

use serde::Serialize;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::probe::is_port_open;
use crate::proctree;

const PROBE_CONNECT_TIMEOUT: Duration = Duration::from_millis(250);
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Everything needed to launch the service and decide it is ready
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub readiness_host: String,
    pub readiness_port: u16,
    pub startup_timeout: Duration,
    pub poll_interval: Duration,
    pub stop_grace: Duration,
}

impl LaunchSpec {
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            program: config.service.program.clone(),
            args: config.service.args.clone(),
            working_dir: config.service.working_dir.clone(),
            readiness_host: config.host.clone(),
            readiness_port: config.port,
            startup_timeout: config.service.startup_timeout(),
            poll_interval: config.service.poll_interval(),
            stop_grace: config.service.stop_grace(),
        }
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Lifecycle of the supervised process.
///
/// `Stopped -> Starting -> Ready -> Stopping -> Stopped`; `Failed` is
/// absorbing and reachable from `Starting` and `Stopping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorState {
    Stopped,
    Starting,
    Ready,
    Stopping,
    Failed,
}

/// How the root process ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExitReport {
    pub pid: u32,
    pub code: Option<i32>,
    pub signal: Option<i32>,
    pub descendants_terminated: usize,
}

impl ExitReport {
    fn from_status(pid: u32, status: ExitStatus, descendants_terminated: usize) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            pid,
            code: status.code(),
            signal,
            descendants_terminated,
        }
    }

    /// Exit code 0, or death by the termination signals the supervisor sends
    pub fn is_clean(&self) -> bool {
        match (self.code, self.signal) {
            (Some(0), _) => true,
            #[cfg(unix)]
            (None, Some(sig)) => sig == nix::libc::SIGTERM || sig == nix::libc::SIGKILL,
            _ => false,
        }
    }
}

/// Owns the service process for the duration of a run
pub struct ProcessSupervisor {
    spec: LaunchSpec,
    state: SupervisorState,
    child: Option<Child>,
    last_exit: Option<ExitReport>,
}

impl ProcessSupervisor {
    pub fn new(spec: LaunchSpec) -> Self {
        Self {
            spec,
            state: SupervisorState::Stopped,
            child: None,
            last_exit: None,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    pub fn last_exit(&self) -> Option<&ExitReport> {
        self.last_exit.as_ref()
    }

    /// Spawn the service and block until its port accepts connections
    pub async fn start(&mut self) -> HarnessResult<()> {
        match self.state {
            SupervisorState::Ready => return Ok(()),
            SupervisorState::Stopped => {}
            other => {
                return Err(HarnessError::Config(format!(
                    "cannot start service while {:?}",
                    other
                )))
            }
        }

        // A listener left over from an earlier run would pass the readiness probe
        if is_port_open(
            &self.spec.readiness_host,
            self.spec.readiness_port,
            PROBE_CONNECT_TIMEOUT,
        )
        .await
        {
            self.state = SupervisorState::Failed;
            return Err(HarnessError::Spawn(format!(
                "port {} already in use before launch",
                self.spec.readiness_port
            )));
        }

        info!(
            "Spawning `{}` in {}",
            self.spec.command_line(),
            self.spec.working_dir.display()
        );

        let spawned = Command::new(&self.spec.program)
            .args(&self.spec.args)
            .current_dir(&self.spec.working_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn();
        let child = match spawned {
            Ok(child) => child,
            Err(e) => {
                self.state = SupervisorState::Failed;
                return Err(HarnessError::Spawn(format!(
                    "failed to spawn {}: {}",
                    self.spec.program, e
                )));
            }
        };

        info!("Service started (pid: {})", child.id());
        self.child = Some(child);
        self.state = SupervisorState::Starting;

        match self.wait_until_ready().await {
            Ok(attempts) => {
                self.state = SupervisorState::Ready;
                info!(
                    "Service ready on {}:{} after {} probe(s)",
                    self.spec.readiness_host, self.spec.readiness_port, attempts
                );
                Ok(())
            }
            Err(e) => {
                error!("Service failed to become ready: {}", e);
                if let Some(mut child) = self.child.take() {
                    match terminate_tree(&mut child, self.spec.stop_grace) {
                        Ok(report) => self.last_exit = Some(report),
                        Err(err) => warn!("Cleanup after failed start: {}", err),
                    }
                }
                self.state = SupervisorState::Failed;
                Err(e)
            }
        }
    }

    async fn wait_until_ready(&mut self) -> HarnessResult<u32> {
        let start = Instant::now();
        let mut attempts = 0u32;

        loop {
            if let Some(child) = self.child.as_mut() {
                if let Some(status) = child.try_wait()? {
                    let report = ExitReport::from_status(child.id(), status, 0);
                    self.child = None;
                    self.last_exit = Some(report);
                    return Err(HarnessError::Spawn(format!(
                        "service exited before opening port {} ({})",
                        self.spec.readiness_port, status
                    )));
                }
            }

            attempts = attempts.saturating_add(1);
            if is_port_open(
                &self.spec.readiness_host,
                self.spec.readiness_port,
                PROBE_CONNECT_TIMEOUT,
            )
            .await
            {
                return Ok(attempts);
            }

            if start.elapsed() + self.spec.poll_interval > self.spec.startup_timeout {
                return Err(HarnessError::StartupTimeout {
                    port: self.spec.readiness_port,
                    waited: start.elapsed(),
                    attempts,
                });
            }
            sleep(self.spec.poll_interval).await;
        }
    }

    /// Terminate the process tree and record the root's exit status.
    ///
    /// A no-op when nothing is running.
    pub fn stop(&mut self) -> Option<ExitReport> {
        let Some(mut child) = self.child.take() else {
            if self.state != SupervisorState::Failed {
                self.state = SupervisorState::Stopped;
            }
            return None;
        };

        let previous = self.state;
        self.state = SupervisorState::Stopping;

        match terminate_tree(&mut child, self.spec.stop_grace) {
            Ok(report) => {
                if report.is_clean() {
                    info!(
                        "Stopped {} (code: {:?}, signal: {:?})",
                        report.pid, report.code, report.signal
                    );
                } else {
                    warn!(
                        "Service {} exited abnormally (code: {:?}, signal: {:?})",
                        report.pid, report.code, report.signal
                    );
                }
                self.state = if previous == SupervisorState::Failed {
                    SupervisorState::Failed
                } else {
                    SupervisorState::Stopped
                };
                self.last_exit = Some(report.clone());
                Some(report)
            }
            Err(e) => {
                error!("Failed to stop service: {}", e);
                self.state = SupervisorState::Failed;
                None
            }
        }
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Run-scoped ownership of the service: acquired once before the scenario
/// batch, released once after it.
pub struct ServiceGuard {
    supervisor: ProcessSupervisor,
}

impl ServiceGuard {
    /// Start the service; on failure whatever was spawned is torn down first
    pub async fn acquire(spec: LaunchSpec) -> HarnessResult<Self> {
        let mut supervisor = ProcessSupervisor::new(spec);
        if let Err(e) = supervisor.start().await {
            supervisor.stop();
            return Err(e);
        }
        Ok(Self { supervisor })
    }

    pub fn state(&self) -> SupervisorState {
        self.supervisor.state()
    }

    pub fn pid(&self) -> Option<u32> {
        self.supervisor.pid()
    }

    pub fn release(mut self) -> Option<ExitReport> {
        self.supervisor.stop()
    }
}

/// Terminate descendants (deepest, newest first), then the root
fn terminate_tree(child: &mut Child, grace: Duration) -> std::io::Result<ExitReport> {
    let root = child.id();
    let descendants = proctree::descendants(root).unwrap_or_else(|e| {
        warn!("Could not enumerate children of {}: {}", root, e);
        Vec::new()
    });

    info!("Stopping main: {}", root);
    for d in &descendants {
        info!("Stopping child: {}", d.pid);
        send_term(d.pid);
    }

    send_term(root);
    let status = wait_with_grace(child, grace)?;

    for d in &descendants {
        if is_alive(d.pid) {
            warn!("Child {} ignored SIGTERM, killing", d.pid);
            send_kill(d.pid);
        }
    }

    Ok(ExitReport::from_status(root, status, descendants.len()))
}

fn wait_with_grace(child: &mut Child, grace: Duration) -> std::io::Result<ExitStatus> {
    let deadline = Instant::now() + grace;
    while Instant::now() < deadline {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        std::thread::sleep(EXIT_POLL_INTERVAL);
    }

    // Force kill if still running
    if child.try_wait()?.is_none() {
        let _ = child.kill();
    }
    child.wait()
}

#[cfg(unix)]
fn send_term(pid: u32) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
}

#[cfg(unix)]
fn send_kill(pid: u32) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let _ = kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
}

#[cfg(unix)]
fn is_alive(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid as i32), None).is_ok()
}

#[cfg(not(unix))]
fn send_term(_pid: u32) {}

#[cfg(not(unix))]
fn send_kill(_pid: u32) {}

#[cfg(not(unix))]
fn is_alive(_pid: u32) -> bool {
    false
}
