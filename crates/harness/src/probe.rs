//! TCP readiness probing

use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use crate::error::{HarnessError, HarnessResult};

/// Upper bound for a single connect attempt
const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// Check whether something accepts TCP connections on `host:port`
pub async fn is_port_open(host: &str, port: u16, connect_timeout: Duration) -> bool {
    match timeout(connect_timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(_stream)) => true,
        Ok(Err(e)) => {
            if e.kind() != std::io::ErrorKind::ConnectionRefused {
                warn!("Probe of {}:{} failed: {}", host, port, e);
            }
            false
        }
        Err(_) => false,
    }
}

/// Poll `host:port` every `interval` until it opens or `window` elapses.
///
/// Returns the number of probes it took.
pub async fn wait_for_port(
    host: &str,
    port: u16,
    interval: Duration,
    window: Duration,
) -> HarnessResult<u32> {
    let start = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts = attempts.saturating_add(1);
        let remaining = window.saturating_sub(start.elapsed());
        let attempt_timeout = CONNECT_TIMEOUT.min(remaining.max(Duration::from_millis(1)));
        if is_port_open(host, port, attempt_timeout).await {
            info!("Port {} open after {} probe(s)", port, attempts);
            return Ok(attempts);
        }
        if attempts == 1 {
            info!("Waiting for port {} to open...", port);
        }

        if start.elapsed() + interval > window {
            warn!("Port {} still closed after {:?}", port, start.elapsed());
            return Err(HarnessError::StartupTimeout {
                port,
                waited: start.elapsed(),
                attempts,
            });
        }
        sleep(interval).await;
    }
}
