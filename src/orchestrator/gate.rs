use std::time::Duration;

use tracing::{debug, info};

use crate::config::ReadinessSettings;
use crate::daemon::ModelDaemon;
use crate::{Error, Result};

/// Fixed-interval liveness poll. No backoff, no jitter.
#[derive(Debug, Clone, Copy)]
pub struct ReadinessGate {
    max_attempts: u32,
    interval: Duration,
}

#[derive(Debug, Clone)]
pub struct Ready {
    /// 1-based attempt that got an answer.
    pub attempt: u32,
    pub version: String,
}

impl ReadinessGate {
    pub fn new(settings: ReadinessSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            interval: settings.interval,
        }
    }

    pub async fn wait<D: ModelDaemon>(&self, daemon: &D) -> Result<Ready> {
        for attempt in 1..=self.max_attempts {
            match daemon.status().await {
                Ok(version) => {
                    info!(attempt, %version, "model daemon is ready");
                    return Ok(Ready { attempt, version });
                }
                Err(err) => {
                    debug!(attempt, max = self.max_attempts, error = %err, "model daemon not ready");
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }

        Err(Error::DaemonUnreachable {
            attempts: self.max_attempts,
        })
    }
}
