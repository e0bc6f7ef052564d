use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::config::DaemonSettings;
use crate::shutdown::shutdown_signal;
use crate::{Error, Result};

/// The background model-serving daemon.
///
/// Either a child we spawned (`ollama serve`) or a daemon someone else runs,
/// in which case we only talk to it over HTTP.
pub struct DaemonProcess {
    child: Option<Child>,
}

impl DaemonProcess {
    pub fn spawn(settings: &DaemonSettings) -> Result<Self> {
        let bind = settings.bind_addr();
        let child = Command::new(&settings.bin)
            .arg("serve")
            .env("OLLAMA_HOST", &bind)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::Spawn {
                program: format!("{} serve", settings.bin),
                source,
            })?;

        info!(pid = child.id(), bind = %bind, bin = %settings.bin, "model daemon spawned");
        Ok(Self { child: Some(child) })
    }

    pub fn attached() -> Self {
        Self { child: None }
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Block until the daemon exits or a shutdown signal arrives.
    pub async fn wait(mut self) -> Result<()> {
        let Some(child) = self.child.as_mut() else {
            shutdown_signal().await;
            return Ok(());
        };

        tokio::select! {
            status = child.wait() => {
                let status = status?;
                if status.success() {
                    info!(%status, "model daemon exited");
                    Ok(())
                } else {
                    Err(Error::DaemonExited(status.to_string()))
                }
            }
            _ = shutdown_signal() => {
                info!("shutdown requested, stopping model daemon");
                if let Err(err) = child.kill().await {
                    warn!(?err, "failed to stop model daemon");
                }
                Ok(())
            }
        }
    }
}
