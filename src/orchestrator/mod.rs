//! Container start-up: spawn the daemon, wait for it, provision the default
//! model, then hand the process over to the selected mode.

pub mod gate;
pub mod mode;
pub mod provision;

use tracing::info;

use crate::config::Settings;
use crate::daemon::{DaemonClient, DaemonProcess, ModelDaemon};
use crate::web::{self, AppState};
use crate::{Error, Result};

pub use gate::{ReadinessGate, Ready};
pub use mode::Mode;
pub use provision::{ensure_model, Provisioning};

/// Gate, then provisioning where the mode asks for it. Nothing else may run
/// before this returns.
pub async fn prepare<D: ModelDaemon>(
    daemon: &D,
    settings: &Settings,
    mode: &Mode,
) -> Result<Option<Provisioning>> {
    ReadinessGate::new(settings.readiness).wait(daemon).await?;

    if !mode.provisions_model() {
        return Ok(None);
    }
    ensure_model(daemon, settings.default_model.as_deref())
        .await
        .map(Some)
}

/// Run the container. Only returns when the selected long-running process
/// is done, or on a start-up failure.
pub async fn run(settings: Settings, mode: Mode) -> Result<()> {
    info!(%mode, attach = settings.attach, "starting");

    let process = if settings.attach {
        DaemonProcess::attached()
    } else {
        DaemonProcess::spawn(&settings.daemon)?
    };
    let client = DaemonClient::from_settings(&settings.daemon);

    prepare(&client, &settings, &mode).await?;

    match mode {
        Mode::Api => {
            let state = AppState::new(client, settings.fallback_model());
            let served = web::serve(&settings.api, state).await;
            // dropping the handle stops a daemon we spawned
            drop(process);
            served
        }
        Mode::DaemonOnly => {
            info!(pid = ?process.pid(), "daemon-only mode, waiting");
            process.wait().await
        }
        Mode::Shell => exec(&[settings.shell.clone()], &settings, process),
        Mode::Script(argv) | Mode::Custom(argv) => exec(&argv, &settings, process),
    }
}

/// Replace this process with `argv`. The daemon child stays alive under the
/// new image.
#[cfg(unix)]
fn exec(argv: &[String], settings: &Settings, process: DaemonProcess) -> Result<()> {
    use std::os::unix::process::CommandExt;

    let (program, args) = argv
        .split_first()
        .ok_or_else(|| Error::InvalidMode("nothing to execute".into()))?;

    info!(program = %program, args = ?args, "handing over");
    let err = std::process::Command::new(program)
        .args(args)
        .env("OLLAMA_HOST", settings.daemon.bind_addr())
        .exec();

    // exec only returns on failure
    drop(process);
    Err(Error::Spawn {
        program: program.clone(),
        source: err,
    })
}

#[cfg(not(unix))]
fn exec(argv: &[String], settings: &Settings, process: DaemonProcess) -> Result<()> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| Error::InvalidMode("nothing to execute".into()))?;

    info!(program = %program, args = ?args, "handing over");
    let status = std::process::Command::new(program)
        .args(args)
        .env("OLLAMA_HOST", settings.daemon.bind_addr())
        .status()
        .map_err(|source| Error::Spawn {
            program: program.clone(),
            source,
        })?;
    drop(process);
    std::process::exit(status.code().unwrap_or(1));
}
