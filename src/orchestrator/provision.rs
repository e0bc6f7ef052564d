use std::borrow::Cow;

use tracing::info;

use crate::daemon::{ModelDaemon, ModelInfo};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provisioning {
    /// No model configured.
    Skipped,
    AlreadyPresent,
    Pulled,
}

/// Make sure `model` is available locally, pulling it once if it is not.
///
/// The pull blocks until the daemon finishes; there is no timeout and no
/// retry, so a failed pull is returned to the caller as-is.
pub async fn ensure_model<D: ModelDaemon>(daemon: &D, model: Option<&str>) -> Result<Provisioning> {
    let Some(model) = model.map(str::trim).filter(|m| !m.is_empty()) else {
        return Ok(Provisioning::Skipped);
    };

    let models = daemon.list_models().await?;
    if is_listed(&models, model) {
        info!(model, "default model already present");
        return Ok(Provisioning::AlreadyPresent);
    }

    info!(model, "default model missing, pulling");
    daemon.pull(model).await?;
    info!(model, "default model pulled");
    Ok(Provisioning::Pulled)
}

/// Exact-name lookup; an untagged name stands for `:latest`.
pub fn is_listed(models: &[ModelInfo], wanted: &str) -> bool {
    let wanted = canonical(wanted);
    models.iter().any(|m| {
        canonical(&m.name) == wanted
            || m.model.as_deref().is_some_and(|alias| canonical(alias) == wanted)
    })
}

fn canonical(name: &str) -> Cow<'_, str> {
    let base = name.rsplit('/').next().unwrap_or(name);
    if base.contains(':') {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("{name}:latest"))
    }
}
