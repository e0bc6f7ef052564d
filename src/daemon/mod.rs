use std::future::Future;

use crate::Result;

pub mod client;
pub mod process;
pub mod stream;
pub mod types;

pub use client::DaemonClient;
pub use process::DaemonProcess;
pub use types::ModelInfo;

/// The daemon operations start-up orchestration depends on.
pub trait ModelDaemon: Send + Sync {
    /// Lightweight liveness call; yields the daemon's version on success.
    fn status(&self) -> impl Future<Output = Result<String>> + Send;

    fn list_models(&self) -> impl Future<Output = Result<Vec<ModelInfo>>> + Send;

    fn pull(&self, model: &str) -> impl Future<Output = Result<()>> + Send;
}
