pub mod config;
pub mod daemon;
pub mod error;
pub mod orchestrator;
pub mod shutdown;
pub mod web;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Settings;
pub use error::{Error, Result};
