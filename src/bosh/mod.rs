//! BOSH Director Integration
//!
//! - `cloud_config`: renders the cloud config for an environment
//! - `cli`: uploads it through the `bosh` CLI
//! - `director`: director reachability over HTTPS

pub mod cli;
pub mod cloud_config;
pub mod director;

use anyhow::Result;
use async_trait::async_trait;

use crate::storage::State;

pub use cli::BoshCli;
pub use cloud_config::CloudConfigGenerator;
pub use director::{DirectorClient, DirectorInfo, HttpDirectorClient};

/// Reconciles the director's cloud config with the environment
#[async_trait]
pub trait CloudConfigManager: Send + Sync {
    async fn update(&self, state: &State) -> Result<()>;
}
