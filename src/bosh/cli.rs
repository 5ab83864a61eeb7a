//! BOSH CLI Adapter
//!
//! Uploads generated cloud configs with the `bosh` command line tool.
//! Director credentials and CA travel as environment variables.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::io::Write;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info};

use super::cloud_config::CloudConfigGenerator;
use super::CloudConfigManager;
use crate::storage::State;

pub struct BoshCli {
    binary: String,
    generator: CloudConfigGenerator,
}

impl BoshCli {
    pub fn new(binary: impl Into<String>, generator: CloudConfigGenerator) -> Self {
        Self {
            binary: binary.into(),
            generator,
        }
    }

    fn config_file(config: &serde_json::Value) -> Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("cloud-config")
            .suffix(".yml")
            .tempfile()
            .context("Failed to create cloud config file")?;
        serde_json::to_writer_pretty(&mut file, config)?;
        file.flush()?;
        Ok(file)
    }
}

#[async_trait]
impl CloudConfigManager for BoshCli {
    async fn update(&self, state: &State) -> Result<()> {
        let config = self.generator.generate(state).await?;
        let file = Self::config_file(&config)?;
        let path = file.path().to_string_lossy().into_owned();

        debug!(director = %state.bosh.director_address, "Running bosh update-cloud-config");

        let output = Command::new(&self.binary)
            .args(["-n", "update-cloud-config", &path])
            .env("BOSH_ENVIRONMENT", &state.bosh.director_address)
            .env("BOSH_CLIENT", &state.bosh.director_username)
            .env("BOSH_CLIENT_SECRET", &state.bosh.director_password)
            .env("BOSH_CA_CERT", &state.bosh.director_ssl_ca)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.binary))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let message = if stderr.trim().is_empty() { stdout } else { stderr };
            bail!("bosh update-cloud-config failed: {}", message.trim());
        }

        info!(director = %state.bosh.director_address, "Cloud config updated");
        Ok(())
    }
}
