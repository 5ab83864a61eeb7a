//! BOSH Director Client
//!
//! Unauthenticated reachability check against the director's `/info`
//! endpoint, trusting the director CA recorded in state.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::storage::Bosh;

/// What a director reports about itself
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DirectorInfo {
    pub name: String,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub version: String,
}

#[async_trait]
pub trait DirectorClient: Send + Sync {
    async fn info(&self, bosh: &Bosh) -> Result<DirectorInfo>;
}

/// Director client over HTTPS
#[derive(Debug, Clone)]
pub struct HttpDirectorClient {
    timeout: Duration,
}

impl Default for HttpDirectorClient {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl HttpDirectorClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn client(&self, bosh: &Bosh) -> Result<Client> {
        let mut builder = Client::builder().timeout(self.timeout);
        if !bosh.director_ssl_ca.is_empty() {
            let ca = reqwest::Certificate::from_pem(bosh.director_ssl_ca.as_bytes())
                .context("Failed to parse director CA certificate")?;
            builder = builder.add_root_certificate(ca);
        }
        builder.build().context("Failed to create HTTP client")
    }
}

fn info_url(address: &str) -> String {
    format!("{}/info", address.trim_end_matches('/'))
}

#[async_trait]
impl DirectorClient for HttpDirectorClient {
    async fn info(&self, bosh: &Bosh) -> Result<DirectorInfo> {
        if bosh.director_address.is_empty() {
            bail!("director address is not set");
        }

        let url = info_url(&bosh.director_address);
        debug!(url = %url, "Fetching director info");

        let response = self
            .client(bosh)?
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach director at {}", bosh.director_address))?;

        if !response.status().is_success() {
            bail!("director info returned {}", response.status());
        }

        response
            .json::<DirectorInfo>()
            .await
            .context("Failed to parse director info")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_url() {
        assert_eq!(info_url("https://10.0.0.6:25555"), "https://10.0.0.6:25555/info");
        assert_eq!(info_url("https://10.0.0.6:25555/"), "https://10.0.0.6:25555/info");
    }

    #[tokio::test]
    async fn test_info_requires_address() {
        let err = HttpDirectorClient::default()
            .info(&Bosh::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "director address is not set");
    }

    #[test]
    fn test_director_info_parses() {
        let info: DirectorInfo = serde_json::from_str(
            r#"{"name":"some-director","uuid":"abc","version":"270.0.0","cpi":"aws_cpi"}"#,
        )
        .unwrap();
        assert_eq!(info.name, "some-director");
        assert_eq!(info.version, "270.0.0");
    }
}
