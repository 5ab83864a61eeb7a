//! Server Certificate Lifecycle
//!
//! Creates, describes and deletes named server certificates in the cloud
//! certificate store, and owns the naming scheme for load balancer
//! certificates.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// A server certificate as known to the certificate store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Certificate {
    pub name: String,
    /// Provider-assigned reference used to attach the certificate
    pub arn: String,
    pub body: String,
    pub chain: String,
}

/// Errors surfaced by a certificate store
#[derive(Debug, Error)]
pub enum CertificateStoreError {
    #[error("certificate not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Cloud certificate store operations
#[async_trait]
pub trait CertificateStore: Send + Sync {
    async fn upload(&self, name: &str, certificate: &str, private_key: &str, chain: &str)
        -> Result<()>;

    async fn describe(&self, name: &str) -> Result<Certificate, CertificateStoreError>;

    async fn delete(&self, name: &str) -> Result<(), CertificateStoreError>;
}

/// Name for a load balancer certificate.
///
/// `{lb_type}-elb-cert-{guid}`, suffixed with `-{env_id}` when the
/// environment has an id.
pub fn certificate_name(lb_type: &str, guid: &str, env_id: &str) -> String {
    let name = format!("{lb_type}-elb-cert-{guid}");
    if env_id.is_empty() {
        name
    } else {
        format!("{name}-{env_id}")
    }
}

/// Certificate lifecycle used by the load balancer commands
#[async_trait]
pub trait CertificateManager: Send + Sync {
    /// Upload the certificate files at the given paths under `name`
    async fn create(&self, cert_path: &str, key_path: &str, chain_path: &str, name: &str)
        -> Result<()>;

    async fn describe(&self, name: &str) -> Result<Certificate>;

    /// Delete `name`. A certificate that is already gone counts as deleted.
    async fn delete(&self, name: &str) -> Result<()>;
}

/// Certificate manager backed by a `CertificateStore`
pub struct StoreCertificateManager {
    store: Arc<dyn CertificateStore>,
}

impl StoreCertificateManager {
    pub fn new(store: Arc<dyn CertificateStore>) -> Self {
        Self { store }
    }
}

async fn read_file(path: &str) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {path}"))
}

#[async_trait]
impl CertificateManager for StoreCertificateManager {
    async fn create(
        &self,
        cert_path: &str,
        key_path: &str,
        chain_path: &str,
        name: &str,
    ) -> Result<()> {
        let certificate = read_file(cert_path).await?;
        let private_key = read_file(key_path).await?;
        let chain = if chain_path.is_empty() {
            String::new()
        } else {
            read_file(chain_path).await?
        };

        self.store
            .upload(name, &certificate, &private_key, &chain)
            .await?;

        info!(certificate = %name, "Certificate uploaded");
        Ok(())
    }

    async fn describe(&self, name: &str) -> Result<Certificate> {
        Ok(self.store.describe(name).await?)
    }

    async fn delete(&self, name: &str) -> Result<()> {
        match self.store.delete(name).await {
            Ok(()) => {
                info!(certificate = %name, "Certificate deleted");
                Ok(())
            }
            Err(CertificateStoreError::NotFound(_)) => {
                debug!(certificate = %name, "Certificate already deleted");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
