//! AWS CLI Adapter
//!
//! Drives the `aws` command line tool with the environment's credentials.
//! Certificate material is handed over through short-lived temp files,
//! never through argv.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::io::Write;
use std::process::Output;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info};

use super::{
    AvailabilityZoneRetriever, CredentialValidator, StackDescription, StackManager, StackUpdate,
};
use crate::certificates::{Certificate, CertificateStore, CertificateStoreError};
use crate::storage::Aws;

/// AWS CLI client bound to one set of credentials
pub struct AwsCli {
    binary: String,
    credentials: Aws,
}

#[derive(Debug, Deserialize)]
struct GetServerCertificateResponse {
    #[serde(rename = "ServerCertificate")]
    server_certificate: ServerCertificate,
}

#[derive(Debug, Deserialize)]
struct ServerCertificate {
    #[serde(rename = "ServerCertificateMetadata")]
    metadata: ServerCertificateMetadata,
    #[serde(rename = "CertificateBody", default)]
    body: String,
    #[serde(rename = "CertificateChain", default)]
    chain: String,
}

#[derive(Debug, Deserialize)]
struct ServerCertificateMetadata {
    #[serde(rename = "ServerCertificateName")]
    name: String,
    #[serde(rename = "Arn")]
    arn: String,
}

#[derive(Debug, Deserialize)]
struct DescribeAvailabilityZonesResponse {
    #[serde(rename = "AvailabilityZones")]
    availability_zones: Vec<AvailabilityZone>,
}

#[derive(Debug, Deserialize)]
struct AvailabilityZone {
    #[serde(rename = "ZoneName")]
    zone_name: String,
    #[serde(rename = "State", default)]
    state: String,
}

#[derive(Debug, Deserialize)]
struct DescribeStacksResponse {
    #[serde(rename = "Stacks")]
    stacks: Vec<CloudFormationStack>,
}

#[derive(Debug, Deserialize)]
struct CloudFormationStack {
    #[serde(rename = "StackName")]
    name: String,
    #[serde(rename = "Outputs", default)]
    outputs: Vec<StackOutput>,
}

#[derive(Debug, Deserialize)]
struct StackOutput {
    #[serde(rename = "OutputKey")]
    key: String,
    #[serde(rename = "OutputValue", default)]
    value: String,
}

fn parse_stack(json: &str) -> Result<StackDescription> {
    let response: DescribeStacksResponse =
        serde_json::from_str(json).context("Failed to parse describe-stacks response")?;
    let stack = response
        .stacks
        .into_iter()
        .next()
        .context("describe-stacks returned no stacks")?;

    Ok(StackDescription {
        name: stack.name,
        outputs: stack
            .outputs
            .into_iter()
            .map(|output| (output.key, output.value))
            .collect(),
    })
}

fn parse_certificate(json: &str) -> Result<Certificate> {
    let response: GetServerCertificateResponse =
        serde_json::from_str(json).context("Failed to parse get-server-certificate response")?;
    let certificate = response.server_certificate;

    Ok(Certificate {
        name: certificate.metadata.name,
        arn: certificate.metadata.arn,
        body: certificate.body,
        chain: certificate.chain,
    })
}

fn parse_zones(json: &str) -> Result<Vec<String>> {
    let response: DescribeAvailabilityZonesResponse = serde_json::from_str(json)
        .context("Failed to parse describe-availability-zones response")?;

    Ok(response
        .availability_zones
        .into_iter()
        .filter(|zone| zone.state.is_empty() || zone.state == "available")
        .map(|zone| zone.zone_name)
        .collect())
}

/// CloudFormation `--parameters` document for a stack update
fn stack_parameters(update: &StackUpdate) -> serde_json::Value {
    let parameter = |key: &str, value: &str| {
        serde_json::json!({ "ParameterKey": key, "ParameterValue": value })
    };

    serde_json::Value::Array(vec![
        parameter("KeyPairName", &update.key_pair_name),
        parameter("AvailabilityZones", &update.azs.join(",")),
        parameter("BOSHAvailabilityZone", &update.bosh_az),
        parameter("LoadBalancerType", &update.lb_type),
        parameter("SSLCertificateId", &update.lb_certificate_arn),
        parameter("EnvID", &update.env_id),
    ])
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

fn temp_file(contents: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new().context("Failed to create temp file")?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

fn file_url(file: &NamedTempFile) -> String {
    format!("file://{}", file.path().display())
}

impl AwsCli {
    pub fn new(binary: impl Into<String>, credentials: Aws) -> Self {
        Self {
            binary: binary.into(),
            credentials,
        }
    }

    async fn run(&self, args: &[&str]) -> Result<Output> {
        debug!(command = %args.join(" "), "Running aws");

        Command::new(&self.binary)
            .args(args)
            .args(["--output", "json"])
            .env("AWS_ACCESS_KEY_ID", &self.credentials.access_key_id)
            .env("AWS_SECRET_ACCESS_KEY", &self.credentials.secret_access_key)
            .env("AWS_DEFAULT_REGION", &self.credentials.region)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.binary))
    }

    async fn run_json(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args).await?;
        if !output.status.success() {
            bail!("aws {} failed: {}", args[..2.min(args.len())].join(" "), stderr(&output));
        }
        Ok(String::from_utf8(output.stdout)?)
    }
}

#[async_trait]
impl CredentialValidator for AwsCli {
    async fn validate(&self) -> Result<()> {
        let creds = &self.credentials;
        if creds.access_key_id.is_empty()
            || creds.secret_access_key.is_empty()
            || creds.region.is_empty()
        {
            bail!(
                "AWS credentials were not provided, please run with --aws-access-key-id, \
                 --aws-secret-access-key and --aws-region"
            );
        }

        self.run_json(&["sts", "get-caller-identity"]).await?;
        debug!("AWS credentials validated");
        Ok(())
    }
}

#[async_trait]
impl AvailabilityZoneRetriever for AwsCli {
    async fn retrieve(&self, region: &str) -> Result<Vec<String>> {
        let json = self
            .run_json(&["ec2", "describe-availability-zones", "--region", region])
            .await?;
        parse_zones(&json)
    }
}

#[async_trait]
impl StackManager for AwsCli {
    async fn update(&self, update: &StackUpdate) -> Result<()> {
        let parameters = stack_parameters(update).to_string();

        info!(stack = %update.stack_name, lb_type = %update.lb_type, "Updating stack");

        let output = self
            .run(&[
                "cloudformation",
                "update-stack",
                "--stack-name",
                update.stack_name.as_str(),
                "--use-previous-template",
                "--capabilities",
                "CAPABILITY_IAM",
                "--parameters",
                parameters.as_str(),
            ])
            .await?;

        if !output.status.success() {
            let message = stderr(&output);
            if message.contains("No updates are to be performed") {
                info!(stack = %update.stack_name, "Stack already up to date");
                return Ok(());
            }
            bail!("aws cloudformation update-stack failed: {}", message);
        }

        self.run_json(&[
            "cloudformation",
            "wait",
            "stack-update-complete",
            "--stack-name",
            update.stack_name.as_str(),
        ])
        .await?;

        info!(stack = %update.stack_name, "Stack update complete");
        Ok(())
    }

    async fn exists(&self, stack_name: &str) -> Result<bool> {
        let output = self
            .run(&["cloudformation", "describe-stacks", "--stack-name", stack_name])
            .await?;

        if output.status.success() {
            return Ok(true);
        }

        let message = stderr(&output);
        if message.contains("does not exist") {
            return Ok(false);
        }
        bail!("aws cloudformation describe-stacks failed: {}", message);
    }

    async fn describe(&self, stack_name: &str) -> Result<StackDescription> {
        let json = self
            .run_json(&["cloudformation", "describe-stacks", "--stack-name", stack_name])
            .await?;
        parse_stack(&json)
    }
}

#[async_trait]
impl CertificateStore for AwsCli {
    async fn upload(
        &self,
        name: &str,
        certificate: &str,
        private_key: &str,
        chain: &str,
    ) -> Result<()> {
        let body = temp_file(certificate)?;
        let key = temp_file(private_key)?;
        let chain_file = if chain.is_empty() {
            None
        } else {
            Some(temp_file(chain)?)
        };

        let body_url = file_url(&body);
        let key_url = file_url(&key);
        let chain_url = chain_file.as_ref().map(file_url);

        let mut args = vec![
            "iam",
            "upload-server-certificate",
            "--server-certificate-name",
            name,
            "--certificate-body",
            body_url.as_str(),
            "--private-key",
            key_url.as_str(),
        ];
        if let Some(url) = chain_url.as_deref() {
            args.extend(["--certificate-chain", url]);
        }

        self.run_json(&args).await?;
        Ok(())
    }

    async fn describe(&self, name: &str) -> Result<Certificate, CertificateStoreError> {
        let output = self
            .run(&["iam", "get-server-certificate", "--server-certificate-name", name])
            .await?;

        if !output.status.success() {
            let message = stderr(&output);
            if message.contains("NoSuchEntity") {
                return Err(CertificateStoreError::NotFound(name.to_string()));
            }
            return Err(
                anyhow::anyhow!("aws iam get-server-certificate failed: {}", message).into(),
            );
        }

        let json = String::from_utf8(output.stdout).map_err(anyhow::Error::from)?;
        Ok(parse_certificate(&json)?)
    }

    async fn delete(&self, name: &str) -> Result<(), CertificateStoreError> {
        let output = self
            .run(&["iam", "delete-server-certificate", "--server-certificate-name", name])
            .await?;

        if !output.status.success() {
            let message = stderr(&output);
            if message.contains("NoSuchEntity") {
                return Err(CertificateStoreError::NotFound(name.to_string()));
            }
            return Err(
                anyhow::anyhow!("aws iam delete-server-certificate failed: {}", message).into(),
            );
        }

        Ok(())
    }
}
