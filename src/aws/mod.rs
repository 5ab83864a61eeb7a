//! AWS Collaborators
//!
//! Seams for the AWS side of a legacy (CloudFormation) environment:
//! credential checks, availability zone discovery and stack updates.
//! `cli::AwsCli` implements all of them, plus the IAM certificate store,
//! by driving the `aws` command line tool.

pub mod cli;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

pub use cli::AwsCli;

/// Confirms the caller's cloud credentials before anything is mutated
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    async fn validate(&self) -> Result<()>;
}

/// Lists availability zones for a region
#[async_trait]
pub trait AvailabilityZoneRetriever: Send + Sync {
    /// Zone names in provider order
    async fn retrieve(&self, region: &str) -> Result<Vec<String>>;
}

/// Parameters for an in-place CloudFormation stack update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackUpdate {
    pub stack_name: String,
    pub azs: Vec<String>,
    pub key_pair_name: String,
    /// `concourse`, `cf` or `none`
    pub lb_type: String,
    /// Empty when no load balancer is attached
    pub lb_certificate_arn: String,
    pub env_id: String,
    pub bosh_az: String,
}

/// A deployed stack and its outputs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackDescription {
    pub name: String,
    pub outputs: BTreeMap<String, String>,
}

/// Legacy stack-based infrastructure
#[async_trait]
pub trait StackManager: Send + Sync {
    async fn update(&self, update: &StackUpdate) -> Result<()>;

    async fn exists(&self, stack_name: &str) -> Result<bool>;

    async fn describe(&self, stack_name: &str) -> Result<StackDescription>;
}
