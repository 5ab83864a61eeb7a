//! Terraform Executor
//!
//! Runs the `terraform` binary against an opaque state blob. Every call
//! works in a fresh temp directory holding the template and the prior
//! state; inputs are passed as `TF_VAR_*` environment variables so key
//! material never appears in argv.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Output;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::error::{ExecutorError, TerraformError};

const TEMPLATE_FILE: &str = "template.tf";
const STATE_FILE: &str = "terraform.tfstate";

/// Variables passed to a template
pub type Inputs = BTreeMap<String, String>;

/// Opaque apply/destroy/output operations over terraform state
#[async_trait]
pub trait Executor: Send + Sync {
    async fn version(&self) -> Result<String>;

    /// Apply `template` on top of `tf_state` and return the new state
    async fn apply(&self, inputs: &Inputs, template: &str, tf_state: &str)
        -> Result<String, TerraformError>;

    /// Destroy everything in `tf_state` and return the emptied state
    async fn destroy(&self, inputs: &Inputs, template: &str, tf_state: &str)
        -> Result<String, TerraformError>;

    /// A single output value, rendered as a string
    async fn output(&self, tf_state: &str, name: &str) -> Result<String>;
}

/// Executor backed by the terraform command line tool
pub struct TerraformCli {
    binary: String,
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// Render a terraform output value the way `terraform output` prints strings
fn render_output(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl TerraformCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn workdir(template: &str, tf_state: &str) -> Result<TempDir> {
        let dir = tempfile::Builder::new()
            .prefix("bbl-terraform")
            .tempdir()
            .context("Failed to create terraform work dir")?;

        if !template.is_empty() {
            std::fs::write(dir.path().join(TEMPLATE_FILE), template)
                .context("Failed to write terraform template")?;
        }
        if !tf_state.is_empty() {
            std::fs::write(dir.path().join(STATE_FILE), tf_state)
                .context("Failed to write terraform state")?;
        }

        Ok(dir)
    }

    async fn run(&self, dir: &Path, args: &[&str], inputs: &Inputs) -> Result<Output> {
        debug!(command = %args.join(" "), dir = %dir.display(), "Running terraform");

        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .current_dir(dir)
            .env("TF_IN_AUTOMATION", "true");
        for (name, value) in inputs {
            command.env(format!("TF_VAR_{name}"), value);
        }

        command
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.binary))
    }

    async fn init(&self, dir: &Path) -> Result<()> {
        let output = self
            .run(dir, &["init", "-input=false", "-no-color"], &Inputs::new())
            .await?;
        if !output.status.success() {
            bail!("terraform init failed: {}", stderr(&output));
        }
        Ok(())
    }

    /// Run `apply` or `destroy`. A failure after init hands the work dir to
    /// the returned error so the state terraform wrote stays readable until
    /// the error is dropped.
    async fn converge(
        &self,
        action: &str,
        inputs: &Inputs,
        template: &str,
        tf_state: &str,
    ) -> Result<String, TerraformError> {
        let dir = Self::workdir(template, tf_state)?;
        self.init(dir.path()).await?;

        let state_arg = format!("-state={STATE_FILE}");
        let output = self
            .run(
                dir.path(),
                &[
                    action,
                    "-auto-approve",
                    "-input=false",
                    "-no-color",
                    state_arg.as_str(),
                ],
                inputs,
            )
            .await?;

        if !output.status.success() {
            let message = format!("terraform {action} failed: {}", stderr(&output));
            warn!(dir = %dir.path().display(), "terraform {} failed", action);
            let tf_state_path = dir.path().join(STATE_FILE);
            return Err(ExecutorError::in_workdir(dir, tf_state_path, message).into());
        }

        let new_state = tokio::fs::read_to_string(dir.path().join(STATE_FILE))
            .await
            .context("Failed to read terraform state")?;

        info!(action = %action, "terraform run complete");
        Ok(new_state)
    }
}

#[async_trait]
impl Executor for TerraformCli {
    async fn version(&self) -> Result<String> {
        let dir = Self::workdir("", "")?;
        let output = self
            .run(dir.path(), &["version", "-json"], &Inputs::new())
            .await?;
        if !output.status.success() {
            bail!("terraform version failed: {}", stderr(&output));
        }

        let version: Value = serde_json::from_slice(&output.stdout)
            .context("Failed to parse terraform version")?;
        version["terraform_version"]
            .as_str()
            .map(str::to_string)
            .context("terraform version missing from output")
    }

    async fn apply(
        &self,
        inputs: &Inputs,
        template: &str,
        tf_state: &str,
    ) -> Result<String, TerraformError> {
        self.converge("apply", inputs, template, tf_state).await
    }

    async fn destroy(
        &self,
        inputs: &Inputs,
        template: &str,
        tf_state: &str,
    ) -> Result<String, TerraformError> {
        self.converge("destroy", inputs, template, tf_state).await
    }

    async fn output(&self, tf_state: &str, name: &str) -> Result<String> {
        let dir = Self::workdir("", tf_state)?;
        let state_arg = format!("-state={STATE_FILE}");
        let output = self
            .run(
                dir.path(),
                &["output", "-json", "-no-color", state_arg.as_str(), name],
                &Inputs::new(),
            )
            .await?;
        if !output.status.success() {
            bail!("terraform output {} failed: {}", name, stderr(&output));
        }

        let value: Value = serde_json::from_slice(&output.stdout)
            .with_context(|| format!("Failed to parse terraform output {name}"))?;
        Ok(render_output(&value))
    }
}
