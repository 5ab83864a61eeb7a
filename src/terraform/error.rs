//! Terraform Errors
//!
//! A failed `terraform apply` may still have created infrastructure. The
//! executor reports that case as an `ExecutorError`, which owns the work dir
//! holding the state file terraform left behind; the manager wraps it in a
//! `ManagerError` that can rebuild the environment state as of the failure.
//! The work dir is removed when the error is dropped.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;

use crate::storage::State;

/// A terraform run that failed after it may have changed infrastructure
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ExecutorError {
    tf_state_path: PathBuf,
    message: String,
    workdir: Option<TempDir>,
}

impl ExecutorError {
    pub fn new(tf_state_path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            tf_state_path: tf_state_path.into(),
            message: message.into(),
            workdir: None,
        }
    }

    /// Error whose state file lives in `workdir`
    pub fn in_workdir(
        workdir: TempDir,
        tf_state_path: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            workdir: Some(workdir),
            ..Self::new(tf_state_path, message)
        }
    }

    /// Release the work dir. Dropping it removes the directory;
    /// `TempDir::keep` leaves it on disk.
    pub fn take_workdir(&mut self) -> Option<TempDir> {
        self.workdir.take()
    }

    pub fn tf_state_path(&self) -> &Path {
        &self.tf_state_path
    }

    /// The terraform state as of the failure
    pub async fn tf_state(&self) -> Result<String> {
        tokio::fs::read_to_string(&self.tf_state_path)
            .await
            .with_context(|| {
                format!(
                    "failed to read terraform state {}",
                    self.tf_state_path.display()
                )
            })
    }
}

/// Errors from a terraform executor
#[derive(Debug, Error)]
pub enum TerraformError {
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A failed apply/destroy that still exposes best-effort partial state
#[derive(Debug, Error)]
#[error("{executor_error}")]
pub struct ManagerError {
    bbl_state: State,
    executor_error: ExecutorError,
}

impl ManagerError {
    pub fn new(bbl_state: State, executor_error: ExecutorError) -> Self {
        Self {
            bbl_state,
            executor_error,
        }
    }

    /// The environment state with the terraform state captured at the failure
    pub async fn bbl_state(&self) -> Result<State> {
        let tf_state = self.executor_error.tf_state().await?;

        let mut state = self.bbl_state.clone();
        state.tf_state = tf_state;
        Ok(state)
    }

    pub fn take_workdir(&mut self) -> Option<TempDir> {
        self.executor_error.take_workdir()
    }
}

/// Outcome of a failed declarative apply
#[derive(Debug, Error)]
pub enum ApplyError {
    /// Infrastructure may have changed; partial state should be persisted
    #[error(transparent)]
    Recoverable(#[from] ManagerError),

    /// Nothing was applied
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}
