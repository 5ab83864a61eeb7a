//! Environment Validation
//!
//! Confirms a bbl environment exists before a command mutates it.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::aws::StackManager;
use crate::bosh::DirectorClient;
use crate::storage::State;

pub const BBL_NOT_FOUND: &str = "a bbl environment could not be found, \
    please create a new environment before running this command again";

#[async_trait]
pub trait EnvironmentValidator: Send + Sync {
    async fn validate(&self, state: &State) -> Result<()>;
}

/// Checks the backing infrastructure and, when one is expected, the director
pub struct InfrastructureEnvironmentValidator {
    stacks: Arc<dyn StackManager>,
    director: Arc<dyn DirectorClient>,
}

impl InfrastructureEnvironmentValidator {
    pub fn new(stacks: Arc<dyn StackManager>, director: Arc<dyn DirectorClient>) -> Self {
        Self { stacks, director }
    }
}

#[async_trait]
impl EnvironmentValidator for InfrastructureEnvironmentValidator {
    async fn validate(&self, state: &State) -> Result<()> {
        if !state.uses_terraform() {
            if state.stack.name.is_empty() {
                bail!(BBL_NOT_FOUND);
            }
            if !self.stacks.exists(&state.stack.name).await? {
                debug!(stack = %state.stack.name, "Stack not found");
                bail!(BBL_NOT_FOUND);
            }
        }

        if state.has_director() {
            if let Err(e) = self.director.info(&state.bosh).await {
                debug!(error = %e, "Director unreachable");
                bail!(BBL_NOT_FOUND);
            }
        }

        Ok(())
    }
}
