//! Terraform Manager
//!
//! Turns an environment `State` into template inputs, runs the executor,
//! and folds the resulting terraform state back into the environment.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use super::error::{ApplyError, ManagerError, TerraformError};
use super::executor::{Executor, Inputs};
use super::templates::template;
use crate::storage::{LbType, State};

/// Applies or destroys an environment's declarative infrastructure
#[async_trait]
pub trait TerraformApplier: Send + Sync {
    /// Converge infrastructure to `state` and return it with the new terraform state
    async fn apply(&self, state: State) -> Result<State, ApplyError>;

    /// Tear down everything terraform owns for `state`
    async fn destroy(&self, state: State) -> Result<State, ApplyError>;
}

/// Applier backed by a terraform `Executor`
pub struct TerraformManager {
    executor: Arc<dyn Executor>,
}

impl TerraformManager {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    fn inputs(state: &State) -> Inputs {
        let mut inputs = Inputs::new();
        inputs.insert("env_id".to_string(), state.env_id.clone());
        inputs.insert("region".to_string(), state.aws.region.clone());
        inputs.insert("access_key".to_string(), state.aws.access_key_id.clone());
        inputs.insert("secret_key".to_string(), state.aws.secret_access_key.clone());
        inputs.insert(
            "bosh_availability_zone".to_string(),
            state.stack.bosh_az.clone(),
        );

        if LbType::parse(&state.lb.lb_type).is_some() {
            inputs.insert("ssl_certificate".to_string(), state.lb.cert.clone());
            inputs.insert(
                "ssl_certificate_private_key".to_string(),
                state.lb.key.clone(),
            );
            inputs.insert("ssl_certificate_chain".to_string(), state.lb.chain.clone());
        }
        if !state.lb.domain.is_empty() {
            inputs.insert("system_domain".to_string(), state.lb.domain.clone());
        }

        inputs
    }

    fn template(state: &State) -> String {
        template(
            LbType::parse(&state.lb.lb_type),
            !state.lb.domain.is_empty(),
        )
    }

    fn recover(state: State, err: TerraformError) -> ApplyError {
        match err {
            TerraformError::Executor(executor_error) => {
                ManagerError::new(state, executor_error).into()
            }
            TerraformError::Other(e) => ApplyError::Failed(e),
        }
    }
}

#[async_trait]
impl TerraformApplier for TerraformManager {
    async fn apply(&self, mut state: State) -> Result<State, ApplyError> {
        let template = Self::template(&state);
        let inputs = Self::inputs(&state);
        debug!(env_id = %state.env_id, lb_type = %state.lb.lb_type, "Applying terraform template");

        match self.executor.apply(&inputs, &template, &state.tf_state).await {
            Ok(tf_state) => {
                state.tf_state = tf_state;
                info!(env_id = %state.env_id, "terraform apply succeeded");
                Ok(state)
            }
            Err(e) => Err(Self::recover(state, e)),
        }
    }

    async fn destroy(&self, mut state: State) -> Result<State, ApplyError> {
        let template = Self::template(&state);
        let inputs = Self::inputs(&state);
        debug!(env_id = %state.env_id, "Destroying terraform infrastructure");

        match self
            .executor
            .destroy(&inputs, &template, &state.tf_state)
            .await
        {
            Ok(tf_state) => {
                state.tf_state = tf_state;
                info!(env_id = %state.env_id, "terraform destroy succeeded");
                Ok(state)
            }
            Err(e) => Err(Self::recover(state, e)),
        }
    }
}
