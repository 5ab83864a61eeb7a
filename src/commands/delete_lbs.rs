//! delete-lbs
//!
//! Detaches the load balancer. The director stops referencing it before the
//! infrastructure goes away.

use tracing::info;

use super::error::{recover_from_apply, LbsError};
use super::{Backend, Collaborators};
use crate::aws::StackUpdate;
use crate::storage::{lb_exists, Lb, State};

/// Stack LB type recorded once the load balancer is gone
const NO_LB: &str = "none";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteLbsConfig {
    pub skip_if_missing: bool,
}

pub struct DeleteLbs {
    collaborators: Collaborators,
}

impl DeleteLbs {
    pub fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }

    pub async fn execute(&self, config: &DeleteLbsConfig, state: State) -> Result<State, LbsError> {
        let c = &self.collaborators;

        c.credential_validator.validate().await?;
        c.environment_validator.validate(&state).await?;

        if !lb_exists(state.lb_type()) {
            if config.skip_if_missing {
                info!("no lb type exists, skipping...");
                return Ok(state);
            }
            return Err(LbsError::NoLbToDelete);
        }

        let state = match Backend::of(&state) {
            Backend::Stack => self.delete_with_stack(state).await?,
            Backend::Terraform => self.delete_with_terraform(state).await?,
        };

        c.state_store.set(&state).await?;
        Ok(state)
    }

    async fn update_cloud_config(&self, state: &State) -> Result<(), LbsError> {
        if state.has_director() {
            info!("updating cloud config");
            self.collaborators.cloud_config_manager.update(state).await?;
        }
        Ok(())
    }

    async fn delete_with_stack(&self, mut state: State) -> Result<State, LbsError> {
        let c = &self.collaborators;
        let certificate_name = std::mem::take(&mut state.stack.certificate_name);
        state.stack.lb_type = NO_LB.to_string();

        self.update_cloud_config(&state).await?;

        let azs = c.zone_retriever.retrieve(&state.aws.region).await?;

        info!(stack = %state.stack.name, "deleting load balancer");
        c.stack_manager
            .update(&StackUpdate {
                stack_name: state.stack.name.clone(),
                azs,
                key_pair_name: state.key_pair.name.clone(),
                lb_type: NO_LB.to_string(),
                lb_certificate_arn: String::new(),
                env_id: state.env_id.clone(),
                bosh_az: state.stack.bosh_az.clone(),
            })
            .await?;

        if !certificate_name.is_empty() {
            info!(certificate = %certificate_name, "deleting certificate");
            c.certificate_manager.delete(&certificate_name).await?;
        }

        Ok(state)
    }

    async fn delete_with_terraform(&self, mut state: State) -> Result<State, LbsError> {
        state.lb = Lb::default();

        self.update_cloud_config(&state).await?;

        info!("deleting load balancer");
        match self.collaborators.terraform_manager.apply(state).await {
            Ok(state) => Ok(state),
            Err(e) => Err(recover_from_apply(e, self.collaborators.state_store.as_ref()).await),
        }
    }
}
