//! create-lbs
//!
//! Attaches a load balancer to an environment, or updates the one already
//! attached. Stack-backed environments upload a named server certificate
//! and update the CloudFormation stack; terraform-backed environments embed
//! the certificate material in state and re-apply.

use tracing::info;

use super::error::{recover_from_apply, LbsError};
use super::{Backend, Collaborators};
use crate::aws::StackUpdate;
use crate::certificates::certificate_name;
use crate::storage::{lb_exists, Lb, LbType, State};

pub const COMMAND: &str = "create-lbs";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateLbsConfig {
    pub lb_type: String,
    pub cert_path: String,
    pub key_path: String,
    /// Optional; empty when no chain was given
    pub chain_path: String,
    /// Optional system domain; only recorded when none is set yet
    pub domain: String,
    pub skip_if_exists: bool,
}

pub struct CreateLbs {
    collaborators: Collaborators,
}

fn parse_lb_type(lb_type: &str) -> Result<LbType, LbsError> {
    if lb_type.is_empty() {
        return Err(LbsError::MissingLbType);
    }
    LbType::parse(lb_type).ok_or_else(|| LbsError::InvalidLbType(lb_type.to_string()))
}

async fn read_file(path: &str) -> Result<String, LbsError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LbsError::ReadFile {
            path: path.to_string(),
            source,
        })
}

impl CreateLbs {
    pub fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }

    /// Run create-lbs against `state` and return the persisted state.
    ///
    /// With `skip_if_exists` and a load balancer of any type already
    /// attached, nothing is changed and the incoming state is returned.
    pub async fn execute(&self, config: &CreateLbsConfig, state: State) -> Result<State, LbsError> {
        let c = &self.collaborators;

        c.credential_validator.validate().await?;

        let lb_type = parse_lb_type(&config.lb_type)?;

        c.environment_validator.validate(&state).await?;

        let existing = state.lb_type().to_string();
        if config.skip_if_exists && lb_exists(&existing) {
            info!("lb type \"{}\" exists, skipping...", existing);
            return Ok(state);
        }
        if lb_exists(&existing) && existing != lb_type.as_str() {
            return Err(LbsError::LbAlreadyExists(existing));
        }

        let state = match Backend::of(&state) {
            Backend::Stack => self.create_with_stack(config, lb_type, state).await?,
            Backend::Terraform => self.create_with_terraform(config, lb_type, state).await?,
        };

        if state.has_director() {
            info!("updating cloud config");
            c.cloud_config_manager.update(&state).await?;
        }

        c.state_store.set(&state).await?;
        Ok(state)
    }

    async fn create_with_stack(
        &self,
        config: &CreateLbsConfig,
        lb_type: LbType,
        mut state: State,
    ) -> Result<State, LbsError> {
        let c = &self.collaborators;

        c.certificate_validator.validate(
            COMMAND,
            &config.cert_path,
            &config.key_path,
            &config.chain_path,
        )?;

        let guid = c.guid_generator.generate()?;
        let name = certificate_name(lb_type.as_str(), &guid, &state.env_id);

        info!("uploading certificate");
        c.certificate_manager
            .create(&config.cert_path, &config.key_path, &config.chain_path, &name)
            .await?;

        let certificate = c.certificate_manager.describe(&name).await?;
        let azs = c.zone_retriever.retrieve(&state.aws.region).await?;

        info!(stack = %state.stack.name, lb_type = %lb_type, "creating load balancer");
        c.stack_manager
            .update(&StackUpdate {
                stack_name: state.stack.name.clone(),
                azs,
                key_pair_name: state.key_pair.name.clone(),
                lb_type: lb_type.to_string(),
                lb_certificate_arn: certificate.arn,
                env_id: state.env_id.clone(),
                bosh_az: state.stack.bosh_az.clone(),
            })
            .await?;

        state.stack.lb_type = lb_type.to_string();
        state.stack.certificate_name = name;
        Ok(state)
    }

    async fn create_with_terraform(
        &self,
        config: &CreateLbsConfig,
        lb_type: LbType,
        mut state: State,
    ) -> Result<State, LbsError> {
        let cert = read_file(&config.cert_path).await?;
        let key = read_file(&config.key_path).await?;
        let chain = if config.chain_path.is_empty() {
            String::new()
        } else {
            read_file(&config.chain_path).await?
        };

        let mut domain = std::mem::take(&mut state.lb.domain);
        if domain.is_empty() {
            domain = config.domain.clone();
        }

        state.lb = Lb {
            lb_type: lb_type.to_string(),
            cert,
            key,
            chain,
            domain,
        };

        info!(lb_type = %lb_type, "creating load balancer");
        match self.collaborators.terraform_manager.apply(state).await {
            Ok(state) => Ok(state),
            Err(e) => Err(recover_from_apply(e, self.collaborators.state_store.as_ref()).await),
        }
    }
}
