//! Load Balancer Commands
//!
//! - `create_lbs`: attach or update a load balancer
//! - `delete_lbs`: detach the load balancer
//! - `lbs`: report the attached load balancer
//!
//! Each command reads the state once, works on it in memory, and persists
//! it once at the end (or once on a recoverable apply failure).

pub mod create_lbs;
pub mod delete_lbs;
pub mod error;
pub mod lbs;

use std::sync::Arc;

use crate::aws::{AvailabilityZoneRetriever, CredentialValidator, StackManager};
use crate::bosh::CloudConfigManager;
use crate::certificates::{CertificateManager, CertificateValidator};
use crate::environment::EnvironmentValidator;
use crate::guid::GuidGenerator;
use crate::storage::{State, StateStore};
use crate::terraform::{OutputProvider, TerraformApplier};

pub use create_lbs::{CreateLbs, CreateLbsConfig};
pub use delete_lbs::{DeleteLbs, DeleteLbsConfig};
pub use error::LbsError;
pub use lbs::Lbs;

/// Everything a command may call out to
#[derive(Clone)]
pub struct Collaborators {
    pub credential_validator: Arc<dyn CredentialValidator>,
    pub environment_validator: Arc<dyn EnvironmentValidator>,
    pub certificate_validator: Arc<dyn CertificateValidator>,
    pub certificate_manager: Arc<dyn CertificateManager>,
    pub zone_retriever: Arc<dyn AvailabilityZoneRetriever>,
    pub stack_manager: Arc<dyn StackManager>,
    pub terraform_manager: Arc<dyn TerraformApplier>,
    pub output_provider: OutputProvider,
    pub cloud_config_manager: Arc<dyn CloudConfigManager>,
    pub guid_generator: Arc<dyn GuidGenerator>,
    pub state_store: Arc<dyn StateStore>,
}

/// Which provisioning backend owns an environment's infrastructure.
///
/// Chosen once per invocation from the incoming state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// CloudFormation stack updated in place
    Stack,
    /// Terraform over the opaque state in `State::tf_state`
    Terraform,
}

impl Backend {
    pub fn of(state: &State) -> Self {
        if state.uses_terraform() {
            Backend::Terraform
        } else {
            Backend::Stack
        }
    }
}
