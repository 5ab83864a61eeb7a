//! Declarative Infrastructure
//!
//! Terraform is consumed as an opaque apply/destroy/output black box:
//! - `executor`: runs the terraform binary against a state blob
//! - `manager`: maps environment state to template inputs and back
//! - `outputs`: typed facts extracted from terraform state
//! - `error`: recoverable vs. unrecoverable apply failures

pub mod error;
pub mod executor;
pub mod manager;
pub mod outputs;
pub mod templates;

pub use error::{ApplyError, ExecutorError, ManagerError, TerraformError};
pub use executor::{Executor, Inputs, TerraformCli};
pub use manager::{TerraformApplier, TerraformManager};
pub use outputs::{OutputProvider, Outputs};
