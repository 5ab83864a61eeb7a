//! Recording test doubles for every collaborator seam.
//!
//! Each fake records its call count and last arguments and replays scripted
//! returns. Scripted errors are plain messages unless the seam has a typed
//! error.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::aws::{
    AvailabilityZoneRetriever, CredentialValidator, StackDescription, StackManager, StackUpdate,
};
use crate::bosh::{CloudConfigManager, DirectorClient, DirectorInfo};
use crate::certificates::{
    Certificate, CertificateManager, CertificateStore, CertificateStoreError, CertificateValidator,
};
use crate::environment::EnvironmentValidator;
use crate::guid::GuidGenerator;
use crate::storage::{Bosh, State, StateStore};
use crate::terraform::{ApplyError, Executor, Inputs, TerraformApplier, TerraformError};

fn scripted(error: &Option<String>) -> Result<()> {
    match error {
        Some(message) => Err(anyhow!("{message}")),
        None => Ok(()),
    }
}

// ============================================================================
// AWS
// ============================================================================

#[derive(Default)]
pub struct ValidateCredentialsCall {
    pub call_count: usize,
    pub returns_error: Option<String>,
}

#[derive(Default)]
pub struct FakeCredentialValidator {
    pub validate_call: Mutex<ValidateCredentialsCall>,
}

#[async_trait]
impl CredentialValidator for FakeCredentialValidator {
    async fn validate(&self) -> Result<()> {
        let mut call = self.validate_call.lock().unwrap();
        call.call_count += 1;
        scripted(&call.returns_error)
    }
}

#[derive(Default)]
pub struct RetrieveCall {
    pub call_count: usize,
    pub receives: String,
    pub returns: Vec<String>,
    pub returns_error: Option<String>,
}

#[derive(Default)]
pub struct FakeZoneRetriever {
    pub retrieve_call: Mutex<RetrieveCall>,
}

#[async_trait]
impl AvailabilityZoneRetriever for FakeZoneRetriever {
    async fn retrieve(&self, region: &str) -> Result<Vec<String>> {
        let mut call = self.retrieve_call.lock().unwrap();
        call.call_count += 1;
        call.receives = region.to_string();
        scripted(&call.returns_error)?;
        Ok(call.returns.clone())
    }
}

#[derive(Default)]
pub struct UpdateStackCall {
    pub call_count: usize,
    pub receives: StackUpdate,
    pub returns_error: Option<String>,
}

#[derive(Default)]
pub struct StackExistsCall {
    pub call_count: usize,
    pub receives: String,
    pub returns: bool,
    pub returns_error: Option<String>,
}

#[derive(Default)]
pub struct DescribeStackCall {
    pub call_count: usize,
    pub receives: String,
    pub returns: StackDescription,
    pub returns_error: Option<String>,
}

#[derive(Default)]
pub struct FakeStackManager {
    pub update_call: Mutex<UpdateStackCall>,
    pub exists_call: Mutex<StackExistsCall>,
    pub describe_call: Mutex<DescribeStackCall>,
}

#[async_trait]
impl StackManager for FakeStackManager {
    async fn update(&self, update: &StackUpdate) -> Result<()> {
        let mut call = self.update_call.lock().unwrap();
        call.call_count += 1;
        call.receives = update.clone();
        scripted(&call.returns_error)
    }

    async fn exists(&self, stack_name: &str) -> Result<bool> {
        let mut call = self.exists_call.lock().unwrap();
        call.call_count += 1;
        call.receives = stack_name.to_string();
        scripted(&call.returns_error)?;
        Ok(call.returns)
    }

    async fn describe(&self, stack_name: &str) -> Result<StackDescription> {
        let mut call = self.describe_call.lock().unwrap();
        call.call_count += 1;
        call.receives = stack_name.to_string();
        scripted(&call.returns_error)?;
        Ok(call.returns.clone())
    }
}

// ============================================================================
// Certificates
// ============================================================================

#[derive(Default)]
pub struct UploadReceives {
    pub name: String,
    pub certificate: String,
    pub private_key: String,
    pub chain: String,
}

#[derive(Default)]
pub struct UploadCall {
    pub call_count: usize,
    pub receives: UploadReceives,
    pub returns_error: Option<String>,
}

#[derive(Default)]
pub struct StoreDescribeCall {
    pub call_count: usize,
    pub receives: String,
    pub returns: Certificate,
}

#[derive(Default)]
pub struct StoreDeleteCall {
    pub call_count: usize,
    pub receives: String,
    pub returns: Option<CertificateStoreError>,
}

#[derive(Default)]
pub struct FakeCertificateStore {
    pub upload_call: Mutex<UploadCall>,
    pub describe_call: Mutex<StoreDescribeCall>,
    pub delete_call: Mutex<StoreDeleteCall>,
}

#[async_trait]
impl CertificateStore for FakeCertificateStore {
    async fn upload(
        &self,
        name: &str,
        certificate: &str,
        private_key: &str,
        chain: &str,
    ) -> Result<()> {
        let mut call = self.upload_call.lock().unwrap();
        call.call_count += 1;
        call.receives = UploadReceives {
            name: name.to_string(),
            certificate: certificate.to_string(),
            private_key: private_key.to_string(),
            chain: chain.to_string(),
        };
        scripted(&call.returns_error)
    }

    async fn describe(&self, name: &str) -> Result<Certificate, CertificateStoreError> {
        let mut call = self.describe_call.lock().unwrap();
        call.call_count += 1;
        call.receives = name.to_string();
        Ok(call.returns.clone())
    }

    async fn delete(&self, name: &str) -> Result<(), CertificateStoreError> {
        let mut call = self.delete_call.lock().unwrap();
        call.call_count += 1;
        call.receives = name.to_string();
        match call.returns.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct CertificateValidateReceives {
    pub command: String,
    pub cert_path: String,
    pub key_path: String,
    pub chain_path: String,
}

#[derive(Default)]
pub struct CertificateValidateCall {
    pub call_count: usize,
    pub receives: CertificateValidateReceives,
    pub returns_error: Option<String>,
}

#[derive(Default)]
pub struct FakeCertificateValidator {
    pub validate_call: Mutex<CertificateValidateCall>,
}

impl CertificateValidator for FakeCertificateValidator {
    fn validate(
        &self,
        command: &str,
        cert_path: &str,
        key_path: &str,
        chain_path: &str,
    ) -> Result<()> {
        let mut call = self.validate_call.lock().unwrap();
        call.call_count += 1;
        call.receives = CertificateValidateReceives {
            command: command.to_string(),
            cert_path: cert_path.to_string(),
            key_path: key_path.to_string(),
            chain_path: chain_path.to_string(),
        };
        scripted(&call.returns_error)
    }
}

#[derive(Default)]
pub struct CreateCertificateReceives {
    pub cert_path: String,
    pub key_path: String,
    pub chain_path: String,
    pub name: String,
}

#[derive(Default)]
pub struct CreateCertificateCall {
    pub call_count: usize,
    pub receives: CreateCertificateReceives,
    pub returns_error: Option<String>,
}

#[derive(Default)]
pub struct DescribeCertificateCall {
    pub call_count: usize,
    pub receives: String,
    pub returns: Certificate,
    pub returns_error: Option<String>,
}

#[derive(Default)]
pub struct DeleteCertificateCall {
    pub call_count: usize,
    pub receives: String,
    pub returns_error: Option<String>,
}

#[derive(Default)]
pub struct FakeCertificateManager {
    pub create_call: Mutex<CreateCertificateCall>,
    pub describe_call: Mutex<DescribeCertificateCall>,
    pub delete_call: Mutex<DeleteCertificateCall>,
}

#[async_trait]
impl CertificateManager for FakeCertificateManager {
    async fn create(
        &self,
        cert_path: &str,
        key_path: &str,
        chain_path: &str,
        name: &str,
    ) -> Result<()> {
        let mut call = self.create_call.lock().unwrap();
        call.call_count += 1;
        call.receives = CreateCertificateReceives {
            cert_path: cert_path.to_string(),
            key_path: key_path.to_string(),
            chain_path: chain_path.to_string(),
            name: name.to_string(),
        };
        scripted(&call.returns_error)
    }

    async fn describe(&self, name: &str) -> Result<Certificate> {
        let mut call = self.describe_call.lock().unwrap();
        call.call_count += 1;
        call.receives = name.to_string();
        scripted(&call.returns_error)?;
        Ok(call.returns.clone())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let mut call = self.delete_call.lock().unwrap();
        call.call_count += 1;
        call.receives = name.to_string();
        scripted(&call.returns_error)
    }
}

// ============================================================================
// Terraform
// ============================================================================

#[derive(Default)]
pub struct ExecutorReceives {
    pub inputs: Inputs,
    pub template: String,
    pub tf_state: String,
}

#[derive(Default)]
pub struct ExecutorRunCall {
    pub call_count: usize,
    pub receives: ExecutorReceives,
    pub returns_tf_state: String,
    pub returns_error: Option<TerraformError>,
}

impl ExecutorRunCall {
    fn record(
        &mut self,
        inputs: &Inputs,
        template: &str,
        tf_state: &str,
    ) -> Result<String, TerraformError> {
        self.call_count += 1;
        self.receives = ExecutorReceives {
            inputs: inputs.clone(),
            template: template.to_string(),
            tf_state: tf_state.to_string(),
        };
        match self.returns_error.take() {
            Some(e) => Err(e),
            None => Ok(self.returns_tf_state.clone()),
        }
    }
}

#[derive(Default)]
pub struct OutputReceives {
    pub tf_state: String,
    /// Every output name requested, in order
    pub names: Vec<String>,
}

#[derive(Default)]
pub struct OutputCall {
    pub call_count: usize,
    pub receives: OutputReceives,
    /// Output values by name; unknown names read as empty
    pub outputs: HashMap<String, String>,
    /// Scripted failures by output name
    pub errors: HashMap<String, String>,
}

#[derive(Default)]
pub struct VersionCall {
    pub call_count: usize,
    pub returns: String,
}

#[derive(Default)]
pub struct FakeExecutor {
    pub apply_call: Mutex<ExecutorRunCall>,
    pub destroy_call: Mutex<ExecutorRunCall>,
    pub output_call: Mutex<OutputCall>,
    pub version_call: Mutex<VersionCall>,
}

#[async_trait]
impl Executor for FakeExecutor {
    async fn version(&self) -> Result<String> {
        let mut call = self.version_call.lock().unwrap();
        call.call_count += 1;
        Ok(call.returns.clone())
    }

    async fn apply(
        &self,
        inputs: &Inputs,
        template: &str,
        tf_state: &str,
    ) -> Result<String, TerraformError> {
        self.apply_call.lock().unwrap().record(inputs, template, tf_state)
    }

    async fn destroy(
        &self,
        inputs: &Inputs,
        template: &str,
        tf_state: &str,
    ) -> Result<String, TerraformError> {
        self.destroy_call.lock().unwrap().record(inputs, template, tf_state)
    }

    async fn output(&self, tf_state: &str, name: &str) -> Result<String> {
        let mut call = self.output_call.lock().unwrap();
        call.call_count += 1;
        call.receives.tf_state = tf_state.to_string();
        call.receives.names.push(name.to_string());

        if let Some(message) = call.errors.get(name) {
            return Err(anyhow!("{message}"));
        }
        Ok(call.outputs.get(name).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct ApplierCall {
    pub call_count: usize,
    pub receives: State,
    pub returns: State,
    pub returns_error: Option<ApplyError>,
}

impl ApplierCall {
    fn record(&mut self, state: State) -> Result<State, ApplyError> {
        self.call_count += 1;
        self.receives = state;
        match self.returns_error.take() {
            Some(e) => Err(e),
            None => Ok(self.returns.clone()),
        }
    }
}

#[derive(Default)]
pub struct FakeTerraformApplier {
    pub apply_call: Mutex<ApplierCall>,
    pub destroy_call: Mutex<ApplierCall>,
}

#[async_trait]
impl TerraformApplier for FakeTerraformApplier {
    async fn apply(&self, state: State) -> Result<State, ApplyError> {
        self.apply_call.lock().unwrap().record(state)
    }

    async fn destroy(&self, state: State) -> Result<State, ApplyError> {
        self.destroy_call.lock().unwrap().record(state)
    }
}

// ============================================================================
// BOSH, environment, ids, state
// ============================================================================

#[derive(Default)]
pub struct CloudConfigUpdateCall {
    pub call_count: usize,
    pub receives: State,
    pub returns_error: Option<String>,
}

#[derive(Default)]
pub struct FakeCloudConfigManager {
    pub update_call: Mutex<CloudConfigUpdateCall>,
}

#[async_trait]
impl CloudConfigManager for FakeCloudConfigManager {
    async fn update(&self, state: &State) -> Result<()> {
        let mut call = self.update_call.lock().unwrap();
        call.call_count += 1;
        call.receives = state.clone();
        scripted(&call.returns_error)
    }
}

#[derive(Default)]
pub struct InfoCall {
    pub call_count: usize,
    pub receives: Bosh,
    pub returns: DirectorInfo,
    pub returns_error: Option<String>,
}

#[derive(Default)]
pub struct FakeDirectorClient {
    pub info_call: Mutex<InfoCall>,
}

#[async_trait]
impl DirectorClient for FakeDirectorClient {
    async fn info(&self, bosh: &Bosh) -> Result<DirectorInfo> {
        let mut call = self.info_call.lock().unwrap();
        call.call_count += 1;
        call.receives = bosh.clone();
        scripted(&call.returns_error)?;
        Ok(call.returns.clone())
    }
}

#[derive(Default)]
pub struct EnvironmentValidateCall {
    pub call_count: usize,
    pub receives: State,
    pub returns_error: Option<String>,
}

#[derive(Default)]
pub struct FakeEnvironmentValidator {
    pub validate_call: Mutex<EnvironmentValidateCall>,
}

#[async_trait]
impl EnvironmentValidator for FakeEnvironmentValidator {
    async fn validate(&self, state: &State) -> Result<()> {
        let mut call = self.validate_call.lock().unwrap();
        call.call_count += 1;
        call.receives = state.clone();
        scripted(&call.returns_error)
    }
}

#[derive(Default)]
pub struct GenerateCall {
    pub call_count: usize,
    pub returns: String,
    pub returns_error: Option<String>,
}

#[derive(Default)]
pub struct FakeGuidGenerator {
    pub generate_call: Mutex<GenerateCall>,
}

impl GuidGenerator for FakeGuidGenerator {
    fn generate(&self) -> Result<String> {
        let mut call = self.generate_call.lock().unwrap();
        call.call_count += 1;
        scripted(&call.returns_error)?;
        Ok(call.returns.clone())
    }
}

#[derive(Default)]
pub struct SetCall {
    pub call_count: usize,
    /// Every state passed to `set`, in order
    pub receives: Vec<State>,
    /// Scripted failure per call, by call index
    pub returns: Vec<Option<String>>,
}

#[derive(Default)]
pub struct FakeStateStore {
    pub set_call: Mutex<SetCall>,
}

#[async_trait]
impl StateStore for FakeStateStore {
    async fn set(&self, state: &State) -> Result<()> {
        let mut call = self.set_call.lock().unwrap();
        let index = call.call_count;
        call.call_count += 1;
        call.receives.push(state.clone());
        match call.returns.get(index) {
            Some(error) => scripted(error),
            None => Ok(()),
        }
    }
}
