//! Environment State Types
//!
//! The persisted shape of a bbl environment. Field names follow the
//! `bbl-state.json` layout so existing state files load unchanged.

use serde::{Deserialize, Serialize};

/// Current state file schema version
pub const STATE_VERSION: u32 = 3;

/// Load balancer topology attached to an environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LbType {
    Concourse,
    Cf,
}

impl LbType {
    /// Every type accepted by `--type`, in help-text order
    pub const ALL: [LbType; 2] = [LbType::Concourse, LbType::Cf];

    pub fn as_str(&self) -> &'static str {
        match self {
            LbType::Concourse => "concourse",
            LbType::Cf => "cf",
        }
    }

    /// Parse a `--type` flag value. Returns `None` for anything outside the fixed set.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl std::fmt::Display for LbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a stored LB type string denotes an attached load balancer.
///
/// Stacks created without a load balancer record `"none"`.
pub fn lb_exists(lb_type: &str) -> bool {
    !lb_type.is_empty() && lb_type != "none"
}

/// AWS credentials and region for the environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Aws {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
}

/// EC2 key pair used by the director VM
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyPair {
    pub name: String,
    pub private_key: String,
    pub public_key: String,
}

/// BOSH director coordinates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Bosh {
    pub director_name: String,
    pub director_username: String,
    pub director_password: String,
    pub director_address: String,
    #[serde(rename = "directorSSLCA")]
    pub director_ssl_ca: String,
}

/// CloudFormation stack backing a legacy environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stack {
    pub name: String,
    pub lb_type: String,
    pub certificate_name: String,
    #[serde(rename = "bOSHAZ")]
    pub bosh_az: String,
}

/// Load balancer configuration applied through terraform.
///
/// `cert`, `key` and `chain` hold file contents, never paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lb {
    #[serde(rename = "type")]
    pub lb_type: String,
    pub cert: String,
    pub key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub chain: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub domain: String,
}

/// The environment state aggregate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct State {
    pub version: u32,
    pub iaas: String,
    pub no_director: bool,
    pub aws: Aws,
    pub key_pair: KeyPair,
    pub bosh: Bosh,
    pub stack: Stack,
    pub lb: Lb,
    #[serde(rename = "envID")]
    pub env_id: String,
    #[serde(rename = "tfState")]
    pub tf_state: String,
}

impl State {
    /// Whether infrastructure is owned by terraform.
    ///
    /// An environment created through one backend is always updated through it.
    pub fn uses_terraform(&self) -> bool {
        !self.tf_state.is_empty()
    }

    /// The authoritative LB type for the active backend
    pub fn lb_type(&self) -> &str {
        if self.uses_terraform() {
            &self.lb.lb_type
        } else {
            &self.stack.lb_type
        }
    }

    /// Whether a BOSH director is deployed in this environment
    pub fn has_director(&self) -> bool {
        !self.no_director
    }

    pub fn is_empty(&self) -> bool {
        *self == State::default()
    }
}
