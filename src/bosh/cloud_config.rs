//! Cloud Config Generation
//!
//! Builds the BOSH cloud config for an environment. Load balancer VM
//! extensions come from the stack outputs on a legacy environment and from
//! terraform outputs otherwise.

use anyhow::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::aws::{AvailabilityZoneRetriever, StackManager};
use crate::storage::State;
use crate::terraform::OutputProvider;

const CONCOURSE_LB_OUTPUT: &str = "ConcourseLoadBalancer";
const CF_ROUTER_LB_OUTPUT: &str = "CFRouterLoadBalancer";
const CF_SSH_PROXY_LB_OUTPUT: &str = "CFSSHProxyLoadBalancer";
const BOSH_SUBNET_OUTPUT: &str = "BOSHSubnet";
const INTERNAL_SECURITY_GROUP_OUTPUT: &str = "InternalSecurityGroup";

/// Renders cloud configs from live infrastructure facts
pub struct CloudConfigGenerator {
    zones: Arc<dyn AvailabilityZoneRetriever>,
    stacks: Arc<dyn StackManager>,
    outputs: OutputProvider,
}

struct Network {
    subnet: String,
    security_group: String,
}

fn lb_extension(name: &str, elb: &str) -> Value {
    json!({ "name": name, "cloud_properties": { "elbs": [elb] } })
}

fn vm_types() -> Value {
    json!([
        {
            "name": "default",
            "cloud_properties": {
                "instance_type": "m3.medium",
                "ephemeral_disk": { "size": 10240, "type": "gp2" },
            },
        },
        {
            "name": "large",
            "cloud_properties": {
                "instance_type": "m3.large",
                "ephemeral_disk": { "size": 51200, "type": "gp2" },
            },
        },
    ])
}

impl CloudConfigGenerator {
    pub fn new(
        zones: Arc<dyn AvailabilityZoneRetriever>,
        stacks: Arc<dyn StackManager>,
        outputs: OutputProvider,
    ) -> Self {
        Self {
            zones,
            stacks,
            outputs,
        }
    }

    /// Render the cloud config for `state`. The result is JSON, which BOSH
    /// accepts as YAML.
    pub async fn generate(&self, state: &State) -> Result<Value> {
        let zones = self.zones.retrieve(&state.aws.region).await?;

        let (network, vm_extensions) = if state.uses_terraform() {
            self.terraform_facts(state).await?
        } else {
            self.stack_facts(state).await?
        };

        let azs: Vec<Value> = zones
            .iter()
            .enumerate()
            .map(|(i, zone)| {
                json!({
                    "name": format!("z{}", i + 1),
                    "cloud_properties": { "availability_zone": zone },
                })
            })
            .collect();
        let az_names: Vec<String> = (1..=zones.len()).map(|i| format!("z{i}")).collect();

        debug!(lb_type = %state.lb_type(), zones = zones.len(), "Generated cloud config");

        Ok(json!({
            "azs": azs,
            "compilation": {
                "workers": 5,
                "network": "private",
                "az": az_names.first().cloned().unwrap_or_default(),
                "reuse_compilation_vms": true,
                "vm_type": "default",
            },
            "networks": [{
                "name": "private",
                "type": "manual",
                "subnets": [{
                    "range": "10.0.16.0/20",
                    "gateway": "10.0.16.1",
                    "azs": az_names,
                    "reserved": ["10.0.16.2-10.0.16.3", "10.0.31.255"],
                    "static": ["10.0.31.190-10.0.31.254"],
                    "cloud_properties": {
                        "subnet": network.subnet,
                        "security_groups": [network.security_group],
                    },
                }],
            }],
            "vm_types": vm_types(),
            "disk_types": [
                { "name": "default", "disk_size": 5120, "cloud_properties": { "type": "gp2" } },
            ],
            "vm_extensions": vm_extensions,
        }))
    }

    async fn stack_facts(&self, state: &State) -> Result<(Network, Vec<Value>)> {
        let stack = self.stacks.describe(&state.stack.name).await?;
        let output = |key: &str| stack.outputs.get(key).cloned().unwrap_or_default();

        let extensions = match state.stack.lb_type.as_str() {
            "concourse" => vec![lb_extension("lb", &output(CONCOURSE_LB_OUTPUT))],
            "cf" => vec![
                lb_extension("router-lb", &output(CF_ROUTER_LB_OUTPUT)),
                lb_extension("ssh-proxy-lb", &output(CF_SSH_PROXY_LB_OUTPUT)),
            ],
            _ => Vec::new(),
        };

        let network = Network {
            subnet: output(BOSH_SUBNET_OUTPUT),
            security_group: output(INTERNAL_SECURITY_GROUP_OUTPUT),
        };
        Ok((network, extensions))
    }

    async fn terraform_facts(&self, state: &State) -> Result<(Network, Vec<Value>)> {
        let outputs = self
            .outputs
            .get(&state.tf_state, &state.lb.lb_type, !state.lb.domain.is_empty())
            .await?;

        let extensions = match state.lb.lb_type.as_str() {
            "concourse" => vec![lb_extension("lb", &outputs.concourse_target_pool)],
            "cf" => vec![
                lb_extension("router-lb", &outputs.router_backend_service),
                lb_extension("ssh-proxy-lb", &outputs.ssh_proxy_target_pool),
                lb_extension("tcp-router-lb", &outputs.tcp_router_target_pool),
                lb_extension("ws-lb", &outputs.ws_target_pool),
            ],
            _ => Vec::new(),
        };

        let network = Network {
            subnet: outputs.subnetwork_name,
            security_group: outputs.internal_tag,
        };
        Ok((network, extensions))
    }
}
