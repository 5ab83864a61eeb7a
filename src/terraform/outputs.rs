//! Terraform Output Extraction
//!
//! Reads typed infrastructure facts out of an opaque terraform state. The
//! keys read depend on the LB type; extraction is all-or-nothing and stops
//! at the first output that cannot be read.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use super::executor::Executor;

const DNS_SERVER_SEPARATOR: &str = ",\n";

/// Infrastructure facts extracted from terraform state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Outputs {
    #[serde(skip)]
    pub external_ip: String,
    #[serde(skip)]
    pub network_name: String,
    #[serde(skip)]
    pub subnetwork_name: String,
    #[serde(skip)]
    pub bosh_tag: String,
    #[serde(skip)]
    pub internal_tag: String,
    #[serde(skip)]
    pub director_address: String,
    #[serde(skip)]
    pub router_backend_service: String,
    #[serde(skip)]
    pub ssh_proxy_target_pool: String,
    #[serde(skip)]
    pub tcp_router_target_pool: String,
    #[serde(skip)]
    pub ws_target_pool: String,
    #[serde(skip)]
    pub concourse_target_pool: String,
    #[serde(rename = "cf_router_lb", skip_serializing_if = "String::is_empty")]
    pub router_lb_ip: String,
    #[serde(rename = "cf_ssh_proxy_lb", skip_serializing_if = "String::is_empty")]
    pub ssh_proxy_lb_ip: String,
    #[serde(rename = "cf_tcp_router_lb", skip_serializing_if = "String::is_empty")]
    pub tcp_router_lb_ip: String,
    #[serde(rename = "cf_websocket_lb", skip_serializing_if = "String::is_empty")]
    pub web_socket_lb_ip: String,
    #[serde(skip)]
    pub concourse_lb_ip: String,
    #[serde(
        rename = "cf_system_domain_dns_servers",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub system_domain_dns_servers: Vec<String>,
}

/// Extracts `Outputs` through a terraform `Executor`
#[derive(Clone)]
pub struct OutputProvider {
    executor: Arc<dyn Executor>,
}

impl OutputProvider {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    /// Outputs for `tf_state`. An empty state has nothing applied yet and
    /// yields empty outputs.
    pub async fn get(&self, tf_state: &str, lb_type: &str, domain_exists: bool) -> Result<Outputs> {
        if tf_state.is_empty() {
            return Ok(Outputs::default());
        }

        let executor = self.executor.as_ref();
        let output = move |name: &'static str| executor.output(tf_state, name);

        let mut outputs = Outputs {
            external_ip: output("external_ip").await?,
            network_name: output("network_name").await?,
            subnetwork_name: output("subnetwork_name").await?,
            bosh_tag: output("bosh_open_tag_name").await?,
            internal_tag: output("internal_tag_name").await?,
            director_address: output("director_address").await?,
            ..Default::default()
        };

        match lb_type {
            "cf" => {
                outputs.router_backend_service = output("router_backend_service").await?;
                outputs.ssh_proxy_target_pool = output("ssh_proxy_target_pool").await?;
                outputs.tcp_router_target_pool = output("tcp_router_target_pool").await?;
                outputs.ws_target_pool = output("ws_target_pool").await?;
                outputs.router_lb_ip = output("router_lb_ip").await?;
                outputs.ssh_proxy_lb_ip = output("ssh_proxy_lb_ip").await?;
                outputs.tcp_router_lb_ip = output("tcp_router_lb_ip").await?;
                outputs.web_socket_lb_ip = output("ws_lb_ip").await?;

                if domain_exists {
                    outputs.system_domain_dns_servers = output("system_domain_dns_servers")
                        .await?
                        .split(DNS_SERVER_SEPARATOR)
                        .map(str::to_string)
                        .collect();
                }
            }
            "concourse" => {
                outputs.concourse_target_pool = output("concourse_target_pool").await?;
                outputs.concourse_lb_ip = output("concourse_lb_ip").await?;
            }
            _ => {}
        }

        debug!(lb_type = %lb_type, "Extracted terraform outputs");
        Ok(outputs)
    }
}
