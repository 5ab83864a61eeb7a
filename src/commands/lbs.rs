//! lbs
//!
//! Reports the load balancer attached to an environment.

use serde_json::json;
use std::collections::BTreeMap;

use super::error::LbsError;
use super::{Backend, Collaborators};
use crate::storage::{lb_exists, State};

/// Stack outputs shown for each legacy LB type: (label, name output, URL output)
const CONCOURSE_STACK_LBS: [(&str, &str, &str); 1] =
    [("Concourse LB", "ConcourseLoadBalancer", "ConcourseLoadBalancerURL")];
const CF_STACK_LBS: [(&str, &str, &str); 2] = [
    ("CF Router LB", "CFRouterLoadBalancer", "CFRouterLoadBalancerURL"),
    ("CF SSH Proxy LB", "CFSSHProxyLoadBalancer", "CFSSHProxyLoadBalancerURL"),
];

pub struct Lbs {
    collaborators: Collaborators,
}

impl Lbs {
    pub fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }

    /// Render the report for `state`, as text or as JSON
    pub async fn execute(&self, state: &State, as_json: bool) -> Result<String, LbsError> {
        if !lb_exists(state.lb_type()) {
            return Err(LbsError::NoLbsFound);
        }

        match Backend::of(state) {
            Backend::Stack => self.stack_report(state, as_json).await,
            Backend::Terraform => self.terraform_report(state, as_json).await,
        }
    }

    async fn stack_report(&self, state: &State, as_json: bool) -> Result<String, LbsError> {
        let stack = self
            .collaborators
            .stack_manager
            .describe(&state.stack.name)
            .await?;

        let lbs: &[(&str, &str, &str)] = match state.stack.lb_type.as_str() {
            "concourse" => &CONCOURSE_STACK_LBS,
            "cf" => &CF_STACK_LBS,
            _ => &[],
        };

        let output = |key: &str| stack.outputs.get(key).cloned().unwrap_or_default();

        if as_json {
            let report: BTreeMap<&str, serde_json::Value> = lbs
                .iter()
                .map(|(_, name, url)| {
                    (*name, json!({ "name": output(*name), "url": output(*url) }))
                })
                .collect();
            return Ok(serde_json::to_string_pretty(&report).map_err(anyhow::Error::from)?);
        }

        Ok(lbs
            .iter()
            .map(|(label, name, url)| format!("{label}: {} [{}]", output(*name), output(*url)))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn terraform_report(&self, state: &State, as_json: bool) -> Result<String, LbsError> {
        let outputs = self
            .collaborators
            .output_provider
            .get(&state.tf_state, &state.lb.lb_type, !state.lb.domain.is_empty())
            .await?;

        if as_json {
            return Ok(serde_json::to_string_pretty(&outputs).map_err(anyhow::Error::from)?);
        }

        let lines = match state.lb.lb_type.as_str() {
            "cf" => {
                let mut lines = vec![
                    format!("CF Router LB: {}", outputs.router_lb_ip),
                    format!("CF SSH Proxy LB: {}", outputs.ssh_proxy_lb_ip),
                    format!("CF TCP Router LB: {}", outputs.tcp_router_lb_ip),
                    format!("CF WebSocket LB: {}", outputs.web_socket_lb_ip),
                ];
                if !outputs.system_domain_dns_servers.is_empty() {
                    lines.push(format!(
                        "CF System Domain DNS servers: {}",
                        outputs.system_domain_dns_servers.join(" ")
                    ));
                }
                lines
            }
            "concourse" => vec![format!("Concourse LB: {}", outputs.concourse_lb_ip)],
            _ => Vec::new(),
        };

        Ok(lines.join("\n"))
    }
}
