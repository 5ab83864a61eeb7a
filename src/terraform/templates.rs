//! Terraform templates bundled into the binary

use crate::storage::LbType;

const BASE: &str = include_str!("../../templates/terraform/base.tf");
const CONCOURSE_LB: &str = include_str!("../../templates/terraform/concourse_lb.tf");
const CF_LB: &str = include_str!("../../templates/terraform/cf_lb.tf");
const CF_DNS: &str = include_str!("../../templates/terraform/cf_dns.tf");

/// Assemble the template for an environment.
///
/// `lb_type` of `None` yields the base network only. The DNS zone is only
/// part of a cf template when a system domain is set.
pub fn template(lb_type: Option<LbType>, with_domain: bool) -> String {
    let mut parts = vec![BASE];
    match lb_type {
        Some(LbType::Concourse) => parts.push(CONCOURSE_LB),
        Some(LbType::Cf) => {
            parts.push(CF_LB);
            if with_domain {
                parts.push(CF_DNS);
            }
        }
        None => {}
    }
    parts.join("\n")
}
