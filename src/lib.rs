//! Load Balancer Provisioning for bbl Environments
//!
//! Attaches, updates, removes and reports the load balancer of a BOSH
//! environment, on either a CloudFormation stack or terraform.

pub mod aws;
pub mod bosh;
pub mod certificates;
pub mod commands;
pub mod environment;
pub mod guid;
pub mod storage;
pub mod terraform;

#[cfg(test)]
mod fakes;

pub use commands::{
    Collaborators, CreateLbs, CreateLbsConfig, DeleteLbs, DeleteLbsConfig, Lbs, LbsError,
};
pub use storage::{FileStateStore, State, StateStore};
