//! Environment state persistence
//!
//! The `State` aggregate is read once per command, mutated in memory, and
//! written back through a `StateStore`.

pub mod state;
pub mod store;

pub use state::{lb_exists, Aws, Bosh, KeyPair, Lb, LbType, Stack, State};
pub use store::{FileStateStore, StateStore, STATE_FILE};
