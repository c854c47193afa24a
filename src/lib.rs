//! Resource assignment for byzantine fault tolerant consensus experiments.
//!
//! Turns the hosts and totals of an [`ExperimentConfig`] into the replicas and clients
//! each host runs, the identities they are started with, the place of every replica in
//! the communication tree and the byzantine strategy it follows.

pub mod assignment;
pub mod config;
pub mod distribution;
pub mod node_id;
pub mod options;
#[cfg(feature = "serialize_serde")]
pub mod serialize;
pub mod topology;

pub use assignment::{ClientMap, ReplicaMap};
pub use config::{ConfigError, ExperimentConfig, ExperimentConfigBuilder};
pub use node_id::{ClientId, ReplicaId};
pub use options::{ClientOpts, ReplicaOpts, ReplicaOptsFactory};
pub use topology::{Topology, Tree, TreeConfig};

/// The number of byzantine replicas `n` replicas tolerate
pub(crate) fn get_f_for_n(n: usize) -> usize {
    n.saturating_sub(1) / 3
}
