use crate::node_id::ReplicaId;
use getset::{CopyGetters, Getters};
#[cfg(feature = "serialize_serde")]
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Produces the options a single replica is started with.
pub trait ReplicaOptsFactory {
    fn create_replica_opts(&self, id: ReplicaId, locations: &[String]) -> ReplicaOpts;
}

/// The options a replica process is started with.
#[cfg_attr(feature = "serialize_serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Getters, CopyGetters)]
pub struct ReplicaOpts {
    #[get_copy = "pub"]
    pub(crate) id: ReplicaId,
    /// The locations of every replica, indexed by replica identity
    #[get = "pub"]
    pub(crate) locations: Vec<String>,
    /// Empty when the replica is honest
    #[get = "pub"]
    pub(crate) byzantine_strategy: String,
    #[get_copy = "pub"]
    pub(crate) use_tls: bool,
    #[get_copy = "pub"]
    pub(crate) batch_size: u32,
    #[get_copy = "pub"]
    pub(crate) timeout_multiplier: f32,
    #[get = "pub"]
    pub(crate) consensus: String,
    #[get = "pub"]
    pub(crate) crypto: String,
    #[get = "pub"]
    pub(crate) leader_rotation: String,
    #[get_copy = "pub"]
    pub(crate) connect_timeout: Duration,
    #[get_copy = "pub"]
    pub(crate) initial_timeout: Duration,
    #[get_copy = "pub"]
    pub(crate) timeout_samples: u32,
    #[get_copy = "pub"]
    pub(crate) max_timeout: Duration,
    #[get_copy = "pub"]
    pub(crate) shared_seed: i64,
    #[get = "pub"]
    pub(crate) modules: Vec<String>,
    #[get_copy = "pub"]
    pub(crate) branch_factor: u32,
    /// The replicas ordered by tree position. Empty outside of tree mode
    #[get = "pub"]
    pub(crate) tree_positions: Vec<ReplicaId>,
    #[get_copy = "pub"]
    pub(crate) tree_delta: Duration,
}

impl ReplicaOpts {
    /// The location of this replica, if locations are in use
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.locations.get(self.id.index()).map(String::as_str)
    }

    #[must_use]
    pub fn is_byzantine(&self) -> bool {
        !self.byzantine_strategy.is_empty()
    }

    pub fn set_byzantine_strategy(&mut self, strategy: impl Into<String>) {
        self.byzantine_strategy = strategy.into();
    }
}

/// A template [`ReplicaOpts`] (see [`crate::config::ExperimentConfig::create_replica_opts`])
/// produces the options of each replica by filling in the replica specific fields.
impl ReplicaOptsFactory for ReplicaOpts {
    fn create_replica_opts(&self, id: ReplicaId, locations: &[String]) -> ReplicaOpts {
        Self {
            id,
            locations: locations.to_vec(),
            byzantine_strategy: String::new(),
            ..self.clone()
        }
    }
}

/// The options a client process is started with.
#[cfg_attr(feature = "serialize_serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, CopyGetters)]
#[get_copy = "pub"]
pub struct ClientOpts {
    pub(crate) use_tls: bool,
    pub(crate) connect_timeout: Duration,
    pub(crate) payload_size: u32,
    pub(crate) max_concurrent: u32,
    /// Unlimited when absent
    pub(crate) rate_limit: Option<f64>,
    pub(crate) rate_step: f64,
    pub(crate) rate_step_interval: Duration,
    pub(crate) timeout: Duration,
}
