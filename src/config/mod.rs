mod test;

pub mod byzantine;
pub mod hosts;
pub mod timeouts;

use crate::config::byzantine::ByzantineStrategies;
use crate::config::timeouts::{TimeoutKind, Timeouts};
use crate::distribution::units_for_host;
use crate::node_id::ReplicaId;
use crate::options::{ClientOpts, ReplicaOpts};
use crate::topology::{Topology, Tree, TreeConfig};
use getset::{CopyGetters, Getters};
use indexmap::IndexMap;
#[cfg(feature = "serialize_serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn, Level};

/// A configuration that does not describe a runnable experiment.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Expected {expected} locations (one per replica), found {found}")]
    LocationCountMismatch { expected: u32, found: usize },
    #[error("Tree positions require a location for every replica")]
    TreeRequiresLocations,
    #[error("Tree positions require a branch factor greater than zero")]
    ZeroBranchFactor,
    #[error("Expected {expected} tree positions (one per replica), found {found}")]
    TreePositionCountMismatch { expected: u32, found: usize },
    #[error("Tree position {id} is not a replica (there are {replicas} replicas)")]
    TreePositionOutOfRange { id: ReplicaId, replicas: u32 },
    #[error("Replica {0} holds more than one tree position")]
    DuplicateTreePosition(ReplicaId),
    #[error("Byzantine strategy {strategy} names replica {id}, but there are {replicas} replicas")]
    ByzantineReplicaOutOfRange {
        strategy: String,
        id: ReplicaId,
        replicas: u32,
    },
    #[error("Replica {id} is assigned both the {first} and the {second} byzantine strategies")]
    ByzantineReplicaInMultipleStrategies {
        id: ReplicaId,
        first: String,
        second: String,
    },
    #[error("{name} must be a finite, non negative number, got {value}")]
    InvalidRate { name: &'static str, value: f64 },
    #[error("Unknown log level {0}")]
    InvalidLogLevel(String),
}

/// The consensus modules an experiment loads. The names are resolved by the replicas.
#[cfg_attr(feature = "serialize_serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize_serde", serde(default))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleSelection {
    pub consensus: String,
    pub crypto: String,
    pub leader_rotation: String,
    /// Additional modules to load
    pub modules: Vec<String>,
    /// Metrics to record
    pub metrics: Vec<String>,
}

#[cfg_attr(feature = "serialize_serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize_serde", serde(default))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClientTuning {
    /// Commands a client may have in flight at once
    pub max_concurrent: u32,
    /// Size, in bytes, of every command payload
    pub payload_size: u32,
    /// Commands per second a client may send. Unlimited when absent
    pub rate_limit: Option<f64>,
    /// Commands per second the rate limit grows by, every rate step interval
    pub rate_step: f64,
    /// Commands per batch
    pub batch_size: u32,
}

#[cfg_attr(feature = "serialize_serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize_serde", serde(default))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProfilingFlags {
    #[cfg_attr(feature = "serialize_serde", serde(rename = "cpu_profile"))]
    pub cpu: bool,
    #[cfg_attr(feature = "serialize_serde", serde(rename = "fgprof_profile"))]
    pub fgprof: bool,
    #[cfg_attr(feature = "serialize_serde", serde(rename = "mem_profile"))]
    pub mem: bool,
}

/// The raw experiment parameters, as produced by a configuration loader.
///
/// Nothing here is checked; [`ExperimentConfigBuilder::build`] validates the
/// parameters and turns them into an [`ExperimentConfig`].
#[cfg_attr(feature = "serialize_serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize_serde", serde(default))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExperimentConfigBuilder {
    pub replica_hosts: Vec<String>,
    pub client_hosts: Vec<String>,
    pub replicas: u32,
    pub clients: u32,
    pub locations: Vec<String>,
    pub byzantine_strategy: IndexMap<String, Vec<ReplicaId>>,

    pub tree_positions: Vec<ReplicaId>,
    pub branch_factor: u32,
    pub tree_delta: Duration,
    pub random_tree: bool,

    #[cfg_attr(feature = "serialize_serde", serde(flatten))]
    pub modules: ModuleSelection,

    pub cue: Option<PathBuf>,
    pub exe: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub ssh_config: Option<PathBuf>,

    #[cfg_attr(feature = "serialize_serde", serde(flatten))]
    pub profiling: ProfilingFlags,

    pub duration_samples: u32,

    #[cfg_attr(feature = "serialize_serde", serde(flatten))]
    pub client: ClientTuning,

    pub timeout_multiplier: f64,
    pub worker: bool,
    pub shared_seed: i64,
    pub trace: bool,
    pub log_level: String,
    pub use_tls: bool,

    pub client_timeout: Duration,
    pub connect_timeout: Duration,
    pub rate_step_interval: Duration,
    pub measurement_interval: Duration,
    pub duration: Duration,
    pub view_timeout: Duration,
    pub max_timeout: Duration,
}

/// The validated parameters of an experiment.
#[cfg_attr(feature = "serialize_serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serialize_serde",
    serde(try_from = "ExperimentConfigBuilder", into = "ExperimentConfigBuilder")
)]
#[derive(Clone, Debug, PartialEq, Getters, CopyGetters)]
pub struct ExperimentConfig {
    #[get = "pub"]
    replica_hosts: Vec<String>,
    #[get = "pub"]
    client_hosts: Vec<String>,
    #[get_copy = "pub"]
    replicas: u32,
    #[get_copy = "pub"]
    clients: u32,
    /// One location per replica, indexed by replica identity
    #[get = "pub"]
    locations: Vec<String>,
    #[get = "pub"]
    byzantine_strategies: ByzantineStrategies,
    #[get = "pub"]
    topology: Topology,
    #[get = "pub"]
    modules: ModuleSelection,
    #[get = "pub"]
    paths: ExperimentPaths,
    #[get_copy = "pub"]
    profiling: ProfilingFlags,
    #[get_copy = "pub"]
    duration_samples: u32,
    #[get = "pub"]
    client_tuning: ClientTuning,
    #[get_copy = "pub"]
    timeout_multiplier: f64,
    #[get_copy = "pub"]
    worker: bool,
    #[get_copy = "pub"]
    shared_seed: i64,
    #[get_copy = "pub"]
    trace: bool,
    log_level: Level,
    #[get_copy = "pub"]
    use_tls: bool,
    #[get = "pub"]
    timeouts: Timeouts,
}

/// Files the launcher needs. They are passed along untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Getters)]
#[get = "pub"]
pub struct ExperimentPaths {
    cue: Option<PathBuf>,
    exe: Option<PathBuf>,
    output: Option<PathBuf>,
    ssh_config: Option<PathBuf>,
}

impl ExperimentConfigBuilder {
    /// # [Errors]
    /// Returns a [`ConfigError`] when the parameters do not describe a runnable experiment
    pub fn build(self) -> Result<ExperimentConfig, ConfigError> {
        let log_level = parse_log_level(&self.log_level)?;

        if let Some(rate_limit) = self.client.rate_limit {
            check_rate("rate limit", rate_limit, f64::MAX)?;
        }

        check_rate("rate step", self.client.rate_step, f64::MAX)?;
        // Replicas receive the multiplier as an f32
        check_rate("timeout multiplier", self.timeout_multiplier, f64::from(f32::MAX))?;

        if !self.locations.is_empty() && self.locations.len() != self.replicas as usize {
            return Err(ConfigError::LocationCountMismatch {
                expected: self.replicas,
                found: self.locations.len(),
            });
        }

        let topology = self.build_topology()?;

        let byzantine_strategies =
            ByzantineStrategies::new(self.byzantine_strategy, self.replicas)?;

        let tolerated = crate::get_f_for_n(self.replicas as usize);

        if byzantine_strategies.byzantine_count() > tolerated {
            warn!(
                "{} byzantine replicas exceed the {} faults {} replicas tolerate",
                byzantine_strategies.byzantine_count(),
                tolerated,
                self.replicas
            );
        }

        if self.replicas > 0 && self.replica_hosts.is_empty() {
            warn!("{} replicas declared without any replica host", self.replicas);
        }

        if self.clients > 0 && self.client_hosts.is_empty() {
            warn!("{} clients declared without any client host", self.clients);
        }

        let timeouts = Timeouts::default()
            .with(TimeoutKind::Connect, self.connect_timeout)
            .with(TimeoutKind::Client, self.client_timeout)
            .with(TimeoutKind::View, self.view_timeout)
            .with(TimeoutKind::Max, self.max_timeout)
            .with(TimeoutKind::RateStepInterval, self.rate_step_interval)
            .with(TimeoutKind::MeasurementInterval, self.measurement_interval)
            .with(TimeoutKind::Experiment, self.duration);

        debug!(
            "Built experiment config with {} replicas on {} hosts and {} clients on {} hosts",
            self.replicas,
            self.replica_hosts.len(),
            self.clients,
            self.client_hosts.len()
        );

        Ok(ExperimentConfig {
            replica_hosts: self.replica_hosts,
            client_hosts: self.client_hosts,
            replicas: self.replicas,
            clients: self.clients,
            locations: self.locations,
            byzantine_strategies,
            topology,
            modules: self.modules,
            paths: ExperimentPaths {
                cue: self.cue,
                exe: self.exe,
                output: self.output,
                ssh_config: self.ssh_config,
            },
            profiling: self.profiling,
            duration_samples: self.duration_samples,
            client_tuning: self.client,
            timeout_multiplier: self.timeout_multiplier,
            worker: self.worker,
            shared_seed: self.shared_seed,
            trace: self.trace,
            log_level,
            use_tls: self.use_tls,
            timeouts,
        })
    }

    fn build_topology(&self) -> Result<Topology, ConfigError> {
        if self.tree_positions.is_empty() {
            return Ok(Topology::Flat);
        }

        if self.branch_factor == 0 {
            return Err(ConfigError::ZeroBranchFactor);
        }

        if self.locations.is_empty() {
            return Err(ConfigError::TreeRequiresLocations);
        }

        if self.tree_positions.len() != self.replicas as usize {
            return Err(ConfigError::TreePositionCountMismatch {
                expected: self.replicas,
                found: self.tree_positions.len(),
            });
        }

        let mut seen = HashSet::with_capacity(self.tree_positions.len());

        for id in &self.tree_positions {
            if id.0 == 0 || id.0 > self.replicas {
                return Err(ConfigError::TreePositionOutOfRange {
                    id: *id,
                    replicas: self.replicas,
                });
            }

            if !seen.insert(*id) {
                return Err(ConfigError::DuplicateTreePosition(*id));
            }
        }

        Ok(Topology::Tree(TreeConfig::new(
            self.tree_positions.clone(),
            self.branch_factor,
            self.tree_delta,
            self.random_tree,
        )))
    }
}

impl TryFrom<ExperimentConfigBuilder> for ExperimentConfig {
    type Error = ConfigError;

    fn try_from(builder: ExperimentConfigBuilder) -> Result<Self, Self::Error> {
        builder.build()
    }
}

impl From<ExperimentConfig> for ExperimentConfigBuilder {
    fn from(config: ExperimentConfig) -> Self {
        let (tree_positions, branch_factor, tree_delta, random_tree) = match &config.topology {
            Topology::Flat => (Vec::new(), 0, Duration::ZERO, false),
            Topology::Tree(tree) => (
                tree.positions().clone(),
                tree.branch_factor(),
                tree.delta(),
                tree.randomize(),
            ),
        };

        let byzantine_strategy = config
            .byzantine_strategies
            .iter()
            .map(|(strategy, ids)| (strategy.to_string(), ids.iter().copied().collect()))
            .collect();

        let ExperimentPaths {
            cue,
            exe,
            output,
            ssh_config,
        } = config.paths;

        Self {
            replica_hosts: config.replica_hosts,
            client_hosts: config.client_hosts,
            replicas: config.replicas,
            clients: config.clients,
            locations: config.locations,
            byzantine_strategy,
            tree_positions,
            branch_factor,
            tree_delta,
            random_tree,
            modules: config.modules,
            cue,
            exe,
            output,
            ssh_config,
            profiling: config.profiling,
            duration_samples: config.duration_samples,
            client: config.client_tuning,
            timeout_multiplier: config.timeout_multiplier,
            worker: config.worker,
            shared_seed: config.shared_seed,
            trace: config.trace,
            log_level: config.log_level.to_string(),
            use_tls: config.use_tls,
            client_timeout: config.timeouts.client(),
            connect_timeout: config.timeouts.connect(),
            rate_step_interval: config.timeouts.rate_step_interval(),
            measurement_interval: config.timeouts.measurement_interval(),
            duration: config.timeouts.experiment(),
            view_timeout: config.timeouts.view(),
            max_timeout: config.timeouts.max(),
        }
    }
}

impl ExperimentConfig {
    /// The number of replicas the replica host at `host_index` runs
    #[must_use]
    pub fn replicas_for_host(&self, host_index: usize) -> u32 {
        units_for_host(host_index, self.replicas, self.replica_hosts.len())
    }

    /// The number of clients the client host at `host_index` runs
    #[must_use]
    pub fn clients_for_host(&self, host_index: usize) -> u32 {
        units_for_host(host_index, self.clients, self.client_hosts.len())
    }

    /// The replicas ordered by tree position, the root first.
    /// Empty when replicas are not laid out in a tree.
    #[must_use]
    pub fn tree_pos_ids(&self) -> Vec<ReplicaId> {
        self.topology
            .tree_config()
            .map(|tree| tree.positioned_ids(self.shared_seed))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn tree(&self) -> Option<Tree> {
        self.topology
            .tree_config()
            .map(|tree| Tree::new(tree.branch_factor(), tree.positioned_ids(self.shared_seed)))
    }

    #[must_use]
    pub fn log_level(&self) -> Level {
        self.log_level
    }

    /// The options every replica shares. Use it as the [`crate::options::ReplicaOptsFactory`]
    /// of [`ExperimentConfig::assign_replicas`].
    #[must_use]
    pub fn create_replica_opts(&self) -> ReplicaOpts {
        let (branch_factor, tree_delta) = self
            .topology
            .tree_config()
            .map_or((0, Duration::ZERO), |tree| (tree.branch_factor(), tree.delta()));

        ReplicaOpts {
            use_tls: self.use_tls,
            batch_size: self.client_tuning.batch_size,
            timeout_multiplier: self.timeout_multiplier as f32,
            consensus: self.modules.consensus.clone(),
            crypto: self.modules.crypto.clone(),
            leader_rotation: self.modules.leader_rotation.clone(),
            connect_timeout: self.timeouts.connect(),
            initial_timeout: self.timeouts.view(),
            timeout_samples: self.duration_samples,
            max_timeout: self.timeouts.max(),
            shared_seed: self.shared_seed,
            modules: self.modules.modules.clone(),
            branch_factor,
            tree_positions: self.tree_pos_ids(),
            tree_delta,
            ..ReplicaOpts::default()
        }
    }

    #[must_use]
    pub fn create_client_opts(&self) -> ClientOpts {
        ClientOpts {
            use_tls: self.use_tls,
            connect_timeout: self.timeouts.connect(),
            payload_size: self.client_tuning.payload_size,
            max_concurrent: self.client_tuning.max_concurrent,
            rate_limit: self.client_tuning.rate_limit,
            rate_step: self.client_tuning.rate_step,
            rate_step_interval: self.timeouts.rate_step_interval(),
            timeout: self.timeouts.client(),
        }
    }
}

fn parse_log_level(level: &str) -> Result<Level, ConfigError> {
    if level.trim().is_empty() {
        return Ok(Level::INFO);
    }

    Level::from_str(level.trim()).map_err(|_| ConfigError::InvalidLogLevel(level.to_string()))
}

fn check_rate(name: &'static str, value: f64, max: f64) -> Result<(), ConfigError> {
    if (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidRate { name, value })
    }
}
