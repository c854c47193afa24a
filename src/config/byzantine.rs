use crate::config::ConfigError;
use crate::node_id::ReplicaId;
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};

/// The byzantine strategies of an experiment, and the replicas running each of them.
///
/// Every replica runs at most one strategy, so the strategy of a replica is
/// always well defined.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ByzantineStrategies {
    strategies: IndexMap<String, BTreeSet<ReplicaId>>,
    by_replica: HashMap<ReplicaId, String>,
}

impl ByzantineStrategies {
    /// # [Errors]
    /// Fails when a replica is outside of `1..=replicas` or is listed under
    /// more than one strategy.
    pub fn new<I, S>(strategies: I, replicas: u32) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (S, Vec<ReplicaId>)>,
        S: Into<String>,
    {
        let mut by_replica: HashMap<ReplicaId, String> = HashMap::new();
        let mut by_strategy = IndexMap::new();

        for (strategy, ids) in strategies {
            let strategy = strategy.into();

            for id in &ids {
                if id.0 == 0 || id.0 > replicas {
                    return Err(ConfigError::ByzantineReplicaOutOfRange {
                        strategy,
                        id: *id,
                        replicas,
                    });
                }

                if let Some(first) = by_replica.get(id) {
                    if *first != strategy {
                        return Err(ConfigError::ByzantineReplicaInMultipleStrategies {
                            id: *id,
                            first: first.clone(),
                            second: strategy,
                        });
                    }

                    continue;
                }

                by_replica.insert(*id, strategy.clone());
            }

            by_strategy
                .entry(strategy)
                .or_insert_with(BTreeSet::new)
                .extend(ids);
        }

        Ok(Self {
            strategies: by_strategy,
            by_replica,
        })
    }

    /// The strategy `id` runs, if any
    #[must_use]
    pub fn strategy_for(&self, id: ReplicaId) -> Option<&str> {
        self.by_replica.get(&id).map(String::as_str)
    }

    #[must_use]
    pub fn replicas_for(&self, strategy: &str) -> Option<&BTreeSet<ReplicaId>> {
        self.strategies.get(strategy)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<ReplicaId>)> {
        self.strategies
            .iter()
            .map(|(strategy, ids)| (strategy.as_str(), ids))
    }

    /// How many replicas are byzantine, across all strategies
    #[must_use]
    pub fn byzantine_count(&self) -> usize {
        self.by_replica.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_replica.is_empty()
    }
}
