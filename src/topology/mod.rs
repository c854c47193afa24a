
use crate::node_id::ReplicaId;
use getset::{CopyGetters, Getters};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
#[cfg(feature = "serialize_serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// How replicas talk to each other during the experiment.
#[cfg_attr(feature = "serialize_serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Topology {
    /// Every replica talks to every other replica
    #[default]
    Flat,
    /// Replicas are laid out in an array backed tree
    Tree(TreeConfig),
}

/// The declared shape of the communication tree.
///
/// `positions[i]` is the replica sitting at tree position `i`, so
/// `positions[0]` is the root, `positions[1..=branch_factor]` its children, etc.
#[cfg_attr(feature = "serialize_serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Getters, CopyGetters)]
pub struct TreeConfig {
    #[get = "pub"]
    positions: Vec<ReplicaId>,
    #[get_copy = "pub"]
    branch_factor: u32,
    /// Wait time of intermediate nodes, per level below them
    #[get_copy = "pub"]
    delta: Duration,
    /// Shuffle the declared positions (with the shared seed) before use
    #[get_copy = "pub"]
    randomize: bool,
}

impl TreeConfig {
    #[must_use]
    pub fn new(positions: Vec<ReplicaId>, branch_factor: u32, delta: Duration, randomize: bool) -> Self {
        Self {
            positions,
            branch_factor,
            delta,
            randomize,
        }
    }

    /// The replica identities ordered by tree position.
    ///
    /// When the tree is randomized, the declared positions are shuffled with a
    /// generator seeded from `shared_seed`, so every node of the experiment
    /// derives the same tree.
    #[must_use]
    pub fn positioned_ids(&self, shared_seed: i64) -> Vec<ReplicaId> {
        let mut ids = self.positions.clone();

        if self.randomize {
            let mut rng = ChaCha8Rng::seed_from_u64(shared_seed as u64);

            ids.shuffle(&mut rng);
        }

        ids
    }
}

impl Topology {
    #[must_use]
    pub fn is_tree(&self) -> bool {
        matches!(self, Self::Tree(_))
    }

    #[must_use]
    pub fn tree_config(&self) -> Option<&TreeConfig> {
        match self {
            Self::Flat => None,
            Self::Tree(config) => Some(config),
        }
    }
}

/// An array backed tree of replicas.
///
/// The replica at position `i` has its parent at `(i - 1) / branch_factor` and its
/// children at `i * branch_factor + 1 ..= i * branch_factor + branch_factor`.
#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct Tree {
    #[get_copy = "pub"]
    branch_factor: usize,
    #[get = "pub"]
    positioned_ids: Vec<ReplicaId>,
    id_to_position: HashMap<ReplicaId, usize>,
}

impl Tree {
    /// A branch factor of zero is treated as one.
    #[must_use]
    pub fn new(branch_factor: u32, positioned_ids: Vec<ReplicaId>) -> Self {
        let id_to_position = positioned_ids
            .iter()
            .enumerate()
            .map(|(position, id)| (*id, position))
            .collect();

        Self {
            branch_factor: (branch_factor as usize).max(1),
            positioned_ids,
            id_to_position,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positioned_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positioned_ids.is_empty()
    }

    #[must_use]
    pub fn root(&self) -> Option<ReplicaId> {
        self.positioned_ids.first().copied()
    }

    #[must_use]
    pub fn is_root(&self, id: ReplicaId) -> bool {
        self.position_of(id) == Some(0)
    }

    #[must_use]
    pub fn position_of(&self, id: ReplicaId) -> Option<usize> {
        self.id_to_position.get(&id).copied()
    }

    /// The parent of `id`. The root (and unknown replicas) have none.
    #[must_use]
    pub fn parent(&self, id: ReplicaId) -> Option<ReplicaId> {
        match self.position_of(id)? {
            0 => None,
            position => Some(self.positioned_ids[(position - 1) / self.branch_factor]),
        }
    }

    #[must_use]
    pub fn children_of(&self, id: ReplicaId) -> Vec<ReplicaId> {
        let Some(position) = self.position_of(id) else {
            return Vec::new();
        };

        self.child_positions(position, position)
            .map(|child| self.positioned_ids[child])
            .collect()
    }

    /// The replicas sharing a parent with `id`, `id` included.
    /// The root is its own only peer.
    #[must_use]
    pub fn peers_of(&self, id: ReplicaId) -> Vec<ReplicaId> {
        match self.parent(id) {
            Some(parent) => self.children_of(parent),
            None if self.position_of(id).is_some() => vec![id],
            None => Vec::new(),
        }
    }

    /// Every replica below `id`, in position order. `id` itself is excluded.
    #[must_use]
    pub fn subtree(&self, id: ReplicaId) -> Vec<ReplicaId> {
        let Some(position) = self.position_of(id) else {
            return Vec::new();
        };

        let mut descendants = Vec::new();
        let (mut first, mut last) = (position, position);

        loop {
            let level = self.child_positions(first, last);

            if level.is_empty() {
                break;
            }

            first = level.start;
            last = level.end - 1;

            descendants.extend(level.map(|child| self.positioned_ids[child]));
        }

        descendants
    }

    /// The number of levels in the tree.
    #[must_use]
    pub fn height(&self) -> usize {
        self.root().map_or(0, |root| self.replica_height(root))
    }

    /// The number of levels of the subtree rooted at `id`. Leaves have height 1,
    /// unknown replicas 0.
    #[must_use]
    pub fn replica_height(&self, id: ReplicaId) -> usize {
        let Some(position) = self.position_of(id) else {
            return 0;
        };

        let mut height = 1;
        let (mut first, mut last) = (position, position);

        loop {
            let level = self.child_positions(first, last);

            if level.is_empty() {
                break height;
            }

            height += 1;
            first = level.start;
            last = level.end - 1;
        }
    }

    /// How long `id` waits for its subtree before aggregating. Leaves do not wait.
    #[must_use]
    pub fn aggregation_wait(&self, id: ReplicaId, delta: Duration) -> Duration {
        let levels_below = self.replica_height(id).saturating_sub(1);

        delta.saturating_mul(u32::try_from(levels_below).unwrap_or(u32::MAX))
    }

    /// The positions of the children of every position in `first..=last`
    fn child_positions(&self, first: usize, last: usize) -> std::ops::Range<usize> {
        let len = self.len();

        let start = first
            .saturating_mul(self.branch_factor)
            .saturating_add(1)
            .min(len);
        let end = last
            .saturating_mul(self.branch_factor)
            .saturating_add(self.branch_factor)
            .saturating_add(1)
            .min(len);

        start..end
    }
}
