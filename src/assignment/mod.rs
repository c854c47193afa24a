
use crate::config::ExperimentConfig;
use crate::node_id::{ClientId, ReplicaId};
use crate::options::{ReplicaOpts, ReplicaOptsFactory};
use indexmap::IndexMap;
use tracing::{debug, trace};

/// The replicas each host runs, in the order the hosts were declared.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReplicaMap {
    hosts: IndexMap<String, Vec<ReplicaOpts>>,
}

/// The clients each host runs, in the order the hosts were declared.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientMap {
    hosts: IndexMap<String, Vec<ClientId>>,
}

impl ExperimentConfig {
    /// Spreads the replicas over the replica hosts.
    ///
    /// Identities are handed out sequentially from 1, following the declared host order.
    /// `factory` builds the options of each replica, which are then tagged with the
    /// byzantine strategy of that replica (if any).
    pub fn assign_replicas<F>(&self, factory: &F) -> ReplicaMap
    where
        F: ReplicaOptsFactory + ?Sized,
    {
        let mut hosts_to_replicas = ReplicaMap::default();
        let mut next_replica_id = ReplicaId::FIRST;

        for (host_index, host) in self.replica_hosts().iter().enumerate() {
            let num_replicas = self.replicas_for_host(host_index);

            debug!("Assigning {} replicas to host {}", num_replicas, host);

            for _ in 0..num_replicas {
                let mut replica_opts =
                    factory.create_replica_opts(next_replica_id, self.locations());

                if let Some(strategy) = self.byzantine_strategies().strategy_for(next_replica_id) {
                    trace!("Replica {} runs byzantine strategy {}", next_replica_id, strategy);

                    replica_opts.set_byzantine_strategy(strategy);
                }

                hosts_to_replicas.push(host, replica_opts);
                next_replica_id = next_replica_id.next();
            }
        }

        hosts_to_replicas
    }

    /// Spreads the clients over the client hosts, handing out identities
    /// sequentially from 1.
    #[must_use]
    pub fn assign_clients(&self) -> ClientMap {
        let mut hosts_to_clients = ClientMap::default();
        let mut next_client_id = ClientId::FIRST;

        for (host_index, host) in self.client_hosts().iter().enumerate() {
            let num_clients = self.clients_for_host(host_index);

            debug!("Assigning {} clients to host {}", num_clients, host);

            for _ in 0..num_clients {
                hosts_to_clients.push(host, next_client_id);
                next_client_id = next_client_id.next();
            }
        }

        hosts_to_clients
    }
}

impl ReplicaMap {
    fn push(&mut self, host: &str, replica_opts: ReplicaOpts) {
        self.hosts
            .entry(host.to_string())
            .or_default()
            .push(replica_opts);
    }

    /// The identities of the replicas running on `host`
    #[must_use]
    pub fn replica_ids(&self, host: &str) -> Vec<ReplicaId> {
        self.get(host).iter().map(ReplicaOpts::id).collect()
    }

    /// The options of the replicas running on `host`
    #[must_use]
    pub fn get(&self, host: &str) -> &[ReplicaOpts] {
        self.hosts.get(host).map(Vec::as_slice).unwrap_or_default()
    }

    /// The hosts running at least one replica
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ReplicaOpts])> {
        self.hosts
            .iter()
            .map(|(host, replicas)| (host.as_str(), replicas.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    #[must_use]
    pub fn total_replicas(&self) -> usize {
        self.hosts.values().map(Vec::len).sum()
    }
}

impl ClientMap {
    fn push(&mut self, host: &str, client_id: ClientId) {
        self.hosts
            .entry(host.to_string())
            .or_default()
            .push(client_id);
    }

    /// The identities of the clients running on `host`
    #[must_use]
    pub fn client_ids(&self, host: &str) -> Vec<ClientId> {
        self.hosts.get(host).cloned().unwrap_or_default()
    }

    /// The hosts running at least one client
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ClientId])> {
        self.hosts
            .iter()
            .map(|(host, clients)| (host.as_str(), clients.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    #[must_use]
    pub fn total_clients(&self) -> usize {
        self.hosts.values().map(Vec::len).sum()
    }
}

impl IntoIterator for ReplicaMap {
    type Item = (String, Vec<ReplicaOpts>);
    type IntoIter = indexmap::map::IntoIter<String, Vec<ReplicaOpts>>;

    fn into_iter(self) -> Self::IntoIter {
        self.hosts.into_iter()
    }
}

impl IntoIterator for ClientMap {
    type Item = (String, Vec<ClientId>);
    type IntoIter = indexmap::map::IntoIter<String, Vec<ClientId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.hosts.into_iter()
    }
}
