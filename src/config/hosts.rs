use crate::config::ExperimentConfig;
use indexmap::IndexSet;

pub const LOCALHOST: &str = "localhost";
pub const LOOPBACK_V4: &str = "127.0.0.1";

impl ExperimentConfig {
    /// Whether the whole experiment runs on this machine: a single replica host and a
    /// single client host, both `localhost` or both `127.0.0.1`.
    #[must_use]
    pub fn is_local(&self) -> bool {
        match (self.replica_hosts.as_slice(), self.client_hosts.as_slice()) {
            ([replica_host], [client_host]) => {
                (replica_host == LOCALHOST && client_host == LOCALHOST)
                    || (replica_host == LOOPBACK_V4 && client_host == LOOPBACK_V4)
            }
            _ => false,
        }
    }

    /// Every host taking part in the experiment, replica hosts first, each listed once.
    /// A local experiment only has `localhost`.
    #[must_use]
    pub fn all_hosts(&self) -> Vec<String> {
        if self.is_local() {
            return vec![LOCALHOST.to_string()];
        }

        self.replica_hosts
            .iter()
            .chain(self.client_hosts.iter())
            .cloned()
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }
}
