#[cfg(test)]
mod config_tests {
    use crate::config::timeouts::TimeoutKind;
    #[cfg(feature = "serialize_serde")]
    use crate::config::ExperimentConfig;
    use crate::config::{ConfigError, ExperimentConfigBuilder};
    use crate::node_id::ReplicaId;
    use crate::topology::Topology;
    use indexmap::IndexMap;
    use std::time::Duration;
    use tracing::Level;

    fn hosts(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn locations(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("location-{i}")).collect()
    }

    fn tree_builder(replicas: u32, positions: &[u32]) -> ExperimentConfigBuilder {
        ExperimentConfigBuilder {
            replica_hosts: hosts(&["h1", "h2"]),
            replicas,
            locations: locations(replicas as usize),
            tree_positions: positions.iter().copied().map(ReplicaId).collect(),
            branch_factor: 2,
            tree_delta: Duration::from_millis(5),
            ..Default::default()
        }
    }

    #[test]
    fn test_replicas_and_clients_per_host() {
        let config = ExperimentConfigBuilder {
            replica_hosts: hosts(&["h1", "h2", "h3"]),
            client_hosts: hosts(&["c1", "c2"]),
            replicas: 7,
            clients: 3,
            ..Default::default()
        }
        .build()
        .unwrap();

        let replicas = (0..3)
            .map(|host| config.replicas_for_host(host))
            .collect::<Vec<_>>();
        let clients = (0..2)
            .map(|host| config.clients_for_host(host))
            .collect::<Vec<_>>();

        assert_eq!(replicas, vec![3, 2, 2]);
        assert_eq!(clients, vec![2, 1]);
    }

    #[test]
    fn test_is_local() {
        let local = |replica_hosts: &[&str], client_hosts: &[&str]| {
            ExperimentConfigBuilder {
                replica_hosts: hosts(replica_hosts),
                client_hosts: hosts(client_hosts),
                ..Default::default()
            }
            .build()
            .unwrap()
            .is_local()
        };

        assert!(local(&["localhost"], &["localhost"]));
        assert!(local(&["127.0.0.1"], &["127.0.0.1"]));

        assert!(!local(&["localhost"], &["127.0.0.1"]));
        assert!(!local(&["localhost", "h2"], &["localhost"]));
        assert!(!local(&["localhost", "localhost"], &["localhost"]));
        assert!(!local(&["localhost"], &["localhost", "c2"]));
        assert!(!local(&["h1"], &["h1"]));
        assert!(!local(&[], &[]));
    }

    #[test]
    fn test_all_hosts() {
        let local = ExperimentConfigBuilder {
            replica_hosts: hosts(&["localhost"]),
            client_hosts: hosts(&["localhost"]),
            ..Default::default()
        }
        .build()
        .unwrap();

        assert_eq!(local.all_hosts(), hosts(&["localhost"]));

        let remote = ExperimentConfigBuilder {
            replica_hosts: hosts(&["a", "b"]),
            client_hosts: hosts(&["c"]),
            ..Default::default()
        }
        .build()
        .unwrap();

        assert_eq!(remote.all_hosts(), hosts(&["a", "b", "c"]));

        let shared = ExperimentConfigBuilder {
            replica_hosts: hosts(&["b", "a"]),
            client_hosts: hosts(&["a", "c", "b"]),
            ..Default::default()
        }
        .build()
        .unwrap();

        assert_eq!(shared.all_hosts(), hosts(&["b", "a", "c"]));
    }

    #[test]
    fn test_flat_topology_without_positions() {
        let config = ExperimentConfigBuilder {
            replica_hosts: hosts(&["h1"]),
            replicas: 4,
            branch_factor: 2,
            ..Default::default()
        }
        .build()
        .unwrap();

        assert_eq!(config.topology(), &Topology::Flat);
        assert!(config.tree_pos_ids().is_empty());
        assert!(config.tree().is_none());
    }

    #[test]
    fn test_tree_topology() {
        let config = tree_builder(5, &[3, 1, 2, 5, 4]).build().unwrap();

        assert!(config.topology().is_tree());
        assert_eq!(
            config.tree_pos_ids(),
            [3, 1, 2, 5, 4].map(ReplicaId).to_vec()
        );

        let tree = config.tree().unwrap();

        assert_eq!(tree.root(), Some(ReplicaId(3)));
        assert_eq!(tree.children_of(ReplicaId(3)), vec![ReplicaId(1), ReplicaId(2)]);
        assert_eq!(tree.children_of(ReplicaId(1)), vec![ReplicaId(5), ReplicaId(4)]);
    }

    #[test]
    fn test_random_tree_follows_shared_seed() {
        let builder = ExperimentConfigBuilder {
            random_tree: true,
            shared_seed: 99,
            ..tree_builder(8, &[1, 2, 3, 4, 5, 6, 7, 8])
        };

        let first = builder.clone().build().unwrap();
        let second = builder.build().unwrap();

        assert_eq!(first.tree_pos_ids(), second.tree_pos_ids());
        assert_eq!(first.tree_pos_ids(), first.tree_pos_ids());
        assert_eq!(
            first.create_replica_opts().tree_positions(),
            &first.tree_pos_ids()
        );
    }

    #[test]
    fn test_tree_validation() {
        assert_eq!(
            ExperimentConfigBuilder {
                branch_factor: 0,
                ..tree_builder(3, &[1, 2, 3])
            }
            .build(),
            Err(ConfigError::ZeroBranchFactor)
        );

        assert_eq!(
            ExperimentConfigBuilder {
                locations: Vec::new(),
                ..tree_builder(3, &[1, 2, 3])
            }
            .build(),
            Err(ConfigError::TreeRequiresLocations)
        );

        assert_eq!(
            ExperimentConfigBuilder {
                locations: locations(4),
                ..tree_builder(4, &[1, 2, 3])
            }
            .build(),
            Err(ConfigError::TreePositionCountMismatch {
                expected: 4,
                found: 3
            })
        );

        assert_eq!(
            tree_builder(3, &[1, 2, 4]).build(),
            Err(ConfigError::TreePositionOutOfRange {
                id: ReplicaId(4),
                replicas: 3
            })
        );

        assert_eq!(
            tree_builder(3, &[1, 2, 2]).build(),
            Err(ConfigError::DuplicateTreePosition(ReplicaId(2)))
        );
    }

    #[test]
    fn test_location_count_must_match_replicas() {
        let result = ExperimentConfigBuilder {
            replica_hosts: hosts(&["h1"]),
            replicas: 3,
            locations: locations(2),
            ..Default::default()
        }
        .build();

        assert_eq!(
            result,
            Err(ConfigError::LocationCountMismatch {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn test_byzantine_strategies_are_validated() {
        let result = ExperimentConfigBuilder {
            replica_hosts: hosts(&["h1"]),
            replicas: 4,
            byzantine_strategy: IndexMap::from([
                ("silent".to_string(), vec![ReplicaId(1)]),
                ("fork".to_string(), vec![ReplicaId(1)]),
            ]),
            ..Default::default()
        }
        .build();

        assert!(matches!(
            result,
            Err(ConfigError::ByzantineReplicaInMultipleStrategies { .. })
        ));
    }

    #[test]
    fn test_rates_are_validated() {
        let with_rates = |rate_limit: Option<f64>, rate_step: f64, timeout_multiplier: f64| {
            let mut builder = ExperimentConfigBuilder {
                timeout_multiplier,
                ..Default::default()
            };

            builder.client.rate_limit = rate_limit;
            builder.client.rate_step = rate_step;

            builder.build()
        };

        assert!(with_rates(None, 10.0, 1.2).is_ok());
        assert!(with_rates(Some(1000.0), 0.0, 0.0).is_ok());

        assert!(matches!(
            with_rates(Some(f64::NAN), 0.0, 1.0),
            Err(ConfigError::InvalidRate { name: "rate limit", .. })
        ));
        assert!(matches!(
            with_rates(Some(f64::INFINITY), 0.0, 1.0),
            Err(ConfigError::InvalidRate { name: "rate limit", .. })
        ));
        assert!(matches!(
            with_rates(Some(10.0), -1.0, 1.0),
            Err(ConfigError::InvalidRate { name: "rate step", .. })
        ));
        assert!(matches!(
            with_rates(Some(10.0), 1.0, f64::INFINITY),
            Err(ConfigError::InvalidRate { name: "timeout multiplier", .. })
        ));
    }

    #[test]
    fn test_timeout_multiplier_fits_replica_options() {
        let with_multiplier = |timeout_multiplier: f64| {
            ExperimentConfigBuilder {
                timeout_multiplier,
                ..Default::default()
            }
            .build()
        };

        assert!(matches!(
            with_multiplier(1e39),
            Err(ConfigError::InvalidRate { name: "timeout multiplier", .. })
        ));

        let largest = with_multiplier(f64::from(f32::MAX)).unwrap();

        assert_eq!(largest.create_replica_opts().timeout_multiplier(), f32::MAX);
        assert!(largest.create_replica_opts().timeout_multiplier().is_finite());
    }

    #[test]
    fn test_log_level() {
        let with_level = |log_level: &str| {
            ExperimentConfigBuilder {
                log_level: log_level.to_string(),
                ..Default::default()
            }
            .build()
        };

        assert_eq!(with_level("").unwrap().log_level(), Level::INFO);
        assert_eq!(with_level("debug").unwrap().log_level(), Level::DEBUG);
        assert_eq!(with_level("WARN").unwrap().log_level(), Level::WARN);
        assert_eq!(
            with_level("chatty"),
            Err(ConfigError::InvalidLogLevel("chatty".to_string()))
        );
    }

    #[test]
    fn test_timeouts_and_options() {
        let mut builder = ExperimentConfigBuilder {
            replica_hosts: hosts(&["h1"]),
            client_hosts: hosts(&["c1"]),
            replicas: 4,
            clients: 1,
            use_tls: true,
            shared_seed: 7,
            duration_samples: 100,
            timeout_multiplier: 1.2,
            connect_timeout: Duration::from_secs(5),
            client_timeout: Duration::from_millis(500),
            view_timeout: Duration::from_millis(100),
            max_timeout: Duration::from_secs(10),
            rate_step_interval: Duration::from_secs(1),
            measurement_interval: Duration::from_millis(250),
            duration: Duration::from_secs(60),
            ..Default::default()
        };

        builder.modules.consensus = "chainedhotstuff".to_string();
        builder.modules.crypto = "ecdsa".to_string();
        builder.modules.leader_rotation = "round-robin".to_string();
        builder.modules.modules = vec!["kauri".to_string()];
        builder.client.batch_size = 16;
        builder.client.payload_size = 128;
        builder.client.max_concurrent = 250;
        builder.client.rate_limit = Some(1000.0);
        builder.client.rate_step = 50.0;

        let config = builder.build().unwrap();

        assert_eq!(config.timeouts().get(TimeoutKind::Experiment), Duration::from_secs(60));
        assert_eq!(config.timeouts().measurement_interval(), Duration::from_millis(250));

        let replica = config.create_replica_opts();

        assert!(replica.use_tls());
        assert_eq!(replica.batch_size(), 16);
        assert!((replica.timeout_multiplier() - 1.2).abs() < f32::EPSILON);
        assert_eq!(replica.consensus(), "chainedhotstuff");
        assert_eq!(replica.crypto(), "ecdsa");
        assert_eq!(replica.leader_rotation(), "round-robin");
        assert_eq!(replica.connect_timeout(), Duration::from_secs(5));
        assert_eq!(replica.initial_timeout(), Duration::from_millis(100));
        assert_eq!(replica.max_timeout(), Duration::from_secs(10));
        assert_eq!(replica.timeout_samples(), 100);
        assert_eq!(replica.shared_seed(), 7);
        assert_eq!(replica.modules(), &vec!["kauri".to_string()]);
        assert_eq!(replica.branch_factor(), 0);
        assert!(replica.tree_positions().is_empty());

        let client = config.create_client_opts();

        assert!(client.use_tls());
        assert_eq!(client.connect_timeout(), Duration::from_secs(5));
        assert_eq!(client.payload_size(), 128);
        assert_eq!(client.max_concurrent(), 250);
        assert_eq!(client.rate_limit(), Some(1000.0));
        assert_eq!(client.rate_step(), 50.0);
        assert_eq!(client.rate_step_interval(), Duration::from_secs(1));
        assert_eq!(client.timeout(), Duration::from_millis(500));
    }

    #[test]
    #[cfg(feature = "serialize_serde")]
    fn test_deserialize_validates() {
        let json = r#"{
            "replica_hosts": ["h1", "h2"],
            "client_hosts": ["c1"],
            "replicas": 5,
            "clients": 2,
            "byzantine_strategy": { "silent": [2, 5] },
            "consensus": "chainedhotstuff",
            "rate_limit": 500.0,
            "cpu_profile": true,
            "view_timeout": { "secs": 0, "nanos": 100000000 },
            "log_level": "debug"
        }"#;

        let config: ExperimentConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.replicas(), 5);
        assert_eq!(config.modules().consensus, "chainedhotstuff");
        assert_eq!(config.client_tuning().rate_limit, Some(500.0));
        assert!(config.profiling().cpu);
        assert_eq!(config.timeouts().view(), Duration::from_millis(100));
        assert_eq!(
            config.byzantine_strategies().strategy_for(ReplicaId(5)),
            Some("silent")
        );

        let invalid = r#"{ "replicas": 2, "byzantine_strategy": { "silent": [3] } }"#;

        assert!(serde_json::from_str::<ExperimentConfig>(invalid).is_err());
    }

    #[test]
    #[cfg(feature = "serialize_serde")]
    fn test_serialize_keeps_parameters() {
        let builder = ExperimentConfigBuilder {
            random_tree: true,
            shared_seed: 3,
            byzantine_strategy: IndexMap::from([("fork".to_string(), vec![ReplicaId(2)])]),
            max_timeout: Duration::from_secs(3),
            log_level: "trace".to_string(),
            ..tree_builder(4, &[4, 3, 2, 1])
        };

        for rate_limit in [Some(250.0), None] {
            let mut builder = builder.clone();

            builder.client.rate_limit = rate_limit;

            let config = builder.build().unwrap();

            let json = serde_json::to_string(&config).unwrap();
            let restored: ExperimentConfig = serde_json::from_str(&json).unwrap();

            assert_eq!(restored, config);
            assert_eq!(
                restored.create_client_opts().rate_limit(),
                config.client_tuning().rate_limit
            );
        }
    }
}
