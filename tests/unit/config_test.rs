//! Tests for configuration validation

use std::collections::HashMap;

use scheduler_resource_tree::config::{
    JobResourcesConfig, PoolConfig, SchedulerConfig, SchedulingContextConfig,
};
use scheduler_resource_tree::core::JobResources;

fn pool(parent: Option<&str>, user_slots: Option<i64>) -> PoolConfig {
    PoolConfig {
        parent: parent.map(str::to_string),
        resource_limits: user_slots.map(|slots| JobResourcesConfig {
            user_slots: Some(slots),
            ..JobResourcesConfig::default()
        }),
    }
}

fn config(pools: Vec<(&str, PoolConfig)>) -> SchedulerConfig {
    SchedulerConfig {
        pools: pools
            .into_iter()
            .map(|(name, pool)| (name.to_string(), pool))
            .collect::<HashMap<_, _>>(),
        scheduling_context: SchedulingContextConfig::default(),
    }
}

#[test]
fn test_pool_config_limits() {
    assert!(pool(None, None).limits().is_infinite());

    let limits = pool(None, Some(5)).limits();
    assert_eq!(limits.user_slots, 5);
    assert_eq!(limits.cpu, JobResources::infinite().cpu);
}

#[test]
fn test_pool_config_invalid_negative_limit() {
    assert!(pool(None, Some(-1)).validate().is_err());
}

#[test]
fn test_scheduler_config_validation() {
    let cfg = config(vec![("root", pool(None, None)), ("a", pool(Some("root"), Some(3)))]);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_scheduler_config_empty_pools() {
    assert!(SchedulerConfig::default().validate().is_err());
}

#[test]
fn test_scheduler_config_unknown_parent() {
    let cfg = config(vec![("a", pool(Some("missing"), None))]);
    assert!(cfg.validate().unwrap_err().contains("unknown parent"));
}

#[test]
fn test_scheduler_config_parent_cycle() {
    let cfg = config(vec![("a", pool(Some("b"), None)), ("b", pool(Some("a"), None))]);
    assert!(cfg.validate().unwrap_err().contains("cycle"));
}

#[test]
fn test_topological_order_lists_parents_first() {
    let cfg = config(vec![
        ("c", pool(Some("b"), None)),
        ("b", pool(Some("a"), None)),
        ("a", pool(None, None)),
        ("z", pool(None, None)),
    ]);
    assert_eq!(cfg.pools_in_topological_order(), ["a", "z", "b", "c"]);
}

#[test]
fn test_scheduling_context_config_defaults() {
    let cfg = SchedulingContextConfig::default();
    assert!(cfg.validate().is_ok());
    let spare = cfg.min_spare_resources();
    assert_eq!(spare.user_slots, 1);
    assert_eq!(spare.cpu, 1000);
    assert_eq!(spare.gpu, 0);
}

#[test]
fn test_scheduling_context_config_zero_job_cap() {
    let cfg = SchedulingContextConfig {
        max_started_jobs_per_heartbeat: Some(0),
        ..SchedulingContextConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_scheduler_config_from_json() {
    let json = r#"{
        "pools": {
            "root": {},
            "batch": { "parent": "root", "resource_limits": { "user_slots": 100, "memory": 1073741824 } }
        },
        "scheduling_context": { "max_started_jobs_per_heartbeat": 8 }
    }"#;

    let cfg = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.pools.len(), 2);
    assert_eq!(cfg.pools["batch"].limits().memory, 1_073_741_824);
    assert_eq!(cfg.scheduling_context.max_started_jobs_per_heartbeat, Some(8));
    assert_eq!(cfg.scheduling_context.min_spare_resources().user_slots, 1);
}

#[test]
fn test_scheduler_config_from_json_rejects_unknown_resource() {
    let json = r#"{ "pools": { "root": { "resource_limits": { "disk": 1 } } } }"#;
    assert!(SchedulerConfig::from_json_str(json).unwrap_err().contains("parse error"));
}
