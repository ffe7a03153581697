//! Tests for builder modules

use scheduler_resource_tree::builders::{build_resource_tree, load_resource_tree};
use scheduler_resource_tree::config::SchedulerConfig;
use scheduler_resource_tree::core::{ElementKind, JobResources, SchedulerError};

const CONFIG: &str = r#"{
    "pools": {
        "root": {},
        "research": { "parent": "root", "resource_limits": { "user_slots": 10, "cpu": 4000 } },
        "research/nightly": { "parent": "research", "resource_limits": { "user_slots": 2 } }
    }
}"#;

#[test]
fn test_build_resource_tree_links_and_limits() {
    let config = SchedulerConfig::from_json_str(CONFIG).unwrap();
    let tree = build_resource_tree(&config).unwrap();
    assert_eq!(tree.element_count(), 3);

    let root = tree.get_element("root").unwrap();
    assert!(root.parent().is_none());
    assert!(!root.are_resource_limits_specified());

    let research = tree.get_element("research").unwrap();
    assert_eq!(research.kind(), ElementKind::Pool);
    assert_eq!(research.parent().unwrap().id(), "root");
    let limits = research.get_resource_limits();
    assert_eq!(limits.user_slots, 10);
    assert_eq!(limits.cpu, 4000);
    assert_eq!(limits.memory, JobResources::infinite().memory);

    let nightly = tree.get_element("research/nightly").unwrap();
    assert_eq!(nightly.parent().unwrap().id(), "research");
    assert!(nightly.is_initialized());
}

#[test]
fn test_build_resource_tree_admits_under_nested_limits() {
    let config = SchedulerConfig::from_json_str(CONFIG).unwrap();
    let tree = build_resource_tree(&config).unwrap();
    let op = tree.create_element("op", ElementKind::Operation).unwrap();
    tree.attach_parent("op", "research/nightly").unwrap();

    let demand = JobResources::with_user_slots(1);
    assert!(tree.try_increase_hierarchical_resource_usage_precommit(&op, &demand).is_ok());
    assert!(tree.try_increase_hierarchical_resource_usage_precommit(&op, &demand).is_ok());
    assert_eq!(
        tree.try_increase_hierarchical_resource_usage_precommit(&op, &demand),
        Err(SchedulerError::InsufficientResources {
            element: "research/nightly".into()
        })
    );
}

#[test]
fn test_build_resource_tree_rejects_invalid_config() {
    let config = SchedulerConfig::default();
    assert!(matches!(
        build_resource_tree(&config),
        Err(SchedulerError::InvalidConfig(_))
    ));
}

#[test]
fn test_load_resource_tree_from_file() {
    let path = std::env::temp_dir().join(format!(
        "scheduler-resource-tree-{}.json",
        std::process::id()
    ));
    std::fs::write(&path, CONFIG).unwrap();
    let tree = load_resource_tree(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(tree.element_count(), 3);
}

#[test]
fn test_load_resource_tree_missing_file() {
    let err = load_resource_tree("/nonexistent/scheduler.json").unwrap_err();
    assert!(format!("{err:#}").contains("failed to read scheduler config"));
}
