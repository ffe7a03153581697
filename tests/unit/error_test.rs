//! Tests for error types

use scheduler_resource_tree::core::SchedulerError;

#[test]
fn test_duplicate_element_error() {
    let err = SchedulerError::DuplicateElement("pool".to_string());
    assert_eq!(format!("{err}"), "duplicate element: pool");
}

#[test]
fn test_invalid_parent_error() {
    let err = SchedulerError::InvalidParent {
        child: "op".to_string(),
        reason: "parent must be a pool".to_string(),
    };
    assert_eq!(format!("{err}"), "invalid parent for `op`: parent must be a pool");
}

#[test]
fn test_insufficient_resources_error() {
    let err = SchedulerError::InsufficientResources {
        element: "research".to_string(),
    };
    assert_eq!(format!("{err}"), "insufficient resources at `research`");
}

#[test]
fn test_element_not_alive_error() {
    let err = SchedulerError::ElementNotAlive {
        element: "op".to_string(),
    };
    assert_eq!(format!("{err}"), "element `op` is not alive");
}

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("at least one pool must be defined".to_string());
    assert_eq!(format!("{err}"), "invalid config: at least one pool must be defined");
}
