//! Builders to construct resource trees from configuration.

pub mod tree_builder;

pub use tree_builder::{build_resource_tree, load_resource_tree};
