//! Dependency-graph aggregation of validation metadata.
//!
//! A rule's assertion result is a graph: `deps` edges may share nodes
//! with other result trees and may cycle back on ancestors. Every
//! traversal here carries a fresh, call-scoped visited set keyed by node
//! handle, so each distinct node contributes exactly once and the walk
//! terminates on any graph shape.

use std::collections::BTreeSet;

use assay_core::FieldPath;

use crate::env::Environment;
use crate::types::{NodeId, NodeMeta, ValidationData};

/// Union of all validation data reachable from `root` through `deps`,
/// in pre-order: failures append, the first non-empty message wins, and
/// later-visited properties overwrite earlier ones on key collision.
///
/// Reads the graph without touching it, so aggregating twice yields the
/// same result.
pub fn aggregate_validation(env: &Environment, root: NodeId) -> ValidationData {
    let mut visited = BTreeSet::new();
    let mut accumulator = ValidationData::default();
    aggregate_walk(env, root, &mut visited, &mut accumulator);
    accumulator
}

fn aggregate_walk(
    env: &Environment,
    id: NodeId,
    visited: &mut BTreeSet<NodeId>,
    accumulator: &mut ValidationData,
) {
    if !visited.insert(id) {
        return;
    }
    let node = env.node(id);
    if let NodeMeta::Validation(data) = &node.meta {
        accumulator.failures.extend(data.failures.iter().cloned());
        if accumulator.message.is_none() {
            if let Some(message) = &data.message {
                if !message.is_empty() {
                    accumulator.message = Some(message.clone());
                }
            }
        }
        for (key, value) in &data.properties {
            accumulator.properties.insert(key.clone(), value.clone());
        }
    }
    for dep in &node.deps {
        aggregate_walk(env, *dep, visited, accumulator);
    }
}

/// Distinct soft error strings reachable from `root`, in first-seen
/// pre-order.
pub fn collect_errors(env: &Environment, root: NodeId) -> Vec<String> {
    let mut visited = BTreeSet::new();
    let mut errors = Vec::new();
    errors_walk(env, root, &mut visited, &mut errors);
    errors
}

fn errors_walk(
    env: &Environment,
    id: NodeId,
    visited: &mut BTreeSet<NodeId>,
    errors: &mut Vec<String>,
) {
    if !visited.insert(id) {
        return;
    }
    let node = env.node(id);
    for error in &node.errors {
        if !errors.contains(error) {
            errors.push(error.clone());
        }
    }
    for dep in &node.deps {
        errors_walk(env, *dep, visited, errors);
    }
}

/// Distinct data paths reachable from `root`, in first-seen pre-order --
/// the set of paths a rule's outcome depended on.
pub fn collect_paths(env: &Environment, root: NodeId) -> Vec<FieldPath> {
    let mut visited = BTreeSet::new();
    let mut paths = Vec::new();
    paths_walk(env, root, &mut visited, &mut paths);
    paths
}

fn paths_walk(
    env: &Environment,
    id: NodeId,
    visited: &mut BTreeSet<NodeId>,
    paths: &mut Vec<FieldPath>,
) {
    if !visited.insert(id) {
        return;
    }
    let node = env.node(id);
    if let Some(path) = &node.path {
        if !paths.contains(path) {
            paths.push(path.clone());
        }
    }
    for dep in &node.deps {
        paths_walk(env, *dep, visited, paths);
    }
}
