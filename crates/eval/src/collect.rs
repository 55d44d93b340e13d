//! Collection of packaged rule results from an evaluation result graph.
//!
//! Composed and iterated rules produce arrays (possibly nested) whose
//! elements carry the packaged rules; shared `deps` edges can reach the
//! same node twice. The walk uses the same visited-set discipline as the
//! aggregator, so every rule is reported exactly once, in discovery
//! order.

use std::collections::BTreeSet;

use crate::env::Environment;
use crate::types::{EvaluatedRule, NodeId, NodeMeta};

/// Every packaged rule reachable from `root`: the node's own metadata
/// first, then array elements in order, then dependencies.
pub fn collect_rules(env: &Environment, root: Option<NodeId>) -> Vec<EvaluatedRule> {
    let mut visited = BTreeSet::new();
    let mut rules = Vec::new();
    if let Some(id) = root {
        collect_walk(env, id, &mut visited, &mut rules);
    }
    rules
}

fn collect_walk(
    env: &Environment,
    id: NodeId,
    visited: &mut BTreeSet<NodeId>,
    rules: &mut Vec<EvaluatedRule>,
) {
    if !visited.insert(id) {
        return;
    }
    let node = env.node(id);
    if let NodeMeta::Rule(rule) = &node.meta {
        rules.push(rule.clone());
    }
    for element in &node.elements {
        collect_walk(env, *element, visited, rules);
    }
    for dep in &node.deps {
        collect_walk(env, *dep, visited, rules);
    }
}
