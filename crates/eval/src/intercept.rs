//! Failure-observant wrappers over the comparison builtins, plus the
//! three validation functions rules translate into.
//!
//! The wrappers never change a comparison's truth value: a passing call
//! returns the inner result untouched. Only a literal `false` grows a
//! `Failure` record on a copy of the result node, which the aggregator
//! later finds by walking the dependency graph.

use std::rc::Rc;

use assay_core::CallExpr;

use crate::aggregate::{aggregate_validation, collect_errors, collect_paths};
use crate::env::{Environment, FnHandler, FunctionTable};
use crate::types::{EvalError, EvaluatedRule, Failure, NodeId, NodeMeta, ValidationData, Value};

/// Function name rules translate a single assertion into.
pub const VALIDATOR_RULE: &str = "ValidatorRule";
/// Function name attaching a message to an assertion's result.
pub const WITH_MESSAGE: &str = "WithMessage";
/// Function name attaching a named property to an assertion's result.
pub const WITH_PROPERTY: &str = "WithProperty";

/// The builtins whose `false` results carry failure records.
pub const INTERCEPTED: &[&str] = &["=", "!=", ">", "<", ">=", "<=", "notEmpty"];

/// Produce the validation function table from a base table: the
/// comparison entries are substituted with their wrapped forms and the
/// three validation functions are registered. The base table is consumed
/// and a new one returned; nothing shared is mutated.
pub fn validation_functions(base: FunctionTable) -> FunctionTable {
    let mut table = base;
    for name in INTERCEPTED {
        if let Some(inner) = table.get(*name).cloned() {
            table.insert((*name).to_string(), wrap_comparison(inner));
        }
    }
    table.insert(VALIDATOR_RULE.to_string(), Rc::new(validator_rule_handler));
    table.insert(WITH_MESSAGE.to_string(), Rc::new(with_message_handler));
    table.insert(WITH_PROPERTY.to_string(), Rc::new(with_property_handler));
    table
}

// ──────────────────────────────────────────────
// Comparison interception
// ──────────────────────────────────────────────

/// Wrap a comparison handler so a `false` result also carries a
/// [`Failure`] naming the call and its concrete operand values.
pub fn wrap_comparison(inner: FnHandler) -> FnHandler {
    Rc::new(move |env: &mut Environment, call: &CallExpr| {
        let result = inner(env, call)?;
        if !matches!(env.node(result).value, Value::Bool(false)) {
            return Ok(result);
        }

        // Re-evaluate the arguments independently to capture the operand
        // values at failure time; non-scalar results are not operands.
        let mut evaluated_args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            let arg_id = env.evaluate(arg)?;
            let value = env.node(arg_id).value.clone();
            if value.is_scalar() {
                evaluated_args.push(value);
            }
        }
        tracing::trace!(function = %call.function, "comparison failed");

        let failure = Failure {
            call: call.clone(),
            evaluated_args,
        };
        let mut copy = env.node(result).clone();
        copy.meta = NodeMeta::Validation(ValidationData {
            failures: vec![failure],
            message: None,
            properties: Default::default(),
        });
        Ok(env.alloc(copy))
    })
}

// ──────────────────────────────────────────────
// WithMessage / WithProperty
// ──────────────────────────────────────────────

/// `WithMessage(message, body)`: merge the evaluated message into the
/// body result's validation data. The message node joins the body's
/// `deps` so its own metadata stays reachable.
fn with_message_handler(env: &mut Environment, call: &CallExpr) -> Result<NodeId, EvalError> {
    if call.args.len() != 2 {
        return Ok(env.null_node());
    }
    let message_id = env.evaluate(&call.args[0])?;
    let body_id = env.evaluate(&call.args[1])?;
    if !env.node(body_id).value.is_scalar() {
        return Ok(body_id);
    }

    let mut data = existing_validation(env, body_id);
    let message_value = &env.node(message_id).value;
    if message_value.is_scalar() && !matches!(message_value, Value::Null) {
        data.message = Some(message_value.to_string());
    }

    let mut copy = env.node(body_id).clone();
    copy.meta = NodeMeta::Validation(data);
    copy.deps.push(message_id);
    Ok(env.alloc(copy))
}

/// `WithProperty(key, value, body)`: merge one `key -> value` entry into
/// the body result's validation data. Same key at the same node
/// overwrites; precedence across nodes belongs to the aggregator's
/// traversal order.
fn with_property_handler(env: &mut Environment, call: &CallExpr) -> Result<NodeId, EvalError> {
    if call.args.len() != 3 {
        return Ok(env.null_node());
    }
    let key_id = env.evaluate(&call.args[0])?;
    let value_id = env.evaluate(&call.args[1])?;
    let body_id = env.evaluate(&call.args[2])?;
    if !env.node(body_id).value.is_scalar() {
        return Ok(body_id);
    }

    let mut data = existing_validation(env, body_id);
    let key_value = env.node(key_id).value.clone();
    if key_value.is_scalar() {
        let value = env.node(value_id).value.clone();
        data.properties.insert(key_value.to_string(), value);
    }

    let mut copy = env.node(body_id).clone();
    copy.meta = NodeMeta::Validation(data);
    copy.deps.push(key_id);
    copy.deps.push(value_id);
    Ok(env.alloc(copy))
}

/// The body's validation data, or a fresh empty one. A node already
/// carrying a packaged rule contributes nothing here.
fn existing_validation(env: &Environment, id: NodeId) -> ValidationData {
    match &env.node(id).meta {
        NodeMeta::Validation(data) => data.clone(),
        NodeMeta::None | NodeMeta::Rule(_) => ValidationData::default(),
    }
}

// ──────────────────────────────────────────────
// ValidatorRule
// ──────────────────────────────────────────────

/// `ValidatorRule(path, must, props?)`: evaluate one assertion end to
/// end and package the outcome.
///
/// Wrong arity or a non-scalar `path`/`must` result skips the rule with
/// a null literal instead of failing the batch. The returned node is a
/// copy of the evaluated path node carrying the packaged rule, with the
/// assertion result as its only dependency so the sub-graph stays
/// reachable.
fn validator_rule_handler(env: &mut Environment, call: &CallExpr) -> Result<NodeId, EvalError> {
    if call.args.len() < 2 {
        return Ok(env.null_node());
    }
    let path_id = env.evaluate(&call.args[0])?;
    let must_id = env.evaluate(&call.args[1])?;
    if !env.node(path_id).value.is_scalar() || !env.node(must_id).value.is_scalar() {
        return Ok(env.null_node());
    }

    let mut aggregated = aggregate_validation(env, must_id);

    // Explicit props are a default layer: the assertion's own aggregated
    // properties win on key collision.
    if call.args.len() > 2 {
        let props_id = env.evaluate(&call.args[2])?;
        if let NodeMeta::Validation(data) = &env.node(props_id).meta {
            for (key, value) in &data.properties {
                aggregated
                    .properties
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
        }
    }

    let errors = collect_errors(env, must_id);
    let dependent_data = collect_paths(env, must_id);

    let path_node = env.node(path_id);
    let rule = EvaluatedRule {
        path: path_node.path.clone().unwrap_or_default(),
        path_value: path_node.value.clone(),
        result: must_id,
        failures: aggregated.failures,
        errors,
        message: aggregated.message,
        dependent_data,
        properties: aggregated.properties,
    };

    let mut copy = path_node.clone();
    copy.meta = NodeMeta::Rule(rule);
    copy.deps = vec![must_id];
    Ok(env.alloc(copy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::default_functions;
    use assay_core::{parse_eval, Expr};
    use pretty_assertions::assert_eq;

    fn env_for(data: serde_json::Value) -> Environment {
        Environment::new(
            validation_functions(default_functions()),
            Value::from_json(&data),
        )
    }

    fn eval(env: &mut Environment, src: &str) -> NodeId {
        let expr = parse_eval(src).unwrap();
        env.evaluate(&expr).unwrap()
    }

    #[test]
    fn passing_comparison_is_untouched() {
        let mut env = env_for(serde_json::json!({"value": 50}));
        let id = eval(&mut env, "value > 10");
        assert_eq!(env.node(id).value, Value::Bool(true));
        assert!(matches!(env.node(id).meta, NodeMeta::None));
    }

    #[test]
    fn failing_comparison_grows_a_failure() {
        let mut env = env_for(serde_json::json!({"value": 5}));
        let id = eval(&mut env, "value > 10");
        let node = env.node(id);
        assert_eq!(node.value, Value::Bool(false));
        match &node.meta {
            NodeMeta::Validation(data) => {
                assert_eq!(data.failures.len(), 1);
                let failure = &data.failures[0];
                assert_eq!(failure.call.function, ">");
                assert_eq!(
                    failure.evaluated_args,
                    vec![Value::Int(5), Value::Int(10)]
                );
            }
            other => panic!("expected validation data, got {:?}", other),
        }
    }

    #[test]
    fn with_message_merges_onto_failures() {
        let mut env = env_for(serde_json::json!({"name": ""}));
        let expr = Expr::call(
            WITH_MESSAGE,
            vec![
                Expr::text("Name is required"),
                parse_eval("notEmpty(name)").unwrap(),
            ],
        );
        let id = env.evaluate(&expr).unwrap();
        match &env.node(id).meta {
            NodeMeta::Validation(data) => {
                assert_eq!(data.message.as_deref(), Some("Name is required"));
                assert_eq!(data.failures.len(), 1);
            }
            other => panic!("expected validation data, got {:?}", other),
        }
    }

    #[test]
    fn with_message_wrong_arity_is_a_null_literal() {
        let mut env = env_for(serde_json::json!({}));
        let expr = Expr::call(WITH_MESSAGE, vec![Expr::text("orphan")]);
        let id = env.evaluate(&expr).unwrap();
        assert_eq!(env.node(id).value, Value::Null);
        assert!(matches!(env.node(id).meta, NodeMeta::None));
    }

    #[test]
    fn with_property_same_node_overwrites_same_key() {
        let mut env = env_for(serde_json::json!({"age": 10}));
        let inner = Expr::call(
            WITH_PROPERTY,
            vec![
                Expr::text("severity"),
                Expr::text("warn"),
                parse_eval("age >= 18").unwrap(),
            ],
        );
        let expr = Expr::call(
            WITH_PROPERTY,
            vec![Expr::text("severity"), Expr::text("error"), inner],
        );
        let id = env.evaluate(&expr).unwrap();
        match &env.node(id).meta {
            NodeMeta::Validation(data) => {
                assert_eq!(
                    data.properties.get("severity"),
                    Some(&Value::Text("error".into()))
                );
            }
            other => panic!("expected validation data, got {:?}", other),
        }
    }

    #[test]
    fn validator_rule_packages_the_outcome() {
        let mut env = env_for(serde_json::json!({"value": 5}));
        let expr = Expr::call(
            VALIDATOR_RULE,
            vec![parse_eval("value").unwrap(), parse_eval("value > 10").unwrap()],
        );
        let id = env.evaluate(&expr).unwrap();
        let node = env.node(id);
        assert_eq!(node.value, Value::Int(5));
        assert_eq!(node.deps.len(), 1);
        match &node.meta {
            NodeMeta::Rule(rule) => {
                assert_eq!(rule.path.to_string(), "value");
                assert_eq!(rule.path_value, Value::Int(5));
                assert_eq!(rule.failures.len(), 1);
                assert_eq!(rule.dependent_data.len(), 1);
                assert_eq!(rule.dependent_data[0].to_string(), "value");
            }
            other => panic!("expected a packaged rule, got {:?}", other),
        }
    }

    #[test]
    fn validator_rule_short_arity_skips() {
        let mut env = env_for(serde_json::json!({"value": 5}));
        let expr = Expr::call(VALIDATOR_RULE, vec![parse_eval("value").unwrap()]);
        let id = env.evaluate(&expr).unwrap();
        assert_eq!(env.node(id).value, Value::Null);
    }

    #[test]
    fn validator_rule_non_scalar_must_skips() {
        let mut env = env_for(serde_json::json!({"value": 5}));
        let expr = Expr::call(
            VALIDATOR_RULE,
            vec![
                parse_eval("value").unwrap(),
                Expr::lambda("i", Expr::var("i")),
            ],
        );
        let id = env.evaluate(&expr).unwrap();
        assert_eq!(env.node(id).value, Value::Null);
        assert!(matches!(env.node(id).meta, NodeMeta::None));
    }

    #[test]
    fn props_argument_is_a_fallback_layer() {
        let mut env = env_for(serde_json::json!({"age": 10}));
        // must carries severity=error; props supplies severity=warn and hint=x
        let must = Expr::call(
            WITH_PROPERTY,
            vec![
                Expr::text("severity"),
                Expr::text("error"),
                parse_eval("age >= 18").unwrap(),
            ],
        );
        let props = Expr::call(
            WITH_PROPERTY,
            vec![Expr::text("severity"), Expr::text("warn"), Expr::call(
                WITH_PROPERTY,
                vec![Expr::text("hint"), Expr::text("x"), Expr::bool(true)],
            )],
        );
        let expr = Expr::call(
            VALIDATOR_RULE,
            vec![parse_eval("age").unwrap(), must, props],
        );
        let id = env.evaluate(&expr).unwrap();
        match &env.node(id).meta {
            NodeMeta::Rule(rule) => {
                assert_eq!(rule.property("severity"), Some(&Value::Text("error".into())));
                assert_eq!(rule.property("hint"), Some(&Value::Text("x".into())));
            }
            other => panic!("expected a packaged rule, got {:?}", other),
        }
    }
}
