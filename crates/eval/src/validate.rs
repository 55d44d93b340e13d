//! Public entry points: evaluate a rule tree against data and collect
//! the per-rule outcomes.

use assay_core::Expr;

use crate::builtins::default_functions;
use crate::collect::collect_rules;
use crate::env::{Environment, LetBindings};
use crate::intercept::validation_functions;
use crate::types::{EvalError, EvaluatedRule, Value};

/// Build a validation environment over external JSON data: the default
/// function table with the comparison wrappers substituted and the
/// validation functions registered, focused on the data at the empty
/// path.
pub fn validation_environment(data: &serde_json::Value) -> Environment {
    let functions = validation_functions(default_functions());
    Environment::new(functions, Value::from_json(data))
}

/// Validate `data` against `rule`, returning one [`EvaluatedRule`] per
/// concretely evaluated single rule (iterations yield one per element),
/// in declaration/discovery order.
///
/// A failing assertion is data on the result; an `Err` means the rule
/// expressions themselves could not be evaluated, and fails the whole
/// call.
pub fn validate_data(
    data: &serde_json::Value,
    rule: &crate::rules::Rule,
    variables: &LetBindings,
) -> Result<Vec<EvaluatedRule>, EvalError> {
    let mut env = validation_environment(data);
    validate_rules(&mut env, rule, variables)
}

/// Validate against an already-built environment. `variables` are bound
/// around the whole rule tree through a `let` wrapper.
pub fn validate_rules(
    env: &mut Environment,
    rule: &crate::rules::Rule,
    variables: &LetBindings,
) -> Result<Vec<EvaluatedRule>, EvalError> {
    let mut expr = crate::rules::to_expr(rule);
    if !variables.is_empty() {
        expr = Expr::let_in(variables.clone(), expr);
    }
    tracing::debug!("evaluating rule tree");
    let root = env.evaluate(&expr)?;
    let rules = collect_rules(env, Some(root));
    tracing::debug!(count = rules.len(), "collected rule results");
    Ok(rules)
}
