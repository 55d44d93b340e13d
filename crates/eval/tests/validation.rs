//! End-to-end validation scenarios through the public API.
//!
//! Covers the full path: rule construction, translation, evaluation
//! against JSON data, and collection of per-rule outcomes --
//!
//! 1. Single comparison rules, failing and passing
//! 2. notEmpty interception with operand capture
//! 3. Ordered composition (one outcome per child, declaration order)
//! 4. Per-element iteration with indexed paths
//! 5. Messages and properties riding the dependency walk
//! 6. Nested path navigation and dependent-path reporting
//! 7. Top-level and per-iteration variable bindings
//! 8. Graceful skips and hard evaluation errors

use assay_core::{parse_eval, Expr};
use assay_eval::{
    and_must, for_each_rule, for_each_rule_with_vars, multi_rule, single_rule, validate_data,
    with_message, with_prop, EvalError, EvaluatedRule, LetBindings, Value,
};

// ──────────────────────────────────────────────
// Test fixtures
// ──────────────────────────────────────────────

fn expr(src: &str) -> Expr {
    parse_eval(src).unwrap()
}

fn validate(data: serde_json::Value, rule: &assay_eval::Rule) -> Vec<EvaluatedRule> {
    validate_data(&data, rule, &LetBindings::new()).unwrap()
}

// ──────────────────────────────────────────────
// Single rules
// ──────────────────────────────────────────────

#[test]
fn failing_comparison_reports_call_and_operands() {
    let rule = single_rule(expr("value"), expr("value > 10"));
    let results = validate(serde_json::json!({"value": 5}), &rule);

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.path.to_string(), "value");
    assert_eq!(result.path_value, Value::Int(5));
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].call.function, ">");
    assert_eq!(
        result.failures[0].evaluated_args,
        vec![Value::Int(5), Value::Int(10)]
    );
    assert!(!result.passed());
}

#[test]
fn passing_rule_yields_a_zero_failure_entry() {
    let rule = single_rule(expr("value"), expr("value > 10"));
    let results = validate(serde_json::json!({"value": 50}), &rule);

    assert_eq!(results.len(), 1);
    assert!(results[0].failures.is_empty());
    assert!(results[0].passed());
}

#[test]
fn not_empty_captures_the_empty_operand() {
    let rule = single_rule(expr("email"), expr("$notEmpty(email)"));
    let results = validate(serde_json::json!({"email": ""}), &rule);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].failures.len(), 1);
    assert_eq!(results[0].failures[0].call.function, "notEmpty");
    assert_eq!(
        results[0].failures[0].evaluated_args,
        vec![Value::Text(String::new())]
    );
}

#[test]
fn dependent_paths_cover_every_data_read() {
    let rule = single_rule(expr("age"), expr("age >= limit and age >= 18"));
    let results = validate(serde_json::json!({"age": 20, "limit": 21}), &rule);

    let paths: Vec<String> = results[0]
        .dependent_data
        .iter()
        .map(|p| p.to_string())
        .collect();
    assert!(paths.contains(&"age".to_string()));
    assert!(paths.contains(&"limit".to_string()));
}

// ──────────────────────────────────────────────
// Composition
// ──────────────────────────────────────────────

#[test]
fn multi_rule_yields_one_outcome_per_child_in_declaration_order() {
    let rule = multi_rule(vec![
        single_rule(expr("name"), expr("$notEmpty(name)")),
        single_rule(expr("age"), expr("age >= 18")),
    ]);
    let results = validate(serde_json::json!({"name": "", "age": 15}), &rule);

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].path.to_string(), "name");
    assert_eq!(results[0].failures.len(), 1);
    assert_eq!(results[1].path.to_string(), "age");
    assert_eq!(results[1].failures.len(), 1);
}

#[test]
fn and_must_scores_both_assertions_in_one_rule() {
    let rule = and_must(
        single_rule(expr("age"), expr("age >= 18")),
        expr("age < 100"),
    );
    let results = validate(serde_json::json!({"age": 150}), &rule);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].failures.len(), 1);
    assert_eq!(results[0].failures[0].call.function, "<");
}

// ──────────────────────────────────────────────
// Iteration
// ──────────────────────────────────────────────

#[test]
fn for_each_yields_one_outcome_per_element() {
    let rule = for_each_rule(
        expr("items"),
        "i",
        single_rule(expr("value"), expr("value > 7")),
    );
    let results = validate(
        serde_json::json!({"items": [{"value": 10}, {"value": 5}, {"value": 20}]}),
        &rule,
    );

    assert_eq!(results.len(), 3);
    let failure_counts: Vec<usize> = results.iter().map(|r| r.failures.len()).collect();
    assert_eq!(failure_counts, vec![0, 1, 0]);

    let failing = &results[1];
    assert_eq!(failing.path.to_string(), "items[1].value");
    assert_eq!(
        failing.failures[0].evaluated_args,
        vec![Value::Int(5), Value::Int(7)]
    );
}

#[test]
fn for_each_variables_bind_around_each_iteration() {
    let rule = for_each_rule_with_vars(
        expr("items"),
        "i",
        single_rule(expr("value"), expr("value > limit")),
        vec![("limit".to_string(), Expr::int(7))],
    );
    let results = validate(
        serde_json::json!({"items": [{"value": 10}, {"value": 5}]}),
        &rule,
    );

    let failure_counts: Vec<usize> = results.iter().map(|r| r.failures.len()).collect();
    assert_eq!(failure_counts, vec![0, 1]);
}

#[test]
fn nested_for_each_flattens_into_one_result_list() {
    let rule = for_each_rule(
        expr("groups"),
        "g",
        for_each_rule(
            expr("members"),
            "m",
            single_rule(expr("age"), expr("age >= 18")),
        ),
    );
    let results = validate(
        serde_json::json!({
            "groups": [
                {"members": [{"age": 20}, {"age": 12}]},
                {"members": [{"age": 30}]}
            ]
        }),
        &rule,
    );

    assert_eq!(results.len(), 3);
    let failure_counts: Vec<usize> = results.iter().map(|r| r.failures.len()).collect();
    assert_eq!(failure_counts, vec![0, 1, 0]);
    assert_eq!(results[1].path.to_string(), "groups[0].members[1].age");
}

// ──────────────────────────────────────────────
// Messages and properties
// ──────────────────────────────────────────────

#[test]
fn with_message_surfaces_on_the_outcome() {
    let rule = with_message(
        single_rule(expr("name"), expr("$notEmpty(name)")),
        Expr::text("Name is required"),
    );
    let results = validate(serde_json::json!({"name": ""}), &rule);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].message.as_deref(), Some("Name is required"));
    assert_eq!(results[0].failures.len(), 1);
}

#[test]
fn with_prop_surfaces_through_the_property_accessor() {
    let rule = with_prop(
        single_rule(expr("age"), expr("age >= 18")),
        Expr::text("severity"),
        Expr::text("error"),
    );
    let results = validate(serde_json::json!({"age": 10}), &rule);

    assert_eq!(
        results[0].property("severity"),
        Some(&Value::Text("error".into()))
    );
    assert_eq!(results[0].property("missing"), None);
}

#[test]
fn message_distributes_over_iterated_rules() {
    let rule = with_message(
        for_each_rule(
            expr("items"),
            "i",
            single_rule(expr("value"), expr("value > 7")),
        ),
        Expr::text("too small"),
    );
    let results = validate(
        serde_json::json!({"items": [{"value": 5}, {"value": 10}]}),
        &rule,
    );

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].message.as_deref(), Some("too small"));
    assert_eq!(results[0].failures.len(), 1);
    // the passing element still carries the message annotation
    assert_eq!(results[1].message.as_deref(), Some("too small"));
    assert!(results[1].failures.is_empty());
}

// ──────────────────────────────────────────────
// Navigation
// ──────────────────────────────────────────────

#[test]
fn nested_paths_print_dotted() {
    let rule = single_rule(expr("user.profile.age"), expr("user.profile.age >= 18"));
    let results = validate(
        serde_json::json!({"user": {"profile": {"age": 30}}}),
        &rule,
    );

    assert_eq!(results.len(), 1);
    assert!(results[0].failures.is_empty());
    assert_eq!(results[0].path.to_string(), "user.profile.age");
    assert_eq!(results[0].path_value, Value::Int(30));
}

#[test]
fn missing_nested_fields_surface_as_rule_errors() {
    let rule = single_rule(expr("user.profile.age"), expr("user.profile.age >= 18"));
    let results = validate(serde_json::json!({"user": {}}), &rule);

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert!(!result.errors.is_empty());
    assert!(result
        .errors
        .iter()
        .any(|e| e == "no value at user.profile.age"));
    assert!(!result.passed());
}

// ──────────────────────────────────────────────
// Variables, skips, and hard errors
// ──────────────────────────────────────────────

#[test]
fn top_level_variables_wrap_the_whole_tree() {
    let rule = single_rule(expr("age"), expr("age >= adult"));
    let variables = vec![("adult".to_string(), Expr::int(18))];
    let results =
        validate_data(&serde_json::json!({"age": 15}), &rule, &variables).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].failures.len(), 1);
    assert_eq!(
        results[0].failures[0].evaluated_args,
        vec![Value::Int(15), Value::Int(18)]
    );
}

#[test]
fn non_scalar_assertion_skips_the_rule_silently() {
    // bind the assertion to a lambda; the rule cannot be scored
    let rule = single_rule(expr("age"), Expr::var("check"));
    let variables = vec![(
        "check".to_string(),
        Expr::lambda("x", Expr::var("x")),
    )];
    let results =
        validate_data(&serde_json::json!({"age": 15}), &rule, &variables).unwrap();

    assert!(results.is_empty());
}

#[test]
fn unbound_names_fail_the_whole_call() {
    let rule = multi_rule(vec![
        single_rule(expr("age"), expr("age >= 18")),
        single_rule(expr("age"), expr("age >= mystery")),
    ]);
    let err = validate_data(&serde_json::json!({"age": 20}), &rule, &LetBindings::new())
        .unwrap_err();

    assert_eq!(
        err,
        EvalError::UnboundVariable {
            name: "mystery".to_string()
        }
    );
}
