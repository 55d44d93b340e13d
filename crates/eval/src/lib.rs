//! assay-eval: rule evaluator for the Assay validation engine.
//!
//! Accepts a declarative rule tree plus input data, evaluates the rules
//! through the expression runtime, and produces one structured outcome
//! per concretely evaluated rule: pass/fail, the failing comparisons and
//! their operand values, an optional message, named properties, and the
//! data paths the outcome depended on.
//!
//! Typical use:
//!
//! ```
//! use assay_core::parse_eval;
//! use assay_eval::{single_rule, validate_data};
//!
//! let rule = single_rule(
//!     parse_eval("value").unwrap(),
//!     parse_eval("value > 10").unwrap(),
//! );
//! let data = serde_json::json!({"value": 5});
//! let results = validate_data(&data, &rule, &Vec::new()).unwrap();
//! assert_eq!(results.len(), 1);
//! assert_eq!(results[0].failures.len(), 1);
//! ```

pub mod aggregate;
pub mod builtins;
pub mod collect;
pub mod env;
pub mod intercept;
pub mod numeric;
pub mod rules;
pub mod types;
pub mod validate;

pub use aggregate::{aggregate_validation, collect_errors, collect_paths};
pub use collect::collect_rules;
pub use env::{Environment, FnHandler, FunctionTable, LetBindings};
pub use numeric::{SignificantDigitComparator, DEFAULT_SIGNIFICANT_DIGITS};
pub use rules::{
    and_must, for_each_rule, for_each_rule_with_vars, multi_rule, single_rule,
    single_rule_with_props, to_expr, with_message, with_prop, ForEachRule, IndexBinding, Rule,
    SingleRule, Wrapper,
};
pub use types::{
    EvalError, EvaluatedRule, Failure, NodeId, NodeMeta, ValidationData, Value, ValueNode,
};
pub use validate::{validate_data, validate_rules, validation_environment};
