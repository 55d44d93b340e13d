//! Runtime value and result-node types for the Assay evaluator.
//!
//! These types are DISTINCT from the assay-core AST types: the frontend
//! describes unevaluated expressions, everything here describes what came
//! out of evaluating them -- concrete values, the result-node graph, and
//! the validation metadata rules attach to it.

use std::collections::BTreeMap;
use std::fmt;

use assay_core::{CallExpr, Expr, FieldPath};
use rust_decimal::Decimal;

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors that abort an evaluation. A failing comparison is data, not an
/// error; these are the conditions that fail the whole `validate_data`
/// call instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("unknown function: {name}")]
    UnknownFunction { name: String },

    #[error("unbound variable: {name}")]
    UnboundVariable { name: String },

    #[error("type error: {message}")]
    TypeError { message: String },

    #[error("numeric overflow: {message}")]
    Overflow { message: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid decimal literal '{text}'")]
    InvalidDecimal { text: String },

    #[error("invalid comparison operator: {op}")]
    InvalidOperator { op: String },
}

// ──────────────────────────────────────────────
// Runtime values
// ──────────────────────────────────────────────

/// A concrete evaluated value.
///
/// All numeric comparison goes through `rust_decimal::Decimal` -- no
/// `f64` in the evaluation path. `Lambda` is the one non-scalar variant:
/// wherever a rule needs a concrete value and finds a lambda instead, the
/// rule is skipped rather than scored.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    Text(String),
    Array(Vec<Value>),
    Record(BTreeMap<String, Value>),
    Lambda { param: String, body: Box<Expr> },
}

impl Value {
    /// Returns a human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Decimal(_) => "Decimal",
            Value::Text(_) => "Text",
            Value::Array(_) => "Array",
            Value::Record(_) => "Record",
            Value::Lambda { .. } => "Lambda",
        }
    }

    /// A scalar is any concrete value -- everything except a lambda.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Lambda { .. })
    }

    /// Extracts a boolean or returns a type error.
    pub fn as_bool(&self) -> Result<bool, EvalError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(EvalError::TypeError {
                message: format!("expected Bool, got {}", other.type_name()),
            }),
        }
    }

    /// Convert external JSON input into a runtime value. Whole numbers
    /// become `Int`; everything else numeric becomes `Decimal`, parsed
    /// from the JSON source text so no precision is lost on the way in.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    let text = n.to_string();
                    match text.parse::<Decimal>() {
                        Ok(d) => Value::Decimal(d),
                        Err(_) => match Decimal::from_scientific(&text) {
                            Ok(d) => Value::Decimal(d),
                            Err(_) => Value::Null,
                        },
                    }
                }
            }
            serde_json::Value::String(s) => Value::Text(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(fields) => Value::Record(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Text(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Record(fields) => {
                write!(f, "{{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Lambda { param, .. } => write!(f, "<lambda {}>", param),
        }
    }
}

// ──────────────────────────────────────────────
// Result nodes
// ──────────────────────────────────────────────

/// Handle into the result-node arena owned by an `Environment`.
///
/// Traversals identify nodes by handle, never by content, which is what
/// keeps shared and cyclic dependency graphs terminating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

/// One evaluated result node.
#[derive(Debug, Clone)]
pub struct ValueNode {
    /// The evaluated value.
    pub value: Value,
    /// The data path this value was read from, if it came from the data.
    pub path: Option<FieldPath>,
    /// Nodes this one's evaluation depended on. May share nodes with
    /// other result trees and may form cycles.
    pub deps: Vec<NodeId>,
    /// For array-valued nodes, the per-element result nodes.
    pub elements: Vec<NodeId>,
    /// Validation metadata attached by the rule engine.
    pub meta: NodeMeta,
    /// Soft evaluation notes, e.g. navigation into a missing field.
    /// These never abort evaluation; rules report them per result.
    pub errors: Vec<String>,
}

impl ValueNode {
    pub fn new(value: Value) -> ValueNode {
        ValueNode {
            value,
            path: None,
            deps: Vec::new(),
            elements: Vec::new(),
            meta: NodeMeta::None,
            errors: Vec::new(),
        }
    }
}

/// Metadata slot on a result node.
#[derive(Debug, Clone, Default)]
pub enum NodeMeta {
    #[default]
    None,
    /// Transient per-node metadata accumulated while a rule evaluates.
    Validation(ValidationData),
    /// The packaged outcome of one concretely evaluated rule.
    Rule(EvaluatedRule),
}

// ──────────────────────────────────────────────
// Validation metadata
// ──────────────────────────────────────────────

/// A record of one failed comparison: the call that produced `false` and
/// the concrete operand values at failure time.
#[derive(Debug, Clone)]
pub struct Failure {
    pub call: CallExpr,
    pub evaluated_args: Vec<Value>,
}

/// Per-node metadata carried through a rule's dependency graph:
/// comparison failures, an optional message, and named properties.
#[derive(Debug, Clone, Default)]
pub struct ValidationData {
    pub failures: Vec<Failure>,
    pub message: Option<String>,
    pub properties: BTreeMap<String, Value>,
}

/// The caller-facing outcome of evaluating one rule instance. Iterated
/// rules produce one of these per element. Immutable once returned.
#[derive(Debug, Clone)]
pub struct EvaluatedRule {
    /// The data path the rule asserted about.
    pub path: FieldPath,
    /// The value found at that path.
    pub path_value: Value,
    /// Handle to the evaluated assertion result inside the environment's
    /// arena, for callers that keep the environment around.
    pub result: NodeId,
    /// Every comparison that evaluated to `false` inside the assertion.
    pub failures: Vec<Failure>,
    /// Soft evaluation notes collected from the assertion's graph.
    pub errors: Vec<String>,
    /// First message attached along the assertion's dependency walk.
    pub message: Option<String>,
    /// Every distinct data path the assertion read.
    pub dependent_data: Vec<FieldPath>,
    /// Merged properties; later nodes in the walk win on key collision.
    pub properties: BTreeMap<String, Value>,
}

impl EvaluatedRule {
    /// Look up an attached property by key.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// A rule passes when nothing failed and nothing went soft-wrong.
    pub fn passed(&self) -> bool {
        self.failures.is_empty() && self.errors.is_empty()
    }
}
