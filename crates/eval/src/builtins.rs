//! Default function table: comparisons, boolean connectives, arithmetic,
//! `notEmpty`, coercions, and the `.` navigation/iteration operator.
//!
//! Handlers receive the unevaluated call and evaluate their own
//! arguments. Every handler returns a result node whose `deps` list the
//! operand nodes, which is what the rule engine later walks to aggregate
//! failures and dependent paths.

use std::rc::Rc;

use assay_core::{CallExpr, Expr, FieldPath, Segment};

use crate::env::{Environment, FnHandler, FunctionTable};
use crate::numeric;
use crate::types::{EvalError, NodeId, Value, ValueNode};

/// Build the base function table. Validation installs its wrappers on
/// top of this via `intercept::validation_functions`.
pub fn default_functions() -> FunctionTable {
    let mut table = FunctionTable::new();
    for op in ["=", "!=", ">", "<", ">=", "<="] {
        table.insert(op.to_string(), comparison(op));
    }
    for op in ["+", "-", "*", "/"] {
        table.insert(op.to_string(), arithmetic(op));
    }
    table.insert("and".to_string(), Rc::new(and_handler));
    table.insert("or".to_string(), Rc::new(or_handler));
    table.insert("not".to_string(), Rc::new(not_handler));
    table.insert("notEmpty".to_string(), Rc::new(not_empty_handler));
    table.insert("string".to_string(), Rc::new(string_handler));
    table.insert("number".to_string(), Rc::new(number_handler));
    table.insert(".".to_string(), Rc::new(dot_handler));
    table
}

fn arity(call: &CallExpr, expected: usize) -> Result<(), EvalError> {
    if call.args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::TypeError {
            message: format!(
                "'{}' expects {} arguments, got {}",
                call.function,
                expected,
                call.args.len()
            ),
        })
    }
}

// ──────────────────────────────────────────────
// Comparisons and arithmetic
// ──────────────────────────────────────────────

fn comparison(op: &'static str) -> FnHandler {
    Rc::new(move |env: &mut Environment, call| {
        arity(call, 2)?;
        let left = env.evaluate(&call.args[0])?;
        let right = env.evaluate(&call.args[1])?;
        let left_value = env.node(left).value.clone();
        let right_value = env.node(right).value.clone();
        let result = env.comparator().compare(&left_value, &right_value, op)?;
        Ok(env.alloc(ValueNode {
            deps: vec![left, right],
            ..ValueNode::new(Value::Bool(result))
        }))
    })
}

fn arithmetic(op: &'static str) -> FnHandler {
    Rc::new(move |env: &mut Environment, call| {
        arity(call, 2)?;
        let left = env.evaluate(&call.args[0])?;
        let right = env.evaluate(&call.args[1])?;
        let left_value = env.node(left).value.clone();
        let right_value = env.node(right).value.clone();
        let result = numeric::arithmetic(op, &left_value, &right_value)?;
        Ok(env.alloc(ValueNode {
            deps: vec![left, right],
            ..ValueNode::new(result)
        }))
    })
}

// ──────────────────────────────────────────────
// Boolean connectives
// ──────────────────────────────────────────────

fn and_handler(env: &mut Environment, call: &CallExpr) -> Result<NodeId, EvalError> {
    arity(call, 2)?;
    let left = env.evaluate(&call.args[0])?;
    let left_bool = env.node(left).value.as_bool()?;
    if !left_bool {
        // Short-circuit: left is false, skip right
        return Ok(env.alloc(ValueNode {
            deps: vec![left],
            ..ValueNode::new(Value::Bool(false))
        }));
    }
    let right = env.evaluate(&call.args[1])?;
    let right_bool = env.node(right).value.as_bool()?;
    Ok(env.alloc(ValueNode {
        deps: vec![left, right],
        ..ValueNode::new(Value::Bool(right_bool))
    }))
}

fn or_handler(env: &mut Environment, call: &CallExpr) -> Result<NodeId, EvalError> {
    arity(call, 2)?;
    let left = env.evaluate(&call.args[0])?;
    let left_bool = env.node(left).value.as_bool()?;
    if left_bool {
        // Short-circuit: left is true, skip right
        return Ok(env.alloc(ValueNode {
            deps: vec![left],
            ..ValueNode::new(Value::Bool(true))
        }));
    }
    let right = env.evaluate(&call.args[1])?;
    let right_bool = env.node(right).value.as_bool()?;
    Ok(env.alloc(ValueNode {
        deps: vec![left, right],
        ..ValueNode::new(Value::Bool(right_bool))
    }))
}

fn not_handler(env: &mut Environment, call: &CallExpr) -> Result<NodeId, EvalError> {
    arity(call, 1)?;
    let operand = env.evaluate(&call.args[0])?;
    let b = env.node(operand).value.as_bool()?;
    Ok(env.alloc(ValueNode {
        deps: vec![operand],
        ..ValueNode::new(Value::Bool(!b))
    }))
}

// ──────────────────────────────────────────────
// notEmpty and coercions
// ──────────────────────────────────────────────

fn not_empty_handler(env: &mut Environment, call: &CallExpr) -> Result<NodeId, EvalError> {
    arity(call, 1)?;
    let operand = env.evaluate(&call.args[0])?;
    let result = match &env.node(operand).value {
        Value::Null => false,
        Value::Text(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Record(fields) => !fields.is_empty(),
        Value::Bool(_) | Value::Int(_) | Value::Decimal(_) => true,
        Value::Lambda { .. } => {
            return Err(EvalError::TypeError {
                message: "notEmpty is not defined for lambdas".to_string(),
            });
        }
    };
    Ok(env.alloc(ValueNode {
        deps: vec![operand],
        ..ValueNode::new(Value::Bool(result))
    }))
}

fn string_handler(env: &mut Environment, call: &CallExpr) -> Result<NodeId, EvalError> {
    arity(call, 1)?;
    let operand = env.evaluate(&call.args[0])?;
    let value = env.node(operand).value.clone();
    if !value.is_scalar() {
        return Err(EvalError::TypeError {
            message: "string() is not defined for lambdas".to_string(),
        });
    }
    Ok(env.alloc(ValueNode {
        deps: vec![operand],
        ..ValueNode::new(Value::Text(value.to_string()))
    }))
}

fn number_handler(env: &mut Environment, call: &CallExpr) -> Result<NodeId, EvalError> {
    arity(call, 1)?;
    let operand = env.evaluate(&call.args[0])?;
    let value = env.node(operand).value.clone();
    let result = match &value {
        Value::Int(_) | Value::Decimal(_) => value.clone(),
        Value::Text(s) => match s.parse::<i64>() {
            Ok(i) => Value::Int(i),
            Err(_) => s
                .parse()
                .map(Value::Decimal)
                .map_err(|_| EvalError::TypeError {
                    message: format!("cannot convert '{}' to a number", s),
                })?,
        },
        other => {
            return Err(EvalError::TypeError {
                message: format!("cannot convert {} to a number", other.type_name()),
            });
        }
    };
    Ok(env.alloc(ValueNode {
        deps: vec![operand],
        ..ValueNode::new(result)
    }))
}

// ──────────────────────────────────────────────
// Navigation and iteration
// ──────────────────────────────────────────────

/// `.` dispatches on the shape of its second argument:
///
/// - a lambda iterates an array-valued base, refocusing the data onto
///   each element and binding the lambda parameter to the element index;
/// - a bare name navigates to that field of the base;
/// - anything else is evaluated, then used as an index (Int) or field
///   name (Text).
fn dot_handler(env: &mut Environment, call: &CallExpr) -> Result<NodeId, EvalError> {
    arity(call, 2)?;
    let base = env.evaluate(&call.args[0])?;

    match &call.args[1] {
        Expr::Lambda { param, body } => iterate(env, base, param.clone(), body),
        Expr::Var(name) => Ok(navigate(env, base, Segment::Field(name.clone()))),
        other => {
            let segment_id = env.evaluate(other)?;
            match &env.node(segment_id).value {
                Value::Int(i) if *i >= 0 => Ok(navigate(env, base, Segment::Index(*i as usize))),
                Value::Text(name) => Ok(navigate(env, base, Segment::Field(name.clone()))),
                other_value => Err(EvalError::TypeError {
                    message: format!(
                        "'.' segment must be a field name or index, got {}",
                        other_value.type_name()
                    ),
                }),
            }
        }
    }
}

/// Step from a base node to one of its children. Missing children come
/// back as Null with a soft error on the node, so one absent field never
/// aborts a whole batch of rules.
fn navigate(env: &mut Environment, base: NodeId, segment: Segment) -> NodeId {
    let base_node = env.node(base);
    let base_path = base_node.path.clone().unwrap_or_default();
    let (path, found) = match (&base_node.value, &segment) {
        (Value::Record(fields), Segment::Field(name)) => {
            (base_path.field(name.clone()), fields.get(name).cloned())
        }
        (Value::Array(items), Segment::Index(index)) => {
            (base_path.index(*index), items.get(*index).cloned())
        }
        (_, Segment::Field(name)) => (base_path.field(name.clone()), None),
        (_, Segment::Index(index)) => (base_path.index(*index), None),
    };
    let missing = found.is_none();
    let mut node = ValueNode::new(found.unwrap_or(Value::Null));
    if missing {
        node.errors.push(format!("no value at {}", path));
    }
    node.path = Some(path);
    node.deps = vec![base];
    env.alloc(node)
}

/// Evaluate `body` once per element of the array-valued `base`. The data
/// focus moves to the element (its path gains the index segment) and
/// `param` is bound to the element index, so body expressions resolve
/// names against the element itself.
fn iterate(
    env: &mut Environment,
    base: NodeId,
    param: String,
    body: &Expr,
) -> Result<NodeId, EvalError> {
    let base_node = env.node(base);
    let base_path = base_node.path.clone();
    let items = match &base_node.value {
        Value::Array(items) => items.clone(),
        other => {
            return Err(EvalError::TypeError {
                message: format!("cannot iterate over {}", other.type_name()),
            });
        }
    };

    let mut element_ids = Vec::with_capacity(items.len());
    for (index, element) in items.into_iter().enumerate() {
        let element_path = base_path
            .clone()
            .unwrap_or_else(FieldPath::empty)
            .index(index);
        let index_node = env.alloc(ValueNode {
            path: Some(element_path.clone()),
            ..ValueNode::new(Value::Int(index as i64))
        });

        let saved_vars = env.vars.clone();
        let saved_path = std::mem::replace(&mut env.focus_path, element_path);
        let saved_value = std::mem::replace(&mut env.focus_value, element);
        env.vars.insert(param.clone(), index_node);

        let result = env.evaluate(body);

        env.vars = saved_vars;
        env.focus_path = saved_path;
        env.focus_value = saved_value;

        element_ids.push(result?);
    }

    let result = env.array_node(element_ids, base_path);
    env.node_mut(result).deps.push(base);
    Ok(result)
}
