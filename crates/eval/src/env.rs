//! Evaluation environment: function table, variable scope, data focus,
//! and the result-node arena.
//!
//! One environment serves one validation call. Nodes are allocated into
//! the arena and addressed by [`NodeId`]; handing the same id to several
//! `deps` lists is what produces shared result graphs, and traversals
//! must tolerate that (see `aggregate` and `collect`).

use std::collections::BTreeMap;
use std::rc::Rc;

use assay_core::{CallExpr, Expr, FieldPath, Literal};

use crate::numeric::SignificantDigitComparator;
use crate::types::{EvalError, NodeId, Value, ValueNode};

/// A function handler: receives the environment and the unevaluated call,
/// evaluates whichever arguments it needs, and returns a result node.
pub type FnHandler = Rc<dyn Fn(&mut Environment, &CallExpr) -> Result<NodeId, EvalError>>;

/// Named function handlers available to expressions.
pub type FunctionTable = BTreeMap<String, FnHandler>;

/// Ordered name/expression pairs applied as a `let` wrapper.
pub type LetBindings = Vec<(String, Expr)>;

pub struct Environment {
    nodes: Vec<ValueNode>,
    functions: FunctionTable,
    /// Let- and lambda-bound names. Saved and restored around scopes;
    /// a bound name resolves to the same node on every reference.
    pub(crate) vars: BTreeMap<String, NodeId>,
    /// The data value names fall back to when they are not bound, and
    /// the path it sits at. Starts as the root data at the empty path;
    /// iteration refocuses onto each element.
    pub(crate) focus_path: FieldPath,
    pub(crate) focus_value: Value,
    comparator: SignificantDigitComparator,
}

impl Environment {
    /// Build an environment over `data`, focused at the empty path, with
    /// the given function table and the default comparator.
    pub fn new(functions: FunctionTable, data: Value) -> Environment {
        Environment {
            nodes: Vec::new(),
            functions,
            vars: BTreeMap::new(),
            focus_path: FieldPath::empty(),
            focus_value: data,
            comparator: SignificantDigitComparator::default(),
        }
    }

    pub fn with_comparator(mut self, comparator: SignificantDigitComparator) -> Environment {
        self.comparator = comparator;
        self
    }

    pub fn comparator(&self) -> &SignificantDigitComparator {
        &self.comparator
    }

    // -- Arena ---------------------------------------------------

    pub fn node(&self, id: NodeId) -> &ValueNode {
        &self.nodes[id.0 as usize]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut ValueNode {
        &mut self.nodes[id.0 as usize]
    }

    pub(crate) fn alloc(&mut self, node: ValueNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub(crate) fn alloc_value(&mut self, value: Value) -> NodeId {
        self.alloc(ValueNode::new(value))
    }

    /// The null literal node used wherever a rule cannot be scored.
    pub(crate) fn null_node(&mut self) -> NodeId {
        self.alloc_value(Value::Null)
    }

    // -- Evaluation ----------------------------------------------

    /// Evaluate an expression tree to a result node.
    ///
    /// Failing comparisons are values, not errors; an `Err` here means
    /// the expression itself could not be evaluated (unknown name or
    /// function, bad operand types) and aborts the whole call.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<NodeId, EvalError> {
        match expr {
            Expr::Literal(literal) => {
                let value = self.literal_value(literal)?;
                Ok(self.alloc_value(value))
            }

            Expr::Var(name) => self.resolve_var(name),

            Expr::Call(call) => {
                let handler = self.functions.get(&call.function).cloned().ok_or_else(|| {
                    EvalError::UnknownFunction {
                        name: call.function.clone(),
                    }
                })?;
                handler(self, call)
            }

            Expr::Lambda { param, body } => Ok(self.alloc_value(Value::Lambda {
                param: param.clone(),
                body: body.clone(),
            })),

            Expr::Let { bindings, body } => {
                let saved = self.vars.clone();
                let mut bound = Ok(());
                for (name, bound_expr) in bindings {
                    match self.evaluate(bound_expr) {
                        Ok(id) => {
                            self.vars.insert(name.clone(), id);
                        }
                        Err(e) => {
                            bound = Err(e);
                            break;
                        }
                    }
                }
                let result = match bound {
                    Ok(()) => self.evaluate(body),
                    Err(e) => Err(e),
                };
                self.vars = saved;
                result
            }

            Expr::Array(items) => {
                let mut element_ids = Vec::with_capacity(items.len());
                for item in items {
                    element_ids.push(self.evaluate(item)?);
                }
                Ok(self.array_node(element_ids, None))
            }
        }
    }

    /// Build an array node over already-evaluated element nodes.
    pub(crate) fn array_node(&mut self, element_ids: Vec<NodeId>, path: Option<FieldPath>) -> NodeId {
        let values: Vec<Value> = element_ids
            .iter()
            .map(|id| self.node(*id).value.clone())
            .collect();
        self.alloc(ValueNode {
            value: Value::Array(values),
            path,
            deps: element_ids.clone(),
            elements: element_ids,
            meta: Default::default(),
            errors: Vec::new(),
        })
    }

    fn literal_value(&self, literal: &Literal) -> Result<Value, EvalError> {
        Ok(match literal {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => Value::Int(*i),
            Literal::Decimal(text) => {
                let d = text
                    .parse()
                    .map_err(|_| EvalError::InvalidDecimal { text: text.clone() })?;
                Value::Decimal(d)
            }
            Literal::Str(s) => Value::Text(s.clone()),
        })
    }

    /// A name resolves first against bound variables (returning the bound
    /// node itself, so repeated references share one node), then as a
    /// field of the focused data. Anything else is unbound.
    fn resolve_var(&mut self, name: &str) -> Result<NodeId, EvalError> {
        if let Some(&id) = self.vars.get(name) {
            return Ok(id);
        }
        if let Value::Record(fields) = &self.focus_value {
            if let Some(value) = fields.get(name) {
                let value = value.clone();
                let path = self.focus_path.field(name);
                return Ok(self.alloc(ValueNode {
                    path: Some(path),
                    ..ValueNode::new(value)
                }));
            }
        }
        Err(EvalError::UnboundVariable {
            name: name.to_string(),
        })
    }
}
