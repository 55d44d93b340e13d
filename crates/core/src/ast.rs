//! Expression AST shared by the parser and the evaluator.
//!
//! These types are produced by the parser (or constructed programmatically
//! by the rule translator) and consumed by `assay-eval`. No resolution or
//! type checking happens here.

// ──────────────────────────────────────────────
// Literals
// ──────────────────────────────────────────────

/// A literal value as it appears in an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    /// Decimal literal -- kept as source text to preserve exact
    /// representation; converted at evaluation time.
    Decimal(String),
    Str(String),
}

// ──────────────────────────────────────────────
// Expressions
// ──────────────────────────────────────────────

/// A function call: name plus unevaluated argument expressions.
///
/// Handlers receive the whole call and evaluate arguments themselves,
/// which is what lets wrappers re-evaluate arguments independently.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub function: String,
    pub args: Vec<Expr>,
}

/// A node in the unevaluated expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Call(CallExpr),
    /// A name resolved at evaluation time: first against bound variables,
    /// then as a field of the data currently in focus.
    Var(String),
    Lambda {
        param: String,
        body: Box<Expr>,
    },
    Let {
        bindings: Vec<(String, Expr)>,
        body: Box<Expr>,
    },
    Array(Vec<Expr>),
}

impl Expr {
    pub fn null() -> Expr {
        Expr::Literal(Literal::Null)
    }

    pub fn bool(value: bool) -> Expr {
        Expr::Literal(Literal::Bool(value))
    }

    pub fn int(value: i64) -> Expr {
        Expr::Literal(Literal::Int(value))
    }

    /// Decimal literal from its textual form, e.g. `Expr::decimal("0.25")`.
    pub fn decimal(text: impl Into<String>) -> Expr {
        Expr::Literal(Literal::Decimal(text.into()))
    }

    pub fn text(value: impl Into<String>) -> Expr {
        Expr::Literal(Literal::Str(value.into()))
    }

    pub fn var(name: impl Into<String>) -> Expr {
        Expr::Var(name.into())
    }

    pub fn call(function: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::Call(CallExpr {
            function: function.into(),
            args,
        })
    }

    pub fn lambda(param: impl Into<String>, body: Expr) -> Expr {
        Expr::Lambda {
            param: param.into(),
            body: Box::new(body),
        }
    }

    pub fn let_in(bindings: Vec<(String, Expr)>, body: Expr) -> Expr {
        Expr::Let {
            bindings,
            body: Box::new(body),
        }
    }

    pub fn array(items: Vec<Expr>) -> Expr {
        Expr::Array(items)
    }
}
