//! assay-core: expression frontend for the Assay rule engine.
//!
//! Provides the unevaluated expression tree and the textual form rule
//! authors write:
//!
//! - [`parse_eval()`] -- parse a textual expression into an [`Expr`] tree
//! - [`Expr`] / [`CallExpr`] / [`Literal`] -- the expression AST
//! - [`FieldPath`] -- a path into the validated data, with its printed form
//! - [`ParseError`] -- lexer and parser errors
//!
//! Evaluation lives in `assay-eval`; this crate never assigns meaning to
//! an expression beyond its shape.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod path;

pub use ast::{CallExpr, Expr, Literal};
pub use error::ParseError;
pub use parser::parse_eval;
pub use path::{FieldPath, Segment};
