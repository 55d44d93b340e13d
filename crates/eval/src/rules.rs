//! The rule definition language and its translation into expressions.
//!
//! Rules are pure data: a single assertion about one path, an ordered
//! composition, or a per-element iteration. Combinators wrap rules
//! without mutating them; `to_expr` lowers the whole tree into calls the
//! evaluator understands.

use assay_core::Expr;

use crate::env::LetBindings;
use crate::intercept::{VALIDATOR_RULE, WITH_MESSAGE, WITH_PROPERTY};

/// One assertion about one data path.
#[derive(Debug, Clone)]
pub struct SingleRule {
    /// Expression locating the value the rule is about.
    pub path: Expr,
    /// Boolean assertion over that value.
    pub must: Expr,
    /// Optional default properties, overridden by any the assertion
    /// attaches itself.
    pub props: Option<Expr>,
}

/// Iterate an inner rule once per element of a collection.
#[derive(Debug, Clone)]
pub struct ForEachRule {
    /// Expression locating the collection.
    pub path: Expr,
    /// Name the element index is bound to inside each iteration.
    pub index: IndexBinding,
    pub rule: Box<Rule>,
    /// Extra bindings applied around each iteration's rule.
    pub variables: LetBindings,
}

#[derive(Debug, Clone)]
pub struct IndexBinding {
    pub variable: String,
}

/// Message or property annotation layered onto a rule by the
/// `with_message`/`with_prop` combinators.
#[derive(Debug, Clone)]
pub enum Wrapper {
    Message(Expr),
    Property(Expr, Expr),
}

/// A declarative validation rule.
#[derive(Debug, Clone)]
pub enum Rule {
    Single(SingleRule),
    /// Ordered composition; children are independent.
    Multi(Vec<Rule>),
    ForEach(ForEachRule),
    /// A rule plus an annotation; the inner rule is untouched.
    Annotated { rule: Box<Rule>, wrapper: Wrapper },
}

// ──────────────────────────────────────────────
// Constructors and combinators
// ──────────────────────────────────────────────

pub fn single_rule(path: Expr, must: Expr) -> Rule {
    Rule::Single(SingleRule {
        path,
        must,
        props: None,
    })
}

pub fn single_rule_with_props(path: Expr, must: Expr, props: Expr) -> Rule {
    Rule::Single(SingleRule {
        path,
        must,
        props: Some(props),
    })
}

pub fn multi_rule(rules: Vec<Rule>) -> Rule {
    Rule::Multi(rules)
}

pub fn for_each_rule(path: Expr, index_variable: impl Into<String>, rule: Rule) -> Rule {
    Rule::ForEach(ForEachRule {
        path,
        index: IndexBinding {
            variable: index_variable.into(),
        },
        rule: Box::new(rule),
        variables: LetBindings::new(),
    })
}

pub fn for_each_rule_with_vars(
    path: Expr,
    index_variable: impl Into<String>,
    rule: Rule,
    variables: LetBindings,
) -> Rule {
    Rule::ForEach(ForEachRule {
        path,
        index: IndexBinding {
            variable: index_variable.into(),
        },
        rule: Box::new(rule),
        variables,
    })
}

/// Attach a message to a rule's outcome.
pub fn with_message(rule: Rule, message: Expr) -> Rule {
    Rule::Annotated {
        rule: Box::new(rule),
        wrapper: Wrapper::Message(message),
    }
}

/// Attach a named property to a rule's outcome.
pub fn with_prop(rule: Rule, key: Expr, value: Expr) -> Rule {
    Rule::Annotated {
        rule: Box::new(rule),
        wrapper: Wrapper::Property(key, value),
    }
}

/// AND an extra assertion onto a single rule's `must`. Compositions and
/// iterations distribute the extra assertion onto every nested single
/// rule; annotations pass through untouched.
pub fn and_must(rule: Rule, extra: Expr) -> Rule {
    match rule {
        Rule::Single(single) => Rule::Single(SingleRule {
            must: Expr::call("and", vec![single.must, extra]),
            ..single
        }),
        Rule::Multi(rules) => Rule::Multi(
            rules
                .into_iter()
                .map(|r| and_must(r, extra.clone()))
                .collect(),
        ),
        Rule::ForEach(for_each) => Rule::ForEach(ForEachRule {
            rule: Box::new(and_must(*for_each.rule, extra)),
            ..for_each
        }),
        Rule::Annotated { rule, wrapper } => Rule::Annotated {
            rule: Box::new(and_must(*rule, extra)),
            wrapper,
        },
    }
}

// ──────────────────────────────────────────────
// Translation
// ──────────────────────────────────────────────

/// Lower a rule tree into the expression vocabulary:
///
/// - a single rule becomes `ValidatorRule(path, must, props?)`
/// - a composition becomes an array of its children
/// - an iteration becomes `.(path, \index -> inner)`, with per-iteration
///   variables applied through a `let` around the inner expression
/// - annotations wrap each nested assertion's `must` in
///   `WithMessage`/`WithProperty`, so the metadata travels the same
///   dependency walk as the assertion's failures
pub fn to_expr(rule: &Rule) -> Expr {
    lower(rule, &[])
}

fn lower(rule: &Rule, wrappers: &[&Wrapper]) -> Expr {
    match rule {
        Rule::Single(single) => {
            let mut must = single.must.clone();
            for wrapper in wrappers.iter().rev() {
                must = apply_wrapper(wrapper, must);
            }
            let mut args = vec![single.path.clone(), must];
            if let Some(props) = &single.props {
                args.push(props.clone());
            }
            Expr::call(VALIDATOR_RULE, args)
        }

        Rule::Multi(rules) => Expr::array(rules.iter().map(|r| lower(r, wrappers)).collect()),

        Rule::ForEach(for_each) => {
            let mut inner = lower(&for_each.rule, wrappers);
            if !for_each.variables.is_empty() {
                inner = Expr::let_in(for_each.variables.clone(), inner);
            }
            Expr::call(
                ".",
                vec![
                    for_each.path.clone(),
                    Expr::lambda(for_each.index.variable.clone(), inner),
                ],
            )
        }

        Rule::Annotated { rule, wrapper } => {
            let mut stacked: Vec<&Wrapper> = Vec::with_capacity(wrappers.len() + 1);
            stacked.extend_from_slice(wrappers);
            stacked.push(wrapper);
            lower(rule, &stacked)
        }
    }
}

fn apply_wrapper(wrapper: &Wrapper, must: Expr) -> Expr {
    match wrapper {
        Wrapper::Message(message) => Expr::call(WITH_MESSAGE, vec![message.clone(), must]),
        Wrapper::Property(key, value) => {
            Expr::call(WITH_PROPERTY, vec![key.clone(), value.clone(), must])
        }
    }
}
