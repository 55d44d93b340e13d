//! Recursive descent parser for the textual expression form.
//!
//! Produces the [`Expr`] tree without resolving names or types. Lambdas
//! and let-bindings have no textual form -- they are constructed
//! programmatically by the rule translator.

use crate::ast::{CallExpr, Expr, Literal};
use crate::error::ParseError;
use crate::lexer::{lex, Spanned, Token};

/// Parse a textual expression into an [`Expr`] tree.
///
/// Grammar, loosest binding first: `or`, `and`, comparisons
/// (`= != < <= > >=`, non-associative), `+ -`, `* /`, prefix `not` and
/// `-`, then postfix navigation (`a.b`, `a[i]`). Function calls are
/// `name(args)` with an optional `$` prefix.
pub fn parse_eval(src: &str) -> Result<Expr, ParseError> {
    let tokens = lex(src)?;
    let mut parser = Parser::new(&tokens);
    let expr = parser.parse_expr()?;
    parser.expect_eof()?;
    Ok(expr)
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned]) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn cur(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.cur().token
    }

    fn advance(&mut self) -> &Spanned {
        let t = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn is_word(&self, expected: &str) -> bool {
        matches!(self.peek(), Token::Word(w) if w == expected)
    }

    fn err(&self, message: impl Into<String>) -> ParseError {
        ParseError::parse(self.cur().line, message)
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), ParseError> {
        if self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected {}, got {:?}", what, self.peek())))
        }
    }

    fn expect_eof(&self) -> Result<(), ParseError> {
        if self.peek() == &Token::Eof {
            Ok(())
        } else {
            Err(self.err(format!("unexpected trailing input: {:?}", self.peek())))
        }
    }

    fn take_word(&mut self) -> Result<String, ParseError> {
        match self.peek().clone() {
            Token::Word(w) => {
                self.advance();
                Ok(w)
            }
            other => Err(self.err(format!("expected identifier, got {:?}", other))),
        }
    }

    // -- Expression parsing --------------------------------------

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_or_expr()
    }

    fn parse_or_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and_expr()?;
        while self.is_word("or") {
            self.advance();
            let right = self.parse_and_expr()?;
            left = Expr::call("or", vec![left, right]);
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_compare_expr()?;
        while self.is_word("and") {
            self.advance();
            let right = self.parse_compare_expr()?;
            left = Expr::call("and", vec![left, right]);
        }
        Ok(left)
    }

    fn parse_compare_expr(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_add_expr()?;
        let op = match self.peek() {
            Token::Eq => "=",
            Token::Neq => "!=",
            Token::Lt => "<",
            Token::Lte => "<=",
            Token::Gt => ">",
            Token::Gte => ">=",
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_add_expr()?;
        Ok(Expr::call(op, vec![left, right]))
    }

    fn parse_add_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_mul_expr()?;
        loop {
            let op = match self.peek() {
                Token::Plus => "+",
                Token::Minus => "-",
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_mul_expr()?;
            left = Expr::call(op, vec![left, right]);
        }
    }

    fn parse_mul_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary_expr()?;
        loop {
            let op = match self.peek() {
                Token::Star => "*",
                Token::Slash => "/",
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary_expr()?;
            left = Expr::call(op, vec![left, right]);
        }
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, ParseError> {
        if self.is_word("not") {
            self.advance();
            let operand = self.parse_unary_expr()?;
            return Ok(Expr::call("not", vec![operand]));
        }
        if self.peek() == &Token::Minus {
            self.advance();
            let operand = self.parse_unary_expr()?;
            // Fold the sign into literals; otherwise subtract from zero.
            return Ok(match operand {
                Expr::Literal(Literal::Int(n)) => Expr::int(-n),
                Expr::Literal(Literal::Decimal(text)) => Expr::decimal(format!("-{}", text)),
                other => Expr::call("-", vec![Expr::int(0), other]),
            });
        }
        self.parse_postfix_expr()
    }

    fn parse_postfix_expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.peek() {
                Token::Dot => {
                    self.advance();
                    let field = self.take_word()?;
                    expr = Expr::call(".", vec![expr, Expr::var(field)]);
                }
                Token::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(&Token::RBracket, "']'")?;
                    expr = Expr::call(".", vec![expr, index]);
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        match self.peek().clone() {
            Token::Int(n) => {
                self.advance();
                Ok(Expr::int(n))
            }
            Token::Float(text) => {
                self.advance();
                Ok(Expr::decimal(text))
            }
            Token::Str(s) => {
                self.advance();
                Ok(Expr::text(s))
            }
            Token::Dollar => {
                self.advance();
                let name = self.take_word()?;
                self.parse_call(name)
            }
            Token::Word(w) => match w.as_str() {
                "true" => {
                    self.advance();
                    Ok(Expr::bool(true))
                }
                "false" => {
                    self.advance();
                    Ok(Expr::bool(false))
                }
                "null" => {
                    self.advance();
                    Ok(Expr::null())
                }
                _ => {
                    self.advance();
                    if self.peek() == &Token::LParen {
                        self.parse_call(w)
                    } else {
                        Ok(Expr::var(w))
                    }
                }
            },
            Token::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(expr)
            }
            Token::LBracket => {
                self.advance();
                let items = self.parse_args(&Token::RBracket)?;
                self.expect(&Token::RBracket, "']'")?;
                Ok(Expr::array(items))
            }
            other => Err(self.err(format!("expected expression, got {:?}", other))),
        }
    }

    /// Parse `(args…)` after a function name.
    fn parse_call(&mut self, name: String) -> Result<Expr, ParseError> {
        self.expect(&Token::LParen, "'('")?;
        let args = self.parse_args(&Token::RParen)?;
        self.expect(&Token::RParen, "')'")?;
        Ok(Expr::Call(CallExpr {
            function: name,
            args,
        }))
    }

    fn parse_args(&mut self, close: &Token) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        while self.peek() != close && self.peek() != &Token::Eof {
            args.push(self.parse_expr()?);
            if self.peek() == &Token::Comma {
                self.advance();
            }
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn comparison() {
        assert_eq!(
            parse_eval("value > 10").unwrap(),
            Expr::call(">", vec![Expr::var("value"), Expr::int(10)])
        );
    }

    #[test]
    fn function_call_with_dollar_prefix() {
        assert_eq!(
            parse_eval("$notEmpty(email)").unwrap(),
            Expr::call("notEmpty", vec![Expr::var("email")])
        );
        assert_eq!(
            parse_eval("notEmpty(email)").unwrap(),
            Expr::call("notEmpty", vec![Expr::var("email")])
        );
    }

    #[test]
    fn navigation_desugars_to_dot_calls() {
        assert_eq!(
            parse_eval("user.profile.age").unwrap(),
            Expr::call(
                ".",
                vec![
                    Expr::call(".", vec![Expr::var("user"), Expr::var("profile")]),
                    Expr::var("age")
                ]
            )
        );
    }

    #[test]
    fn index_navigation() {
        assert_eq!(
            parse_eval("items[1].value").unwrap(),
            Expr::call(
                ".",
                vec![
                    Expr::call(".", vec![Expr::var("items"), Expr::int(1)]),
                    Expr::var("value")
                ]
            )
        );
    }

    #[test]
    fn precedence_and_over_or_comparisons_tighter() {
        assert_eq!(
            parse_eval("a > 1 and b < 2 or c = 3").unwrap(),
            Expr::call(
                "or",
                vec![
                    Expr::call(
                        "and",
                        vec![
                            Expr::call(">", vec![Expr::var("a"), Expr::int(1)]),
                            Expr::call("<", vec![Expr::var("b"), Expr::int(2)]),
                        ]
                    ),
                    Expr::call("=", vec![Expr::var("c"), Expr::int(3)]),
                ]
            )
        );
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(
            parse_eval("a + b * 2").unwrap(),
            Expr::call(
                "+",
                vec![
                    Expr::var("a"),
                    Expr::call("*", vec![Expr::var("b"), Expr::int(2)])
                ]
            )
        );
    }

    #[test]
    fn negative_literals_fold() {
        assert_eq!(parse_eval("-5").unwrap(), Expr::int(-5));
        assert_eq!(parse_eval("-0.5").unwrap(), Expr::decimal("-0.5"));
    }

    #[test]
    fn array_literal() {
        assert_eq!(
            parse_eval("[1, 2, 3]").unwrap(),
            Expr::array(vec![Expr::int(1), Expr::int(2), Expr::int(3)])
        );
    }

    #[test]
    fn keywords_parse_as_literals() {
        assert_eq!(parse_eval("true").unwrap(), Expr::bool(true));
        assert_eq!(parse_eval("null").unwrap(), Expr::null());
    }

    #[test]
    fn trailing_input_is_an_error() {
        assert!(parse_eval("a b").is_err());
    }

    #[test]
    fn not_binds_tighter_than_and() {
        assert_eq!(
            parse_eval("not a and b").unwrap(),
            Expr::call(
                "and",
                vec![Expr::call("not", vec![Expr::var("a")]), Expr::var("b")]
            )
        );
    }
}
