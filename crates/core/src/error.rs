/// Errors produced while turning expression text into an [`crate::Expr`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The lexer hit a character sequence it cannot tokenize.
    #[error("lex error at line {line}: {message}")]
    Lex { line: u32, message: String },

    /// The token stream does not form a valid expression.
    #[error("parse error at line {line}: {message}")]
    Parse { line: u32, message: String },
}

impl ParseError {
    pub fn lex(line: u32, message: impl Into<String>) -> Self {
        ParseError::Lex {
            line,
            message: message.into(),
        }
    }

    pub fn parse(line: u32, message: impl Into<String>) -> Self {
        ParseError::Parse {
            line,
            message: message.into(),
        }
    }
}
