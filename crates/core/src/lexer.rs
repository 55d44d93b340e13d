//! Tokenizer for the textual expression form.

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifiers and keywords -- distinguished in the parser
    Word(String),
    /// Quoted string literal (content without quotes, escapes resolved)
    Str(String),
    /// Integer literal
    Int(i64),
    /// Decimal literal -- kept as string to preserve exact representation
    Float(String),
    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Dollar,
    // Comparison operators
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    // Arithmetic operators
    Plus,
    Minus,
    Star,
    Slash,
    // End of input
    Eof,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
}

pub fn lex(src: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut pos = 0usize;
    let mut line: u32 = 1;

    while pos < chars.len() {
        let c = chars[pos];

        // Line comment
        if c == '/' && pos + 1 < chars.len() && chars[pos + 1] == '/' {
            while pos < chars.len() && chars[pos] != '\n' {
                pos += 1;
            }
            continue;
        }

        // Whitespace
        if c.is_whitespace() {
            if c == '\n' {
                line += 1;
            }
            pos += 1;
            continue;
        }

        let tok_line = line;

        // String literal
        if c == '"' {
            pos += 1;
            let mut s = String::new();
            loop {
                if pos >= chars.len() {
                    return Err(ParseError::lex(tok_line, "unterminated string literal"));
                }
                let sc = chars[pos];
                if sc == '"' {
                    pos += 1;
                    break;
                }
                if sc == '\\' {
                    pos += 1;
                    if pos >= chars.len() {
                        return Err(ParseError::lex(tok_line, "unterminated escape in string"));
                    }
                    let ec = chars[pos];
                    match ec {
                        '"' => s.push('"'),
                        '\\' => s.push('\\'),
                        'n' => s.push('\n'),
                        't' => s.push('\t'),
                        other => {
                            return Err(ParseError::lex(
                                tok_line,
                                format!("unknown escape '\\{}'", other),
                            ));
                        }
                    }
                    pos += 1;
                    continue;
                }
                if sc == '\n' {
                    line += 1;
                }
                s.push(sc);
                pos += 1;
            }
            tokens.push(Spanned {
                token: Token::Str(s),
                line: tok_line,
            });
            continue;
        }

        // Number literal
        if c.is_ascii_digit() {
            let mut text = String::new();
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                text.push(chars[pos]);
                pos += 1;
            }
            // A dot only belongs to the number when a digit follows;
            // otherwise it is navigation (`items[0].value` vs `0.5`).
            if pos + 1 < chars.len() && chars[pos] == '.' && chars[pos + 1].is_ascii_digit() {
                text.push('.');
                pos += 1;
                while pos < chars.len() && chars[pos].is_ascii_digit() {
                    text.push(chars[pos]);
                    pos += 1;
                }
                tokens.push(Spanned {
                    token: Token::Float(text),
                    line: tok_line,
                });
            } else {
                let n: i64 = text
                    .parse()
                    .map_err(|_| ParseError::lex(tok_line, format!("integer out of range: {}", text)))?;
                tokens.push(Spanned {
                    token: Token::Int(n),
                    line: tok_line,
                });
            }
            continue;
        }

        // Identifier / keyword
        if c.is_alphabetic() || c == '_' {
            let mut word = String::new();
            while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                word.push(chars[pos]);
                pos += 1;
            }
            tokens.push(Spanned {
                token: Token::Word(word),
                line: tok_line,
            });
            continue;
        }

        // Operators and punctuation
        let token = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ',' => Token::Comma,
            '.' => Token::Dot,
            '$' => Token::Dollar,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '=' => Token::Eq,
            '!' => {
                if pos + 1 < chars.len() && chars[pos + 1] == '=' {
                    pos += 1;
                    Token::Neq
                } else {
                    return Err(ParseError::lex(tok_line, "expected '=' after '!'"));
                }
            }
            '<' => {
                if pos + 1 < chars.len() && chars[pos + 1] == '=' {
                    pos += 1;
                    Token::Lte
                } else {
                    Token::Lt
                }
            }
            '>' => {
                if pos + 1 < chars.len() && chars[pos + 1] == '=' {
                    pos += 1;
                    Token::Gte
                } else {
                    Token::Gt
                }
            }
            other => {
                return Err(ParseError::lex(
                    tok_line,
                    format!("unexpected character '{}'", other),
                ));
            }
        };
        pos += 1;
        tokens.push(Spanned {
            token,
            line: tok_line,
        });
    }

    tokens.push(Spanned {
        token: Token::Eof,
        line,
    });
    Ok(tokens)
}
