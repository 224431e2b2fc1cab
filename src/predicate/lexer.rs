use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Int(i64),
    Decimal(String),
    Str(String),
    LParen,
    RParen,
    Comma,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// SQL keywords blocked anywhere as a bare token. Not a security boundary
/// on its own (the evaluator never dispatches to a real query engine) —
/// a user-error check atop a safe, in-process AST evaluator.
pub const BLOCKED_KEYWORDS: &[&str] = &["DROP", "INSERT", "ALTER", "UPDATE", "DELETE", "SELECT"];

pub fn tokenize(input: &str) -> Result<Vec<Token>, ValidationError> {
    if input.contains(';') {
        return Err(ValidationError::ExpressionSyntax(
            "semicolons are not allowed".to_string(),
        ));
    }

    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        match c {
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '=' => {
                tokens.push(Token::Eq);
                i += 1;
            }
            '!' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Ne);
                i += 2;
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Le);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Ge);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            '\'' => {
                let mut s = String::new();
                i += 1;
                let mut closed = false;
                while i < chars.len() {
                    if chars[i] == '\'' {
                        closed = true;
                        i += 1;
                        break;
                    }
                    s.push(chars[i]);
                    i += 1;
                }
                if !closed {
                    return Err(ValidationError::ExpressionSyntax(
                        "unterminated string literal".to_string(),
                    ));
                }
                tokens.push(Token::Str(s));
            }
            c if c.is_ascii_digit() => {
                let start = i;
                let mut is_decimal = false;
                while i < chars.len()
                    && (chars[i].is_ascii_digit()
                        || (chars[i] == '.' && !is_decimal && {
                            is_decimal = true;
                            true
                        }))
                {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                if is_decimal {
                    tokens.push(Token::Decimal(text));
                } else {
                    let value: i64 = text.parse().map_err(|_| {
                        ValidationError::ExpressionSyntax(format!("invalid integer '{text}'"))
                    })?;
                    tokens.push(Token::Int(value));
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.')
                {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(Token::Ident(text));
            }
            other => {
                return Err(ValidationError::ExpressionSyntax(format!(
                    "unexpected character '{other}'"
                )));
            }
        }
    }

    for token in &tokens {
        if let Token::Ident(name) = token {
            let upper = name.to_ascii_uppercase();
            if BLOCKED_KEYWORDS.contains(&upper.as_str()) {
                return Err(ValidationError::ForbiddenKeyword { keyword: upper });
            }
        }
    }

    Ok(tokens)
}
