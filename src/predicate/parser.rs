use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::predicate::ast::{CmpOp, Column, Expr, Operand};
use crate::predicate::lexer::{tokenize, Token};

/// Parses a restricted SQL-like WHERE body into an [`Expr`] tree. An empty
/// (or all-whitespace) expression parses to [`Expr::True`].
pub fn parse(expression: &str) -> Result<Expr, ValidationError> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Ok(Expr::True);
    }

    let tokens = tokenize(trimmed)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(ValidationError::ExpressionSyntax(format!(
            "unexpected trailing token at position {}",
            parser.pos
        )));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn peek_ident_upper(&self) -> Option<String> {
        match self.peek() {
            Some(Token::Ident(s)) => Some(s.to_ascii_uppercase()),
            _ => None,
        }
    }

    fn eat_ident(&mut self, keyword: &str) -> bool {
        if self.peek_ident_upper().as_deref() == Some(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ValidationError> {
        let mut left = self.parse_and()?;
        while self.eat_ident("OR") {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ValidationError> {
        let mut left = self.parse_not()?;
        while self.eat_ident("AND") {
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ValidationError> {
        if self.eat_ident("NOT") {
            let inner = self.parse_not()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ValidationError> {
        if matches!(self.peek(), Some(Token::LParen)) {
            self.advance();
            let inner = self.parse_or()?;
            match self.advance() {
                Some(Token::RParen) => return Ok(inner),
                _ => {
                    return Err(ValidationError::ExpressionSyntax(
                        "expected closing parenthesis".to_string(),
                    ))
                }
            }
        }

        let left = self.parse_operand()?;

        if self.eat_ident("NOT") {
            if !self.eat_ident("IN") {
                return Err(ValidationError::ExpressionSyntax(
                    "expected IN after NOT".to_string(),
                ));
            }
            let list = self.parse_in_list()?;
            return Ok(Expr::In {
                operand: left,
                list,
                negated: true,
            });
        }

        if self.eat_ident("IN") {
            let list = self.parse_in_list()?;
            return Ok(Expr::In {
                operand: left,
                list,
                negated: false,
            });
        }

        if self.eat_ident("LIKE") {
            let pattern = match self.advance() {
                Some(Token::Str(s)) => s,
                _ => {
                    return Err(ValidationError::ExpressionSyntax(
                        "expected string literal after LIKE".to_string(),
                    ))
                }
            };
            return Ok(Expr::Like {
                operand: left,
                pattern,
            });
        }

        let op = match self.advance() {
            Some(Token::Eq) => CmpOp::Eq,
            Some(Token::Ne) => CmpOp::Ne,
            Some(Token::Lt) => CmpOp::Lt,
            Some(Token::Le) => CmpOp::Le,
            Some(Token::Gt) => CmpOp::Gt,
            Some(Token::Ge) => CmpOp::Ge,
            other => {
                return Err(ValidationError::ExpressionSyntax(format!(
                    "expected comparison operator, got {other:?}"
                )))
            }
        };
        let right = self.parse_operand()?;
        Ok(Expr::Compare { left, op, right })
    }

    fn parse_in_list(&mut self) -> Result<Vec<Operand>, ValidationError> {
        if self.advance() != Some(Token::LParen) {
            return Err(ValidationError::ExpressionSyntax(
                "expected '(' after IN".to_string(),
            ));
        }
        let mut list = Vec::new();
        loop {
            list.push(self.parse_operand()?);
            match self.peek() {
                Some(Token::Comma) => {
                    self.advance();
                }
                Some(Token::RParen) => {
                    self.advance();
                    break;
                }
                other => {
                    return Err(ValidationError::ExpressionSyntax(format!(
                        "expected ',' or ')' in IN list, got {other:?}"
                    )))
                }
            }
        }
        Ok(list)
    }

    fn parse_operand(&mut self) -> Result<Operand, ValidationError> {
        match self.advance() {
            Some(Token::Int(n)) => Ok(Operand::Int(n)),
            Some(Token::Decimal(s)) => {
                let d = Decimal::from_str(&s).map_err(|_| {
                    ValidationError::ExpressionSyntax(format!("invalid decimal literal '{s}'"))
                })?;
                Ok(Operand::Decimal(d))
            }
            Some(Token::Str(s)) => Ok(Operand::Str(s)),
            Some(Token::Ident(name)) => {
                let column = Column::from_str(&name)
                    .map_err(|_| ValidationError::UnknownColumn(name.clone()))?;
                Ok(Operand::Column(column))
            }
            other => Err(ValidationError::ExpressionSyntax(format!(
                "expected operand, got {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_expression_is_true() {
        assert_eq!(parse("").unwrap(), Expr::True);
        assert_eq!(parse("   ").unwrap(), Expr::True);
    }

    #[test]
    fn parses_simple_comparison() {
        let expr = parse("holdings.shares >= 100").unwrap();
        assert_eq!(
            expr,
            Expr::Compare {
                left: Operand::Column(Column::HoldingsShares),
                op: CmpOp::Ge,
                right: Operand::Int(100),
            }
        );
    }

    #[test]
    fn parses_and_or_precedence() {
        // AND binds tighter than OR
        let expr = parse("holdings.shares = 1 OR holdings.shares = 2 AND holdings.fund_id = 3").unwrap();
        match expr {
            Expr::Or(left, right) => {
                assert!(matches!(*left, Expr::Compare { .. }));
                assert!(matches!(*right, Expr::And(_, _)));
            }
            other => panic!("expected Or at top level, got {other:?}"),
        }
    }

    #[test]
    fn parses_in_list() {
        let expr = parse("issuers.country_incorporation_code IN ('PRK', 'MMR', 'TKM')").unwrap();
        match expr {
            Expr::In { list, negated, .. } => {
                assert!(!negated);
                assert_eq!(list.len(), 3);
            }
            other => panic!("expected In, got {other:?}"),
        }
    }

    #[test]
    fn parses_not_in() {
        let expr = parse("issuers.country_incorporation_code NOT IN ('USA')").unwrap();
        assert!(matches!(expr, Expr::In { negated: true, .. }));
    }

    #[test]
    fn parses_parenthesized_not() {
        let expr = parse("NOT (holdings.shares = 1 AND holdings.fund_id = 2)").unwrap();
        assert!(matches!(expr, Expr::Not(_)));
    }

    #[test]
    fn strips_where_prefix_before_parsing() {
        // parse() itself does not strip WHERE; Rule::normalized_expression does.
        // An explicit WHERE token is just an unknown column and should error.
        assert!(parse("WHERE holdings.shares = 1").is_err());
    }

    #[test]
    fn rejects_unknown_column() {
        assert!(matches!(
            parse("foo.bar = 1"),
            Err(ValidationError::UnknownColumn(_))
        ));
    }

    #[test]
    fn parses_like() {
        let expr = parse("securities.name LIKE '%Corp%'").unwrap();
        assert!(matches!(expr, Expr::Like { .. }));
    }
}
