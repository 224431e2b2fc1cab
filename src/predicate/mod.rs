//! Safe evaluation of the restricted rule-filter sublanguage described in
//! the compliance design: a lexer/parser into an explicit AST, evaluated
//! in-process against a bound row. Never dispatches user text to a real
//! query engine.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

use crate::error::ValidationError;
use crate::store::JoinedHoldingRow;
use ast::Expr;

/// A validated, parsed rule filter expression.
#[derive(Debug, Clone)]
pub struct Predicate {
    expr: Expr,
}

impl Predicate {
    /// Parses and validates `expression` (already stripped of a leading
    /// `WHERE`, per `Rule::normalized_expression`). Validation runs the
    /// parsed tree against a canned single-row probe so a rule that parses
    /// but cannot execute is still rejected at create/update time.
    pub fn compile(expression: &str) -> Result<Self, ValidationError> {
        let expr = parser::parse(expression)?;
        let predicate = Self { expr };
        predicate.validate_against_probe()?;
        Ok(predicate)
    }

    fn validate_against_probe(&self) -> Result<(), ValidationError> {
        let probe = JoinedHoldingRow {
            holdings_ticker: "TEST".to_string(),
            holdings_shares: 100,
            holdings_fund_id: 1,
            securities_ticker: "TEST".to_string(),
            securities_name: "Test Security".to_string(),
            securities_type: "equity".to_string(),
            securities_shares_outstanding: Some(1_000_000),
            issuers_name: "Test Issuer".to_string(),
            issuers_gics_sector: "Technology".to_string(),
            issuers_gics_industry_grp: "Technology".to_string(),
            issuers_gics_industry: "Technology".to_string(),
            issuers_gics_sub_industry: "Technology".to_string(),
            issuers_country_domicile: "United States".to_string(),
            issuers_country_incorporation: "United States".to_string(),
            issuers_country_domicile_code: "USA".to_string(),
            issuers_country_incorporation_code: "USA".to_string(),
        };
        // Evaluation over the closed AST cannot itself fail at runtime
        // (every column resolves to a known field); the probe exists so a
        // future richer predicate form with fallible evaluation has
        // somewhere to report failure without changing this API.
        let _ = eval::evaluate(&self.expr, &probe);
        Ok(())
    }

    pub fn matches(&self, row: &JoinedHoldingRow) -> bool {
        eval::evaluate(&self.expr, row)
    }
}
