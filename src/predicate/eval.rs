use rust_decimal::Decimal;

use crate::predicate::ast::{CmpOp, Column, Expr, Operand};
use crate::store::JoinedHoldingRow;

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Int(i64),
    Decimal(Decimal),
    Str(String),
    Null,
}

impl Value {
    fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Int(n) => Some(Decimal::from(*n)),
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }
}

fn column_value(column: Column, row: &JoinedHoldingRow) -> Value {
    match column {
        Column::HoldingsTicker => Value::Str(row.holdings_ticker.clone()),
        Column::HoldingsShares => Value::Int(row.holdings_shares),
        Column::HoldingsFundId => Value::Int(row.holdings_fund_id),
        Column::SecuritiesTicker => Value::Str(row.securities_ticker.clone()),
        Column::SecuritiesName => Value::Str(row.securities_name.clone()),
        Column::SecuritiesType => Value::Str(row.securities_type.clone()),
        Column::SecuritiesSharesOutstanding => row
            .securities_shares_outstanding
            .map(|n| Value::Int(n as i64))
            .unwrap_or(Value::Null),
        Column::IssuersName => Value::Str(row.issuers_name.clone()),
        Column::IssuersGicsSector => Value::Str(row.issuers_gics_sector.clone()),
        Column::IssuersGicsIndustryGrp => Value::Str(row.issuers_gics_industry_grp.clone()),
        Column::IssuersGicsIndustry => Value::Str(row.issuers_gics_industry.clone()),
        Column::IssuersGicsSubIndustry => Value::Str(row.issuers_gics_sub_industry.clone()),
        Column::IssuersCountryDomicile => Value::Str(row.issuers_country_domicile.clone()),
        Column::IssuersCountryIncorporation => {
            Value::Str(row.issuers_country_incorporation.clone())
        }
        Column::IssuersCountryDomicileCode => {
            Value::Str(row.issuers_country_domicile_code.clone())
        }
        Column::IssuersCountryIncorporationCode => {
            Value::Str(row.issuers_country_incorporation_code.clone())
        }
    }
}

fn operand_value(operand: &Operand, row: &JoinedHoldingRow) -> Value {
    match operand {
        Operand::Column(c) => column_value(*c, row),
        Operand::Int(n) => Value::Int(*n),
        Operand::Decimal(d) => Value::Decimal(*d),
        Operand::Str(s) => Value::Str(s.clone()),
    }
}

fn compare(left: &Value, op: CmpOp, right: &Value) -> bool {
    if let (Some(l), Some(r)) = (left.as_decimal(), right.as_decimal()) {
        return match op {
            CmpOp::Eq => l == r,
            CmpOp::Ne => l != r,
            CmpOp::Lt => l < r,
            CmpOp::Le => l <= r,
            CmpOp::Gt => l > r,
            CmpOp::Ge => l >= r,
        };
    }

    if let (Value::Str(l), Value::Str(r)) = (left, right) {
        return match op {
            CmpOp::Eq => l == r,
            CmpOp::Ne => l != r,
            CmpOp::Lt => l < r,
            CmpOp::Le => l <= r,
            CmpOp::Gt => l > r,
            CmpOp::Ge => l >= r,
        };
    }

    // A NULL operand (e.g. shares_outstanding) never satisfies a comparison.
    matches!(op, CmpOp::Ne)
}

/// Matches a SQL-style `LIKE` pattern where `%` matches any run of
/// characters (including empty) and every other character is literal.
fn like_matches(value: &str, pattern: &str) -> bool {
    let segments: Vec<&str> = pattern.split('%').collect();
    if segments.len() == 1 {
        return value == pattern;
    }

    let mut remaining = value;
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        if i == 0 {
            if !remaining.starts_with(segment) {
                return false;
            }
            remaining = &remaining[segment.len()..];
        } else if i == segments.len() - 1 {
            if !remaining.ends_with(segment) {
                return false;
            }
        } else {
            match remaining.find(segment) {
                Some(pos) => remaining = &remaining[pos + segment.len()..],
                None => return false,
            }
        }
    }
    true
}

/// Evaluates a parsed expression against one joined holding row.
pub fn evaluate(expr: &Expr, row: &JoinedHoldingRow) -> bool {
    match expr {
        Expr::True => true,
        Expr::Compare { left, op, right } => {
            compare(&operand_value(left, row), *op, &operand_value(right, row))
        }
        Expr::In {
            operand,
            list,
            negated,
        } => {
            let v = operand_value(operand, row);
            let found = list
                .iter()
                .any(|item| compare(&v, CmpOp::Eq, &operand_value(item, row)));
            found != *negated
        }
        Expr::Like { operand, pattern } => match operand_value(operand, row) {
            Value::Str(s) => like_matches(&s, pattern),
            _ => false,
        },
        Expr::And(l, r) => evaluate(l, row) && evaluate(r, row),
        Expr::Or(l, r) => evaluate(l, row) || evaluate(r, row),
        Expr::Not(inner) => !evaluate(inner, row),
    }
}
