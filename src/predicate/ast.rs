use rust_decimal::Decimal;
use strum_macros::EnumString;

/// The closed set of column names a rule expression may reference, exactly
/// as a staged holding joined with its security and issuer attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
pub enum Column {
    #[strum(serialize = "holdings.ticker")]
    HoldingsTicker,
    #[strum(serialize = "holdings.shares")]
    HoldingsShares,
    #[strum(serialize = "holdings.fund_id")]
    HoldingsFundId,
    #[strum(serialize = "securities.ticker")]
    SecuritiesTicker,
    #[strum(serialize = "securities.name")]
    SecuritiesName,
    #[strum(serialize = "securities.type")]
    SecuritiesType,
    #[strum(serialize = "securities.shares_outstanding")]
    SecuritiesSharesOutstanding,
    #[strum(serialize = "issuers.name")]
    IssuersName,
    #[strum(serialize = "issuers.gics_sector")]
    IssuersGicsSector,
    #[strum(serialize = "issuers.gics_industry_grp")]
    IssuersGicsIndustryGrp,
    #[strum(serialize = "issuers.gics_industry")]
    IssuersGicsIndustry,
    #[strum(serialize = "issuers.gics_sub_industry")]
    IssuersGicsSubIndustry,
    #[strum(serialize = "issuers.country_domicile")]
    IssuersCountryDomicile,
    #[strum(serialize = "issuers.country_incorporation")]
    IssuersCountryIncorporation,
    #[strum(serialize = "issuers.country_domicile_code")]
    IssuersCountryDomicileCode,
    #[strum(serialize = "issuers.country_incorporation_code")]
    IssuersCountryIncorporationCode,
}

/// A leaf value in the expression: either a column reference or a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column(Column),
    Int(i64),
    Decimal(Decimal),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// The parsed expression tree. `Expr::True` is the result of an empty
/// filter expression ("match all").
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    True,
    Compare {
        left: Operand,
        op: CmpOp,
        right: Operand,
    },
    In {
        operand: Operand,
        list: Vec<Operand>,
        negated: bool,
    },
    Like {
        operand: Operand,
        pattern: String,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}
