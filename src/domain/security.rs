use serde::{Deserialize, Serialize};

/// A tradeable security, exclusively owned by one issuer (lookup only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Security {
    pub ticker: String,
    pub name: String,
    pub security_type: String,
    pub issuer_id: i64,
    pub shares_outstanding: Option<u64>,
}

impl Security {
    /// Canonicalizes a ticker the way the engine expects it to be keyed:
    /// uppercase, trimmed.
    pub fn canonical_ticker(raw: &str) -> String {
        raw.trim().to_ascii_uppercase()
    }
}
