use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ComplianceResult};

/// GICS classification plus domicile/incorporation country of a security's
/// issuer. Immutable from the compliance engine's perspective — issuers are
/// owned by the administrative plane and only read here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    pub issuer_id: i64,
    pub name: String,
    pub gics_sector: String,
    pub gics_industry_group: String,
    pub gics_industry: String,
    pub gics_sub_industry: String,
    pub country_domicile: String,
    pub country_incorporation: String,
    pub country_domicile_code: CountryCode,
    pub country_incorporation_code: CountryCode,
}

/// A three-letter ISO-style country code, validated at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountryCode([u8; 3]);

impl CountryCode {
    pub fn new(code: &str) -> ComplianceResult<Self> {
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(|b| b.is_ascii_uppercase()) {
            return Err(ValidationError::Field {
                field: "country_code".to_string(),
                message: format!("'{code}' must be exactly three uppercase ASCII letters"),
            }
            .into());
        }
        let mut arr = [0u8; 3];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).expect("CountryCode is always valid ASCII")
    }
}

impl std::fmt::Display for CountryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
