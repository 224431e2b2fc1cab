pub mod alert;
pub mod fund;
pub mod holding;
pub mod issuer;
pub mod price;
pub mod rule;
pub mod security;
pub mod trade;

pub use alert::{Alert, AlertStatus};
pub use fund::Fund;
pub use holding::{Holding, StagedHolding};
pub use issuer::Issuer;
pub use price::PricePoint;
pub use rule::{DenominatorKind, Rule, RuleAttachment};
pub use security::Security;
pub use trade::{Trade, TradeDirection, TradeStatus};
