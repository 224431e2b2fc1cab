use chrono::FixedOffset;
use tracing::Level;

/// Process-wide engine configuration, read once at startup. There is no
/// dev/test/prod profile split here — a library has one configuration
/// surface, not a web app's environment matrix.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Fixed timezone offset applied to all persisted timestamps.
    /// Nominally UTC-5.
    pub timezone_offset: FixedOffset,
    pub log_level: Level,
    /// Minimum decimal places retained on a displayed/compared percentage.
    pub percentage_display_scale: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone_offset: FixedOffset::west_opt(5 * 3600).expect("valid fixed offset"),
            log_level: Level::INFO,
            percentage_display_scale: 4,
        }
    }
}

impl EngineConfig {
    /// Builds configuration from environment variables, falling back to
    /// defaults for anything unset or malformed:
    /// `COMPLIANCE_LOG_LEVEL` (default `info`), `COMPLIANCE_TZ_OFFSET_HOURS`
    /// (default `-5`).
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let log_level = std::env::var("COMPLIANCE_LOG_LEVEL")
            .ok()
            .and_then(|s| s.parse::<Level>().ok())
            .unwrap_or(defaults.log_level);

        let timezone_offset = std::env::var("COMPLIANCE_TZ_OFFSET_HOURS")
            .ok()
            .and_then(|s| s.parse::<i32>().ok())
            .and_then(|hours| FixedOffset::east_opt(hours * 3600))
            .unwrap_or(defaults.timezone_offset);

        Self {
            timezone_offset,
            log_level,
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_offset_is_utc_minus_5() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.timezone_offset.local_minus_utc(), -5 * 3600);
    }
}
