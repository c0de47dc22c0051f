use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::rates::SlabRateTable;

/// ledger configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub rates: SlabRateTable,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// outbound notification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub enabled: bool,
    /// used when a notification has no explicit recipient
    pub default_recipient: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_recipient: None,
        }
    }
}

impl LedgerConfig {
    /// banded default rates, notifications on
    pub fn tiered_rates() -> Self {
        Self {
            rates: SlabRateTable::tiered(),
            notifications: NotificationConfig::default(),
        }
    }

    /// notifications off, flat default rate
    pub fn quiet() -> Self {
        Self {
            rates: SlabRateTable::default(),
            notifications: NotificationConfig {
                enabled: false,
                default_recipient: None,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.rates.validate()
    }

    /// parse and validate from json
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LedgerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::{Money, Rate};
    use crate::errors::ErrorKind;
    use crate::rates::RateTable;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert!(config.notifications.enabled);
        assert_eq!(
            config.rates.rate_for_amount(Money::from_major(50_000)),
            Rate::from_percentage(2)
        );
    }

    #[test]
    fn test_json_round_trip_preserves_rates() {
        let config = LedgerConfig::tiered_rates();
        let json = config.to_json().unwrap();
        let restored = LedgerConfig::from_json(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = LedgerConfig::from_json(
            r#"{ "notifications": { "enabled": false, "default_recipient": "desk@example.com" } }"#,
        )
        .unwrap();

        assert!(!config.notifications.enabled);
        assert_eq!(config.notifications.default_recipient.as_deref(), Some("desk@example.com"));
        assert_eq!(config.rates, SlabRateTable::default());
    }

    #[test]
    fn test_rates_from_json() {
        let config = LedgerConfig::from_json(
            r#"{
                "rates": {
                    "slabs": [
                        { "up_to": "10000", "rate": "3" },
                        { "up_to": null, "rate": "1.75" }
                    ],
                    "fallback": "2"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.rates.rate_for_amount(Money::from_major(10_000)), Rate::from_percentage(3));
        assert_eq!(
            config.rates.rate_for_amount(Money::from_major(10_001)),
            Rate::from_percent(dec!(1.75))
        );
    }

    #[test]
    fn test_invalid_json_rejected() {
        let err = LedgerConfig::from_json("{ not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = LedgerConfig::from_json(r#"{ "rates": { "slabs": [], "fallback": "0" } }"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
