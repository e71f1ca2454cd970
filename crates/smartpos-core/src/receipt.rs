//! # Receipts
//!
//! A receipt is a transaction plus the store header/footer from system
//! configuration.
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │        Smart POS Demo Store          │  ← store_name
//! │  123 Main Street, Business District  │  ← store_address
//! │            RCP-000042                │  ← receipt_number(id)
//! │  Cola x2 @ 1.50            3.00      │
//! │  TOTAL                 USD 3.00      │  ← currency
//! │     Thank you for your business!     │  ← receipt_footer
//! └──────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{ConfigKey, SystemConfig, Transaction};

/// Formats a receipt number: `RCP-` + id zero-padded to 6 digits.
///
/// Ids wider than six digits are printed in full.
///
/// ## Example
/// ```rust
/// use smartpos_core::receipt::receipt_number;
///
/// assert_eq!(receipt_number(1), "RCP-000001");
/// assert_eq!(receipt_number(1234567), "RCP-1234567");
/// ```
pub fn receipt_number(transaction_id: i64) -> String {
    format!("RCP-{:06}", transaction_id)
}

/// Store-level settings resolved from configuration, with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    values: HashMap<ConfigKey, String>,
}

impl StoreSettings {
    /// Builds settings from persisted entries. Unknown keys are ignored.
    pub fn from_entries(entries: &[SystemConfig]) -> Self {
        let values = entries
            .iter()
            .filter_map(|entry| {
                entry
                    .key
                    .parse::<ConfigKey>()
                    .ok()
                    .map(|key| (key, entry.value.clone()))
            })
            .collect();

        StoreSettings { values }
    }

    /// The configured value, or the key's default when unset.
    pub fn get(&self, key: ConfigKey) -> &str {
        self.values
            .get(&key)
            .map(String::as_str)
            .unwrap_or_else(|| key.default_value())
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings::from_entries(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Receipt {
    pub receipt_number: String,
    pub store_name: String,
    pub store_address: String,
    pub footer: String,
    pub currency: String,
    pub transaction: Transaction,
}

impl Receipt {
    pub fn build(transaction: Transaction, settings: &StoreSettings) -> Self {
        Receipt {
            receipt_number: receipt_number(transaction.id),
            store_name: settings.get(ConfigKey::StoreName).to_string(),
            store_address: settings.get(ConfigKey::StoreAddress).to_string(),
            footer: settings.get(ConfigKey::ReceiptFooter).to_string(),
            currency: settings.get(ConfigKey::Currency).to_string(),
            transaction,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentMethod;
    use chrono::Utc;

    fn transaction(id: i64) -> Transaction {
        Transaction {
            id,
            user_id: 1,
            total_cents: 300,
            payment_method: PaymentMethod::Card,
            customer_name: None,
            customer_email: None,
            customer_mobile: None,
            created_at: Utc::now(),
            items: vec![],
        }
    }

    fn entry(key: &str, value: &str) -> SystemConfig {
        SystemConfig {
            id: 1,
            key: key.to_string(),
            value: value.to_string(),
            updated_by: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_receipt_number_padding() {
        assert_eq!(receipt_number(42), "RCP-000042");
        assert_eq!(receipt_number(999999), "RCP-999999");
    }

    #[test]
    fn test_receipt_uses_defaults() {
        let receipt = Receipt::build(transaction(7), &StoreSettings::default());

        assert_eq!(receipt.receipt_number, "RCP-000007");
        assert_eq!(receipt.store_name, "Smart POS Demo Store");
        assert_eq!(
            receipt.store_address,
            "123 Main Street, Business District, City, State 12345"
        );
        assert_eq!(receipt.footer, "Thank you for your business!");
    }

    #[test]
    fn test_receipt_uses_configured_values() {
        let settings = StoreSettings::from_entries(&[
            entry("store_name", "Corner Shop"),
            entry("currency", "INR"),
            entry("unrelated", "ignored"),
        ]);
        let receipt = Receipt::build(transaction(1), &settings);

        assert_eq!(receipt.store_name, "Corner Shop");
        assert_eq!(receipt.currency, "INR");
        assert_eq!(receipt.transaction.id, 1);
    }
}
