use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::conversions::address_matches;

/// Type tag marker carried by wallets that hold several assets.
pub const MULTI_WALLET_TYPE: &str = "MultiWallet";

/// A cross-asset exchange order as recorded upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swap {
    pub id: String,
    pub order_id: String,
    pub send_symbol: String,
    pub receive_symbol: String,
    pub tx_id: String,
    pub rate: Decimal,
    pub receive_address: String,
    #[serde(default)]
    pub receive_wallet_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Raw upstream order status (e.g. "awaiting deposit", "complete").
    pub order_status: String,
    #[serde(default)]
    pub send_amount: Option<Decimal>,
    #[serde(default)]
    pub receive_amount: Option<Decimal>,
    #[serde(default)]
    pub deposit_address: Option<String>,
    /// Raw error payload reported by the exchange, if any.
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub decimals: u8,
    #[serde(default)]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: String,
    /// Wallet implementation tag, e.g. "EthereumWalletLedger" or "MultiWallet".
    #[serde(rename = "type")]
    pub wallet_type: String,
    #[serde(default)]
    pub used_addresses: Vec<String>,
}

impl Wallet {
    /// Whether this wallet's type tag contains `marker` (a multi-asset container).
    pub fn is_multi_asset(&self, marker: &str) -> bool {
        self.wallet_type.contains(marker)
    }

    /// Whether any used address refers to `address`; hex addresses (those
    /// starting with `hex_prefix`) compare case-insensitively.
    pub fn has_used_address(&self, address: &str, hex_prefix: &str) -> bool {
        self.used_addresses
            .iter()
            .any(|used| address_matches(used, address, hex_prefix))
    }
}

/// Signing/sending progress of the deposit transaction for a swap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    #[serde(default)]
    pub signing: Option<bool>,
    #[serde(default)]
    pub signed: Option<bool>,
    #[serde(default)]
    pub signing_error: Option<String>,
    #[serde(default)]
    pub sending: Option<bool>,
    #[serde(default)]
    pub sent: Option<bool>,
    #[serde(default)]
    pub sending_error: Option<String>,
}

impl Transaction {
    pub fn is_sent(&self) -> bool {
        self.sent == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_type_marker() {
        let multi = Wallet {
            id: "w1".to_string(),
            wallet_type: "MultiWallet".to_string(),
            used_addresses: vec![],
        };
        let ledger = Wallet {
            id: "w2".to_string(),
            wallet_type: "EthereumWalletLedger".to_string(),
            used_addresses: vec!["0xabc".to_string()],
        };

        assert!(multi.is_multi_asset(MULTI_WALLET_TYPE));
        assert!(!ledger.is_multi_asset(MULTI_WALLET_TYPE));
        assert!(ledger.has_used_address("0xabc", "0x"));
        assert!(ledger.has_used_address("0xABC", "0x"));
        assert!(!ledger.has_used_address("0xabd", "0x"));
        assert!(!ledger.has_used_address("0xABC", "bc1"), "other prefixes match verbatim only");
    }

    #[test]
    fn test_swap_deserialize_optional_fields() {
        let json = r#"{
            "id": "s1",
            "order_id": "o1",
            "send_symbol": "BTC",
            "receive_symbol": "ETH",
            "tx_id": "t1",
            "rate": "25.5",
            "receive_address": "0xabc",
            "order_status": "awaiting deposit"
        }"#;
        let swap: Swap = serde_json::from_str(json).unwrap();

        assert_eq!(swap.receive_wallet_id, None);
        assert_eq!(swap.created_at, None);
        assert_eq!(swap.rate, Decimal::new(255, 1));
    }

    #[test]
    fn test_transaction_sent_flag() {
        let mut tx = Transaction {
            id: "t1".to_string(),
            ..Default::default()
        };
        assert!(!tx.is_sent());
        tx.sent = Some(false);
        assert!(!tx.is_sent());
        tx.sent = Some(true);
        assert!(tx.is_sent());
    }
}
