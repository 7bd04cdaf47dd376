use rust_decimal::Decimal;

/// Prefix shared by hex-encoded (EVM-style) addresses.
pub const HEX_ADDRESS_PREFIX: &str = "0x";

/// Market pair key, always `{send}_{receive}` in lowercase.
pub fn pair_key(send_symbol: &str, receive_symbol: &str) -> String {
    format!("{}_{}", send_symbol, receive_symbol).to_lowercase()
}

/// Multiplicative inverse of a rate. `None` when the rate is zero or the
/// division overflows.
pub fn inverse_rate(rate: Decimal) -> Option<Decimal> {
    Decimal::ONE.checked_div(rate)
}

/// Whether a wallet's recorded `used` address refers to `address`.
///
/// Hex addresses are case-insensitive on chain, so when `address` carries the
/// hex prefix both sides are compared lowercased. Any other address family is
/// case-sensitive and only matches verbatim.
pub fn address_matches(used: &str, address: &str, hex_prefix: &str) -> bool {
    if used == address {
        return true;
    }
    address.starts_with(hex_prefix) && used.to_lowercase() == address.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_pair_key_is_lowercase_and_ordered() {
        assert_eq!(pair_key("BTC", "ETH"), "btc_eth");
        assert_eq!(pair_key("eth", "BTC"), "eth_btc");
    }

    #[test]
    fn test_inverse_rate() {
        let rate = Decimal::from_str("0.25").unwrap();
        assert_eq!(inverse_rate(rate), Some(Decimal::from(4)));
        assert_eq!(inverse_rate(Decimal::ZERO), None);
    }

    #[test]
    fn test_address_matches() {
        assert!(address_matches("0xabc", "0xabc", HEX_ADDRESS_PREFIX));
        assert!(address_matches("0xabc", "0xABC", HEX_ADDRESS_PREFIX));
        assert!(address_matches("0xABC", "0xabc", HEX_ADDRESS_PREFIX));
        // Non-hex addresses are never case-folded
        assert!(address_matches("ABC", "ABC", HEX_ADDRESS_PREFIX));
        assert!(!address_matches("abc", "ABC", HEX_ADDRESS_PREFIX));
        assert!(!address_matches("0xabd", "0xabc", HEX_ADDRESS_PREFIX));
    }
}
