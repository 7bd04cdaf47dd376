use std::ops::Deref;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::conversions::pair_key;
use super::raw::{Asset, Swap, Transaction};

/// A raw swap joined with its assets, transaction and resolved wallet, before
/// status classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedSwap {
    pub id: String,
    pub order_id: String,
    pub send_symbol: String,
    pub receive_symbol: String,
    pub tx_id: String,
    pub rate: Decimal,
    pub receive_address: String,
    /// Recorded wallet id, or the one resolved from the receive address.
    pub receive_wallet_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub order_status: String,
    pub send_amount: Option<Decimal>,
    pub receive_amount: Option<Decimal>,
    pub deposit_address: Option<String>,
    pub error: Option<String>,

    pub pair: String,
    pub inverse_rate: Decimal,
    pub send_asset: Option<Asset>,
    pub receive_asset: Option<Asset>,
    pub fee: Decimal,
    pub has_fee: bool,
    /// `None` when the swap's transaction id is not in the transaction collection.
    pub tx: Option<Transaction>,
    pub tx_signing: Option<bool>,
    pub tx_signed: Option<bool>,
    pub tx_signing_error: Option<String>,
    pub tx_sending: Option<bool>,
    pub tx_sent: Option<bool>,
    pub tx_sending_error: Option<String>,
}

impl JoinedSwap {
    /// Carries every raw field over and flattens the transaction flags.
    pub(crate) fn from_raw(
        swap: &Swap,
        receive_wallet_id: Option<String>,
        inverse_rate: Decimal,
        send_asset: Option<Asset>,
        receive_asset: Option<Asset>,
        fee: Decimal,
        tx: Option<Transaction>,
    ) -> Self {
        let flag = |f: fn(&Transaction) -> Option<bool>| tx.as_ref().and_then(f);
        let error = |f: fn(&Transaction) -> Option<String>| tx.as_ref().and_then(f);

        Self {
            id: swap.id.clone(),
            order_id: swap.order_id.clone(),
            send_symbol: swap.send_symbol.clone(),
            receive_symbol: swap.receive_symbol.clone(),
            tx_id: swap.tx_id.clone(),
            rate: swap.rate,
            receive_address: swap.receive_address.clone(),
            receive_wallet_id,
            created_at: swap.created_at,
            order_status: swap.order_status.clone(),
            send_amount: swap.send_amount,
            receive_amount: swap.receive_amount,
            deposit_address: swap.deposit_address.clone(),
            error: swap.error.clone(),
            pair: pair_key(&swap.send_symbol, &swap.receive_symbol),
            inverse_rate,
            send_asset,
            receive_asset,
            has_fee: fee > Decimal::ZERO,
            fee,
            tx_signing: flag(|t| t.signing),
            tx_signed: flag(|t| t.signed),
            tx_signing_error: error(|t| t.signing_error.clone()),
            tx_sending: flag(|t| t.sending),
            tx_sent: flag(|t| t.sent),
            tx_sending_error: error(|t| t.sending_error.clone()),
            tx,
        }
    }

    /// Whether the joined transaction exists and has been broadcast.
    pub fn is_tx_sent(&self) -> bool {
        self.tx.as_ref().map_or(false, Transaction::is_sent)
    }
}

/// Display-ready swap: a [`JoinedSwap`] plus its lifecycle classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedSwap {
    #[serde(flatten)]
    pub joined: JoinedSwap,
    pub status: String,
    pub friendly_error: Option<String>,
}

impl Deref for EnrichedSwap {
    type Target = JoinedSwap;

    fn deref(&self) -> &Self::Target {
        &self.joined
    }
}
