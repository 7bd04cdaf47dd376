use std::sync::Arc;

use indexmap::IndexMap;
use rust_decimal::Decimal;
use tracing::debug;

use crate::derivation::SelectorError;
use crate::raw_state::{AssetCollection, SwapCollection, TransactionCollection, WalletCollection};
use crate::settings::Settings;
use crate::status::StatusClassifier;
use crate::types::conversions::inverse_rate;
use crate::types::{EnrichedSwap, JoinedSwap, Swap, Wallet};

/// Enriched swaps keyed by swap id, in the order of the raw swap collection.
pub type EnrichedSwapMap = IndexMap<String, EnrichedSwap>;

/// Joins raw swaps with their assets, transaction and receiving wallet, then
/// classifies them.
///
/// Missing related records never fail enrichment: an unknown asset or
/// transaction is left as `None` and an unmatched wallet leaves
/// `receive_wallet_id` empty.
pub struct SwapEnricher {
    classifier: Arc<dyn StatusClassifier>,
    multi_wallet_type: String,
    hex_address_prefix: String,
}

impl SwapEnricher {
    pub fn new(classifier: Arc<dyn StatusClassifier>, settings: &Settings) -> Self {
        Self {
            classifier,
            multi_wallet_type: settings.wallets.multi_wallet_type.clone(),
            hex_address_prefix: settings.selectors.hex_address_prefix.clone(),
        }
    }

    /// Enriches every swap of the collection, preserving its key order.
    /// The first failing swap aborts the whole computation.
    pub fn enrich_all(
        &self,
        swaps: &SwapCollection,
        assets: &AssetCollection,
        wallets: &WalletCollection,
        transactions: &TransactionCollection,
    ) -> Result<EnrichedSwapMap, SelectorError> {
        let mut enriched = IndexMap::with_capacity(swaps.len());
        for (id, swap) in swaps.iter() {
            enriched.insert(id.clone(), self.enrich(swap, assets, wallets, transactions)?);
        }
        Ok(enriched)
    }

    pub fn enrich(
        &self,
        swap: &Swap,
        assets: &AssetCollection,
        wallets: &WalletCollection,
        transactions: &TransactionCollection,
    ) -> Result<EnrichedSwap, SelectorError> {
        let send_asset = assets.get(&swap.send_symbol).cloned();
        let receive_asset = assets.get(&swap.receive_symbol).cloned();
        let tx = transactions.get(&swap.tx_id).cloned();
        let inverse = inverse_rate(swap.rate).ok_or_else(|| SelectorError::NonInvertibleRate {
            swap_id: swap.id.clone(),
            rate: swap.rate,
        })?;
        // Fees are not charged yet
        let fee = Decimal::ZERO;

        let receive_wallet_id = match &swap.receive_wallet_id {
            Some(id) => Some(id.clone()),
            None => self.resolve_receive_wallet(swap, wallets).map(|w| w.id.clone()),
        };

        let joined = JoinedSwap::from_raw(
            swap,
            receive_wallet_id,
            inverse,
            send_asset,
            receive_asset,
            fee,
            tx,
        );

        let status = self
            .classifier
            .classify_status(&joined)
            .map_err(|source| SelectorError::Classifier {
                swap_id: swap.id.clone(),
                source,
            })?;
        let friendly_error = self
            .classifier
            .friendly_error(&joined)
            .map_err(|source| SelectorError::Classifier {
                swap_id: swap.id.clone(),
                source,
            })?;

        Ok(EnrichedSwap {
            joined,
            status,
            friendly_error,
        })
    }

    /// First single-asset wallet, in collection order, that has used the swap's
    /// receive address. Hex addresses compare case-insensitively.
    pub fn resolve_receive_wallet<'w>(
        &self,
        swap: &Swap,
        wallets: &'w WalletCollection,
    ) -> Option<&'w Wallet> {
        let found = wallets.values().find(|w| {
            !w.is_multi_asset(&self.multi_wallet_type)
                && w.has_used_address(&swap.receive_address, &self.hex_address_prefix)
        });
        if let Some(wallet) = found {
            debug!(swap = %swap.id, wallet = %wallet.id, "resolved receive wallet by address");
        }
        found
    }
}
