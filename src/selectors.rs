//! Swap selector graph.
//!
//! Explicit DAG of memoized derivations over the raw state store:
//!
//! ```text
//! swaps, assets, wallets, transactions
//!         └── all_enriched
//!               ├── all_enriched_list
//!               ├── sent_orders_sorted
//!               ├── order_to_sent_tx
//!               └── order_to_swap_id
//! ```
//!
//! Each node recomputes only when the versions it reads change. Callers read
//! through [`SwapSelectors`]; every read takes one snapshot of the store, so a
//! computation never mixes collections from different writes.

use std::cmp::Ordering;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::warn;

use crate::derivation::{Derivation, DerivationStats, SelectorError, Versioned};
use crate::metrics;
use crate::raw_state::{
    AssetCollection, RawSnapshot, RawStateStore, SwapCollection, TransactionCollection,
    WalletCollection,
};
use crate::settings::Settings;
use crate::status::StatusClassifier;
use crate::swap_enricher::{EnrichedSwapMap, SwapEnricher};
use crate::types::EnrichedSwap;

/// Order id to sent transaction id.
pub type OrderTxMap = IndexMap<String, String>;

/// Order id to the id of the first swap carrying it.
pub type OrderSwapMap = IndexMap<String, String>;

type RawInputs = (SwapCollection, AssetCollection, WalletCollection, TransactionCollection);

/// Most recent first; equal timestamps fall back to ascending id.
pub fn compare_most_recent_first(a: &EnrichedSwap, b: &EnrichedSwap) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Dated swaps sorted most recent first; swaps without `created_at` are dropped.
pub fn sorted_by_recency<'a, I>(swaps: I) -> Vec<EnrichedSwap>
where
    I: IntoIterator<Item = &'a EnrichedSwap>,
{
    let mut list: Vec<EnrichedSwap> = swaps
        .into_iter()
        .filter(|s| s.created_at.is_some())
        .cloned()
        .collect();
    list.sort_by(compare_most_recent_first);
    list
}

/// Whether a swap is past the pending-deposit state or already carries a sent
/// transaction.
pub fn is_sent_order(swap: &EnrichedSwap, pending_order_status: &str) -> bool {
    swap.order_status != pending_order_status || swap.is_tx_sent()
}

/// Order ids whose joined transaction was sent, mapped to that transaction's id.
pub fn build_order_tx_index(enriched: &EnrichedSwapMap) -> OrderTxMap {
    enriched
        .values()
        .filter_map(|swap| {
            swap.tx
                .as_ref()
                .filter(|tx| tx.is_sent())
                .map(|tx| (swap.order_id.clone(), tx.id.clone()))
        })
        .collect()
}

/// First swap id per order id, in collection order.
pub fn build_order_swap_index(enriched: &EnrichedSwapMap) -> OrderSwapMap {
    let mut index = OrderSwapMap::with_capacity(enriched.len());
    for swap in enriched.values() {
        if index.contains_key(&swap.order_id) {
            warn!(
                order_id = %swap.order_id,
                swap = %swap.id,
                "several swaps share this order id, keeping the first"
            );
            continue;
        }
        index.insert(swap.order_id.clone(), swap.id.clone());
    }
    index
}

/// Memoized enriched swap views over a [`RawStateStore`].
pub struct SwapSelectors {
    store: Arc<RawStateStore>,
    all_enriched: Derivation<RawInputs, EnrichedSwapMap>,
    all_enriched_list: Derivation<Versioned<EnrichedSwapMap>, Vec<EnrichedSwap>>,
    sent_orders_sorted: Derivation<Versioned<EnrichedSwapMap>, Vec<EnrichedSwap>>,
    order_to_sent_tx: Derivation<Versioned<EnrichedSwapMap>, OrderTxMap>,
    order_to_swap_id: Derivation<Versioned<EnrichedSwapMap>, OrderSwapMap>,
}

impl SwapSelectors {
    pub fn new(
        store: Arc<RawStateStore>,
        classifier: Arc<dyn StatusClassifier>,
        settings: &Settings,
    ) -> Self {
        let enricher = SwapEnricher::new(classifier, settings);
        let pending_order_status = settings.selectors.pending_order_status.clone();

        let all_enriched = Derivation::new(
            "all_enriched",
            &["swaps", "assets", "wallets", "transactions"],
            move |(swaps, assets, wallets, txs): &RawInputs| {
                let enriched = enricher.enrich_all(swaps, assets, wallets, txs)?;
                metrics::set_enriched_swaps(enriched.len());
                Ok(enriched)
            },
        );

        let all_enriched_list = Derivation::new(
            "all_enriched_list",
            &["all_enriched"],
            |all: &Versioned<EnrichedSwapMap>| Ok(sorted_by_recency(all.values())),
        );

        let sent_orders_sorted = Derivation::new(
            "sent_orders_sorted",
            &["all_enriched"],
            move |all: &Versioned<EnrichedSwapMap>| {
                Ok(sorted_by_recency(
                    all.values().filter(|s| is_sent_order(s, &pending_order_status)),
                ))
            },
        );

        let order_to_sent_tx = Derivation::new(
            "order_to_sent_tx",
            &["all_enriched"],
            |all: &Versioned<EnrichedSwapMap>| Ok(build_order_tx_index(all)),
        );

        let order_to_swap_id = Derivation::new(
            "order_to_swap_id",
            &["all_enriched"],
            |all: &Versioned<EnrichedSwapMap>| Ok(build_order_swap_index(all)),
        );

        Self {
            store,
            all_enriched,
            all_enriched_list,
            sent_orders_sorted,
            order_to_sent_tx,
            order_to_swap_id,
        }
    }

    pub fn store(&self) -> &Arc<RawStateStore> {
        &self.store
    }

    fn enriched_for(&self, snapshot: &RawSnapshot) -> Result<Versioned<EnrichedSwapMap>, SelectorError> {
        let inputs = (
            snapshot.swaps.clone(),
            snapshot.assets.clone(),
            snapshot.wallets.clone(),
            snapshot.transactions.clone(),
        );
        self.all_enriched.get(&inputs)
    }

    fn enriched(&self) -> Result<Versioned<EnrichedSwapMap>, SelectorError> {
        self.enriched_for(&self.store.snapshot())
    }

    /// Every enriched swap keyed by swap id, in raw collection order.
    pub fn get_all_enriched(&self) -> Result<Arc<EnrichedSwapMap>, SelectorError> {
        Ok(self.enriched()?.into_arc())
    }

    /// Dated enriched swaps, most recently created first.
    pub fn get_all_enriched_list(&self) -> Result<Arc<Vec<EnrichedSwap>>, SelectorError> {
        let all = self.enriched()?;
        Ok(self.all_enriched_list.get(&all)?.into_arc())
    }

    /// Looks a swap up by id, falling back to the first swap with that order id.
    pub fn get_enriched_by_id(&self, id: &str) -> Result<Option<EnrichedSwap>, SelectorError> {
        let all = self.enriched()?;
        if let Some(swap) = all.get(id) {
            return Ok(Some(swap.clone()));
        }

        let by_order = self.order_to_swap_id.get(&all)?;
        Ok(by_order
            .get(id)
            .and_then(|swap_id| all.get(swap_id))
            .cloned())
    }

    /// Dated swaps past the pending-deposit state (or with a sent transaction),
    /// most recently created first.
    pub fn get_sent_orders_sorted(&self) -> Result<Arc<Vec<EnrichedSwap>>, SelectorError> {
        let all = self.enriched()?;
        Ok(self.sent_orders_sorted.get(&all)?.into_arc())
    }

    /// Order id to transaction id, only for swaps whose transaction was sent.
    pub fn get_order_to_sent_tx_map(&self) -> Result<Arc<OrderTxMap>, SelectorError> {
        let all = self.enriched()?;
        Ok(self.order_to_sent_tx.get(&all)?.into_arc())
    }

    /// Registered nodes with their upstream inputs and counters, leaves first.
    pub fn node_stats(&self) -> Vec<DerivationStats> {
        vec![
            self.all_enriched.stats(),
            self.all_enriched_list.stats(),
            self.sent_orders_sorted.stats(),
            self.order_to_sent_tx.stats(),
            self.order_to_swap_id.stats(),
        ]
    }

    /// Drops every cached output.
    pub fn invalidate_all(&self) {
        self.all_enriched.invalidate();
        self.all_enriched_list.invalidate();
        self.sent_orders_sorted.invalidate();
        self.order_to_sent_tx.invalidate();
        self.order_to_swap_id.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::FnStatusClassifier;
    use crate::types::{JoinedSwap, Swap, Transaction};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn swap(id: &str, status: &str, ts: Option<i64>) -> Swap {
        Swap {
            id: id.to_string(),
            order_id: format!("O-{}", id),
            send_symbol: "BTC".to_string(),
            receive_symbol: "ETH".to_string(),
            tx_id: format!("TX-{}", id),
            rate: Decimal::ONE,
            receive_address: "bc1qxyz".to_string(),
            receive_wallet_id: None,
            created_at: ts.map(|t| Utc.timestamp_opt(t, 0).unwrap()),
            order_status: status.to_string(),
            send_amount: None,
            receive_amount: None,
            deposit_address: None,
            error: None,
        }
    }

    fn selectors(store: Arc<RawStateStore>) -> SwapSelectors {
        let classifier = FnStatusClassifier::new(
            |s: &JoinedSwap| Ok(s.order_status.clone()),
            |_: &JoinedSwap| Ok(None),
        );
        SwapSelectors::new(store, Arc::new(classifier), &Settings::default())
    }

    fn ids(list: &[EnrichedSwap]) -> Vec<&str> {
        list.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_list_tie_break_by_id_and_undated_dropped() {
        let store = Arc::new(RawStateStore::default());
        store.upsert_swap(swap("b", "complete", Some(100)));
        store.upsert_swap(swap("a", "complete", Some(100)));
        store.upsert_swap(swap("c", "complete", None));
        store.upsert_swap(swap("d", "complete", Some(200)));
        let sel = selectors(store);

        assert_eq!(ids(&sel.get_all_enriched_list().unwrap()), vec!["d", "a", "b"]);
        assert_eq!(ids(&sel.get_sent_orders_sorted().unwrap()), vec!["d", "a", "b"]);
        assert_eq!(sel.get_all_enriched().unwrap().len(), 4, "undated swap stays in the keyed view");
    }

    #[test]
    fn test_downstream_nodes_share_enriched_computation() {
        let store = Arc::new(RawStateStore::default());
        store.upsert_swap(swap("a", "complete", Some(1)));
        let sel = selectors(store);

        sel.get_all_enriched_list().unwrap();
        sel.get_sent_orders_sorted().unwrap();
        sel.get_order_to_sent_tx_map().unwrap();

        let stats = sel.node_stats();
        assert_eq!(stats[0].name, "all_enriched");
        assert_eq!(stats[0].recomputes, 1);
        assert_eq!(stats[0].cache_hits, 2);
        assert_eq!(stats[1..4].iter().map(|s| s.recomputes).collect::<Vec<_>>(), vec![1, 1, 1]);
        assert_eq!(stats[3].upstream, vec!["all_enriched"]);
        assert_eq!(stats[4].name, "order_to_swap_id");
        assert!(!stats[4].cached, "order index is built on first lookup only");
    }

    #[test]
    fn test_order_id_lookup_is_memoized() {
        let store = Arc::new(RawStateStore::default());
        store.upsert_swap(swap("a", "complete", Some(1)));
        store.upsert_swap(swap("b", "complete", Some(2)));
        let sel = selectors(store.clone());

        assert_eq!(sel.get_enriched_by_id("O-a").unwrap().unwrap().id, "a");
        assert_eq!(sel.get_enriched_by_id("O-b").unwrap().unwrap().id, "b");
        assert!(sel.get_enriched_by_id("O-zzz").unwrap().is_none());

        let order_node = &sel.node_stats()[4];
        assert_eq!(order_node.recomputes, 1, "repeated order-id lookups reuse the index");
        assert_eq!(order_node.cache_hits, 2);

        // Direct id hits never touch the order index
        sel.get_enriched_by_id("a").unwrap();
        assert_eq!(sel.node_stats()[4].cache_hits, 2);

        store.upsert_swap(swap("c", "complete", Some(3)));
        assert_eq!(sel.get_enriched_by_id("O-c").unwrap().unwrap().id, "c");
        assert_eq!(sel.node_stats()[4].recomputes, 2);
    }

    #[test]
    fn test_order_swap_index_keeps_first() {
        let store = Arc::new(RawStateStore::default());
        let mut first = swap("a", "complete", Some(1));
        first.order_id = "shared".to_string();
        let mut second = swap("b", "complete", Some(2));
        second.order_id = "shared".to_string();
        store.upsert_swap(first);
        store.upsert_swap(second);
        let sel = selectors(store);

        let index = build_order_swap_index(&sel.get_all_enriched().unwrap());
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("shared").map(String::as_str), Some("a"));
    }

    #[test]
    fn test_order_index_skips_unsent() {
        let store = Arc::new(RawStateStore::default());
        store.upsert_swap(swap("a", "complete", Some(1)));
        store.upsert_swap(swap("b", "complete", Some(2)));
        store.upsert_transaction(Transaction {
            id: "TX-a".to_string(),
            sent: Some(true),
            ..Default::default()
        });
        store.upsert_transaction(Transaction {
            id: "TX-b".to_string(),
            sent: Some(false),
            ..Default::default()
        });
        let sel = selectors(store);

        let index = sel.get_order_to_sent_tx_map().unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("O-a").map(String::as_str), Some("TX-a"));
        assert!(!index.contains_key("O-b"));
    }

    #[test]
    fn test_invalidate_all_recomputes() {
        let store = Arc::new(RawStateStore::default());
        store.upsert_swap(swap("a", "complete", Some(1)));
        let sel = selectors(store);

        let first = sel.get_all_enriched().unwrap();
        sel.invalidate_all();
        let second = sel.get_all_enriched().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first, second);
    }
}
