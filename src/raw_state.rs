//! Raw collections observed by the selector graph.
//!
//! Every collection is an immutable, versioned handle. A change to any member
//! produces a new handle with a new version, so derivations detect change by
//! comparing versions instead of contents.

use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use tracing::trace;

use crate::derivation::{DerivationInputs, Version, Versioned};
use crate::metrics;
use crate::types::{Asset, Swap, Transaction, Wallet};

/// Immutable keyed collection; iteration follows insertion order.
pub struct Collection<V> {
    inner: Versioned<IndexMap<String, V>>,
}

pub type SwapCollection = Collection<Swap>;
pub type AssetCollection = Collection<Asset>;
pub type WalletCollection = Collection<Wallet>;
pub type TransactionCollection = Collection<Transaction>;

impl<V> Collection<V> {
    pub fn new(entries: IndexMap<String, V>) -> Self {
        Self {
            inner: Versioned::new(entries),
        }
    }

    pub fn empty() -> Self {
        Self::new(IndexMap::new())
    }

    /// Builds a collection keyed by `key_of`; later duplicates replace earlier ones
    /// but keep the first position.
    pub fn from_records<I, F>(records: I, key_of: F) -> Self
    where
        I: IntoIterator<Item = V>,
        F: Fn(&V) -> String,
    {
        Self::new(records.into_iter().map(|r| (key_of(&r), r)).collect())
    }

    pub fn version(&self) -> Version {
        self.inner.version()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.inner.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, V> {
        self.inner.iter()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, V> {
        self.inner.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, String, V> {
        self.inner.values()
    }

    pub fn entries(&self) -> &Arc<IndexMap<String, V>> {
        self.inner.value()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl<V: Clone> Collection<V> {
    /// Copy of this collection with `key` set to `value` (existing keys keep their position).
    pub fn with_upserted(&self, key: impl Into<String>, value: V) -> Self {
        let mut entries = (**self.inner.value()).clone();
        entries.insert(key.into(), value);
        Self::new(entries)
    }

    /// Copy of this collection without `key`; remaining entries keep their order.
    pub fn with_removed(&self, key: &str) -> Self {
        let mut entries = (**self.inner.value()).clone();
        entries.shift_remove(key);
        Self::new(entries)
    }
}

impl<V> Clone for Collection<V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<V> Default for Collection<V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for Collection<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("version", &self.version())
            .field("len", &self.len())
            .finish()
    }
}

impl<V> DerivationInputs for Collection<V> {
    fn versions(&self) -> Vec<Version> {
        vec![self.version()]
    }
}

/// The four raw collections as observed at one instant.
#[derive(Debug, Clone, Default)]
pub struct RawSnapshot {
    pub swaps: SwapCollection,
    pub assets: AssetCollection,
    pub wallets: WalletCollection,
    pub transactions: TransactionCollection,
}

impl RawSnapshot {
    pub fn new(
        swaps: SwapCollection,
        assets: AssetCollection,
        wallets: WalletCollection,
        transactions: TransactionCollection,
    ) -> Self {
        Self {
            swaps,
            assets,
            wallets,
            transactions,
        }
    }
}

/// Holder of the current raw snapshot.
///
/// Readers get a consistent snapshot of all four collections; every write
/// publishes a new snapshot in which only the touched collection has a new
/// version.
pub struct RawStateStore {
    state: ArcSwap<RawSnapshot>,
}

impl RawStateStore {
    pub fn new(initial: RawSnapshot) -> Self {
        Self {
            state: ArcSwap::from_pointee(initial),
        }
    }

    pub fn snapshot(&self) -> Arc<RawSnapshot> {
        self.state.load_full()
    }

    pub fn replace_swaps(&self, swaps: SwapCollection) {
        self.write("swaps", move |s| s.swaps = swaps.clone());
    }

    pub fn replace_assets(&self, assets: AssetCollection) {
        self.write("assets", move |s| s.assets = assets.clone());
    }

    pub fn replace_wallets(&self, wallets: WalletCollection) {
        self.write("wallets", move |s| s.wallets = wallets.clone());
    }

    pub fn replace_transactions(&self, transactions: TransactionCollection) {
        self.write("transactions", move |s| s.transactions = transactions.clone());
    }

    pub fn upsert_swap(&self, swap: Swap) {
        self.write("swaps", |s| s.swaps = s.swaps.with_upserted(swap.id.clone(), swap.clone()));
    }

    pub fn remove_swap(&self, id: &str) {
        self.write("swaps", |s| s.swaps = s.swaps.with_removed(id));
    }

    pub fn upsert_asset(&self, asset: Asset) {
        self.write("assets", |s| {
            s.assets = s.assets.with_upserted(asset.symbol.clone(), asset.clone())
        });
    }

    pub fn upsert_wallet(&self, wallet: Wallet) {
        self.write("wallets", |s| {
            s.wallets = s.wallets.with_upserted(wallet.id.clone(), wallet.clone())
        });
    }

    pub fn upsert_transaction(&self, tx: Transaction) {
        self.write("transactions", |s| {
            s.transactions = s.transactions.with_upserted(tx.id.clone(), tx.clone())
        });
    }

    fn write<F>(&self, collection: &'static str, apply: F)
    where
        F: Fn(&mut RawSnapshot),
    {
        // rcu may run `apply` more than once under contention
        self.state.rcu(|current| {
            let mut next = RawSnapshot::clone(current);
            apply(&mut next);
            next
        });
        metrics::increment_raw_state_write(collection);
        trace!(collection, "raw collection replaced");
    }
}

impl Default for RawStateStore {
    fn default() -> Self {
        Self::new(RawSnapshot::default())
    }
}
