//! # Swap State SDK
//!
//! Incremental derived-state layer for swap records. The SDK keeps raw swaps,
//! assets, wallets and transactions as immutable versioned collections and
//! derives display-ready swap views from them without recomputing joins on
//! every read.
//!
//! ## Overview
//!
//! - **Raw state**: four keyed collections, replaced wholesale on every change
//! - **Derivations**: memoized nodes that recompute only when an input version changes
//! - **Enrichment**: joins each swap with its assets, transaction and receiving wallet
//! - **Views**: sorted lists and indexes built on top of the enriched collection
//!
//! ## Architecture
//!
//! ### Raw State Layer
//! [`raw_state::RawStateStore`] publishes atomic snapshots of the four collections.
//! Every write produces a new collection handle with a fresh version tag.
//!
//! ### Derivation Layer
//! [`derivation::Derivation`] caches one output per node together with the
//! versions of the inputs that produced it.
//!
//! ### Selector Layer
//! [`selectors::SwapSelectors`] wires the nodes into an explicit graph and
//! exposes the read operations. Status labels come from a caller-provided
//! [`status::StatusClassifier`].

// Core Types
/// Raw and enriched record types
pub mod types;

// Raw State
/// Versioned raw collections and the snapshot store
pub mod raw_state;

// Derived State
/// Memoized derivation nodes and version tags
pub mod derivation;
/// Swap join and receive-wallet resolution
pub mod swap_enricher;
/// Status classification seam
pub mod status;
/// Selector graph and derived views
pub mod selectors;

// Infrastructure
/// Metrics and observability
pub mod metrics;

// Settings & Configuration
/// Configuration management
pub mod settings;

// Re-exports for convenience
pub use derivation::{Derivation, SelectorError, Versioned};
pub use raw_state::{Collection, RawSnapshot, RawStateStore};
pub use selectors::SwapSelectors;
pub use settings::Settings;
pub use status::{ClassifierError, FnStatusClassifier, StatusClassifier};
pub use swap_enricher::SwapEnricher;
pub use types::{Asset, EnrichedSwap, JoinedSwap, Swap, Transaction, Wallet};
