//! Raw and derived record types.
//!
//! Raw records ([`Swap`], [`Asset`], [`Wallet`], [`Transaction`]) are owned by the
//! [`RawStateStore`](crate::raw_state::RawStateStore). Derived records ([`JoinedSwap`],
//! [`EnrichedSwap`]) are recreated on every recomputation and never stored on their own.

pub mod conversions;
pub mod enriched;
pub mod raw;

pub use enriched::{EnrichedSwap, JoinedSwap};
pub use raw::{Asset, Swap, Transaction, Wallet};
