//! Memoized derivation nodes.
//!
//! A [`Derivation`] wraps a pure combining function over one or more versioned
//! inputs. It caches the last output together with the versions of the inputs
//! that produced it, and only invokes the combining function again when at
//! least one input version differs.
//!
//! Change detection is by version tag, never by deep comparison: every
//! [`Versioned`] value draws a fresh tag from a process-wide counter when it is
//! built, so replacing an input with a structurally identical copy still counts
//! as a change, while cloning a handle does not.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::metrics;
use crate::status::ClassifierError;

/// Identity tag of a versioned value.
pub type Version = u64;

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

/// Draws a version tag never handed out before in this process.
pub fn next_version() -> Version {
    NEXT_VERSION.fetch_add(1, Ordering::Relaxed)
}

/// Errors raised while computing a derived value.
#[derive(Debug, thiserror::Error)]
pub enum SelectorError {
    #[error("Status classifier failed for swap {swap_id}: {source}")]
    Classifier {
        swap_id: String,
        #[source]
        source: ClassifierError,
    },
    #[error("Swap {swap_id} has a rate with no inverse: {rate}")]
    NonInvertibleRate { swap_id: String, rate: Decimal },
}

/// Immutable shared value tagged with a unique version.
pub struct Versioned<T> {
    version: Version,
    value: Arc<T>,
}

impl<T> Versioned<T> {
    pub fn new(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Tags an already shared value with a fresh version.
    pub fn from_arc(value: Arc<T>) -> Self {
        Self {
            version: next_version(),
            value,
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn value(&self) -> &Arc<T> {
        &self.value
    }

    pub fn into_arc(self) -> Arc<T> {
        self.value
    }

    /// Same handle: equal versions and the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.version == other.version && Arc::ptr_eq(&self.value, &other.value)
    }
}

impl<T> Clone for Versioned<T> {
    fn clone(&self) -> Self {
        Self {
            version: self.version,
            value: Arc::clone(&self.value),
        }
    }
}

impl<T> Deref for Versioned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for Versioned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Versioned")
            .field("version", &self.version)
            .field("value", &self.value)
            .finish()
    }
}

/// Input set of a derivation: anything that can report the versions it is made of.
pub trait DerivationInputs {
    fn versions(&self) -> Vec<Version>;
}

impl<T> DerivationInputs for Versioned<T> {
    fn versions(&self) -> Vec<Version> {
        vec![self.version]
    }
}

impl<A: DerivationInputs, B: DerivationInputs> DerivationInputs for (A, B) {
    fn versions(&self) -> Vec<Version> {
        let mut v = self.0.versions();
        v.extend(self.1.versions());
        v
    }
}

impl<A, B, C> DerivationInputs for (A, B, C)
where
    A: DerivationInputs,
    B: DerivationInputs,
    C: DerivationInputs,
{
    fn versions(&self) -> Vec<Version> {
        let mut v = self.0.versions();
        v.extend(self.1.versions());
        v.extend(self.2.versions());
        v
    }
}

impl<A, B, C, D> DerivationInputs for (A, B, C, D)
where
    A: DerivationInputs,
    B: DerivationInputs,
    C: DerivationInputs,
    D: DerivationInputs,
{
    fn versions(&self) -> Vec<Version> {
        let mut v = self.0.versions();
        v.extend(self.1.versions());
        v.extend(self.2.versions());
        v.extend(self.3.versions());
        v
    }
}

type CombineFn<I, O> = Box<dyn Fn(&I) -> Result<O, SelectorError> + Send + Sync>;

struct CacheEntry<O> {
    input_versions: Vec<Version>,
    output: Versioned<O>,
}

/// Counters reported by [`Derivation::stats`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationStats {
    pub name: &'static str,
    pub upstream: Vec<&'static str>,
    pub recomputes: u64,
    pub cache_hits: u64,
    pub cached: bool,
}

/// A memoized node of the derivation graph.
pub struct Derivation<I, O> {
    name: &'static str,
    upstream: Vec<&'static str>,
    combine: CombineFn<I, O>,
    cache: Mutex<Option<CacheEntry<O>>>,
    recomputes: AtomicU64,
    cache_hits: AtomicU64,
}

impl<I: DerivationInputs, O> Derivation<I, O> {
    /// Registers a node named `name` reading the nodes or collections named in
    /// `upstream`, in the order their versions appear in `I`.
    pub fn new<F>(name: &'static str, upstream: &[&'static str], combine: F) -> Self
    where
        F: Fn(&I) -> Result<O, SelectorError> + Send + Sync + 'static,
    {
        Self {
            name,
            upstream: upstream.to_vec(),
            combine: Box::new(combine),
            cache: Mutex::new(None),
            recomputes: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the derived value for `inputs`, recomputing only if an input
    /// version changed since the last successful computation.
    ///
    /// The check, the recomputation and the cache write happen under the node's
    /// lock, so concurrent callers never compute the same inputs twice. On error
    /// nothing is cached.
    pub fn get(&self, inputs: &I) -> Result<Versioned<O>, SelectorError> {
        let versions = inputs.versions();
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = cache.as_ref() {
            if entry.input_versions == versions {
                self.cache_hits.fetch_add(1, Ordering::Relaxed);
                metrics::increment_cache_hit(self.name);
                trace!(node = self.name, version = entry.output.version(), "derivation cache hit");
                return Ok(entry.output.clone());
            }
        }

        let started = Instant::now();
        let output = match (self.combine)(inputs) {
            Ok(output) => Versioned::new(output),
            Err(e) => {
                metrics::increment_recompute_failed(self.name);
                debug!(node = self.name, error = %e, "derivation failed, nothing cached");
                return Err(e);
            }
        };
        let elapsed = started.elapsed();

        self.recomputes.fetch_add(1, Ordering::Relaxed);
        metrics::increment_recompute(self.name);
        metrics::record_recompute(self.name, elapsed);
        debug!(
            node = self.name,
            upstream = ?self.upstream,
            inputs = ?versions,
            version = output.version(),
            elapsed_us = elapsed.as_micros() as u64,
            "derivation recomputed"
        );

        *cache = Some(CacheEntry {
            input_versions: versions,
            output: output.clone(),
        });
        Ok(output)
    }

    /// Drops the cached output; the next `get` recomputes.
    pub fn invalidate(&self) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        *cache = None;
    }

    pub fn stats(&self) -> DerivationStats {
        let cached = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        DerivationStats {
            name: self.name,
            upstream: self.upstream.clone(),
            recomputes: self.recomputes.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cached,
        }
    }
}
