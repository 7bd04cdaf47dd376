//! Lifecycle status classification seam.
//!
//! Status labels and friendly error strings are decided outside this crate.
//! The enricher calls a [`StatusClassifier`] with the fully joined swap and
//! attaches whatever it returns.

use crate::types::JoinedSwap;

/// Failure reported by a classifier for a well-formed swap.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Unrecognized order status: {0}")]
    UnknownStatus(String),
    #[error("Invalid classifier output: {0}")]
    InvalidOutput(String),
}

/// Pure mapping from a joined swap to its display status.
pub trait StatusClassifier: Send + Sync {
    fn classify_status(&self, swap: &JoinedSwap) -> Result<String, ClassifierError>;

    fn friendly_error(&self, swap: &JoinedSwap) -> Result<Option<String>, ClassifierError>;
}

/// Adapter turning a pair of closures into a [`StatusClassifier`].
pub struct FnStatusClassifier<S, E> {
    status: S,
    error: E,
}

impl<S, E> FnStatusClassifier<S, E>
where
    S: Fn(&JoinedSwap) -> Result<String, ClassifierError> + Send + Sync,
    E: Fn(&JoinedSwap) -> Result<Option<String>, ClassifierError> + Send + Sync,
{
    pub fn new(status: S, error: E) -> Self {
        Self { status, error }
    }
}

impl<S, E> StatusClassifier for FnStatusClassifier<S, E>
where
    S: Fn(&JoinedSwap) -> Result<String, ClassifierError> + Send + Sync,
    E: Fn(&JoinedSwap) -> Result<Option<String>, ClassifierError> + Send + Sync,
{
    fn classify_status(&self, swap: &JoinedSwap) -> Result<String, ClassifierError> {
        (self.status)(swap)
    }

    fn friendly_error(&self, swap: &JoinedSwap) -> Result<Option<String>, ClassifierError> {
        (self.error)(swap)
    }
}
