#![forbid(unsafe_code)]

//! Errors returned by store updates.

use thiserror::Error;

use crate::reactive::SubscriberId;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("subscriber {subscriber} is no longer registered")]
    Unregistered { subscriber: SubscriberId },

    #[error("store has been dropped")]
    Closed,

    #[error("nested update depth {depth} exceeds limit {limit}")]
    ReentrancyLimit { depth: usize, limit: usize },

    #[error("update rejected: {0}")]
    Rejected(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    #[must_use]
    pub fn rejected(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Rejected(source.into())
    }

    /// Whether retrying the same update through the same handle can succeed.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Unregistered { .. } | Self::Closed)
    }
}
