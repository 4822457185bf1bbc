//! Store configuration.

/// Default bound on nested (re-entrant) updates.
pub const DEFAULT_MAX_REENTRANT_DEPTH: usize = 64;

/// Configuration for a [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Name reported in tracing fields.
    pub label: String,
    /// How many updates may nest inside a running update. Zero forbids
    /// listeners from updating while a reduction pass is in progress.
    pub max_reentrant_depth: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            label: "store".to_string(),
            max_reentrant_depth: DEFAULT_MAX_REENTRANT_DEPTH,
        }
    }
}

impl StoreConfig {
    /// Set the tracing label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the nesting limit for re-entrant updates.
    #[must_use]
    pub fn with_max_reentrant_depth(mut self, depth: usize) -> Self {
        self.max_reentrant_depth = depth;
        self
    }
}
