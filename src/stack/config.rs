//! Stack configuration

use std::sync::Arc;

use super::StackError;
use crate::hash::{Digest, IntegrityHash};

/// Capacity a stack starts with (and returns to on `clean`)
pub const DEFAULT_CAPACITY: usize = 8;

/// Largest capacity a stack may grow to
pub const MAX_CAPACITY: usize = 100_000;

/// Configuration parameters for a [`Stack`](super::Stack)
#[derive(Debug, Clone)]
pub struct StackConfig {
    /// Initial capacity (and capacity after `clean`)
    pub initial_capacity: usize,

    /// Growth stops here
    pub max_capacity: usize,

    /// Digest algorithm for the integrity layer; `None` disables it
    pub integrity: Option<Arc<dyn Digest>>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            max_capacity: MAX_CAPACITY,
            integrity: None,
        }
    }
}

impl StackConfig {
    /// Default configuration with the crate's own digest switched on
    pub fn protected() -> Self {
        Self::default().with_integrity(IntegrityHash)
    }

    /// Set initial capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set growth limit
    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Enable the integrity layer with the given digest
    pub fn with_integrity<D: Digest + 'static>(mut self, digest: D) -> Self {
        self.integrity = Some(Arc::new(digest));
        self
    }

    /// Disable the integrity layer
    pub fn without_integrity(mut self) -> Self {
        self.integrity = None;
        self
    }

    /// Whether digests are maintained
    pub fn is_protected(&self) -> bool {
        self.integrity.is_some()
    }

    /// Reject zero or over-limit capacities
    pub fn validate(&self) -> Result<(), StackError> {
        if self.initial_capacity == 0 || self.max_capacity == 0 {
            return Err(StackError::CapacityZero);
        }
        if self.initial_capacity > self.max_capacity {
            return Err(StackError::CapacityTooBig {
                requested: self.initial_capacity,
                max: self.max_capacity,
            });
        }
        Ok(())
    }
}
