//! Construction-time tuning for `ChainedHashTable`.

use crate::error::{Result, TableError};

/// Sizing and growth policy of a table.
///
/// Growth is driven by chain length, not load factor: once any chain grows
/// longer than `max_chain_len`, the bucket array is multiplied by
/// `resize_factor` and every entry is relinked under the new modulus.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TableConfig {
    start_size: usize,
    resize_factor: usize,
    max_chain_len: usize,
}

impl TableConfig {
    pub const DEFAULT_START_SIZE: usize = 128;
    pub const DEFAULT_RESIZE_FACTOR: usize = 2;
    pub const DEFAULT_MAX_CHAIN_LEN: usize = 10;

    pub const fn new() -> Self {
        Self {
            start_size: Self::DEFAULT_START_SIZE,
            resize_factor: Self::DEFAULT_RESIZE_FACTOR,
            max_chain_len: Self::DEFAULT_MAX_CHAIN_LEN,
        }
    }

    /// Number of buckets a new table starts with.
    pub fn with_start_size(mut self, start_size: usize) -> Self {
        self.start_size = start_size;
        self
    }

    /// Multiplier applied to the bucket count on each resize.
    pub fn with_resize_factor(mut self, resize_factor: usize) -> Self {
        self.resize_factor = resize_factor;
        self
    }

    /// Longest chain tolerated before a resize is triggered.
    pub fn with_max_chain_len(mut self, max_chain_len: usize) -> Self {
        self.max_chain_len = max_chain_len;
        self
    }

    pub fn start_size(&self) -> usize {
        self.start_size
    }
    pub fn resize_factor(&self) -> usize {
        self.resize_factor
    }
    pub fn max_chain_len(&self) -> usize {
        self.max_chain_len
    }

    pub fn validate(&self) -> Result<()> {
        if self.start_size == 0 {
            return Err(TableError::invalid_argument("start_size must be positive"));
        }
        if self.resize_factor < 2 {
            return Err(TableError::invalid_argument(
                "resize_factor must be at least 2",
            ));
        }
        if self.max_chain_len == 0 {
            return Err(TableError::invalid_argument(
                "max_chain_len must be positive",
            ));
        }
        Ok(())
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::new()
    }
}
