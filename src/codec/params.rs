use serde::{Deserialize, Serialize};

use crate::error::{ErasureError, Result};

/// Largest total shard count: one distinct non-zero evaluation point per shard.
pub const MAX_TOTAL_SHARDS: usize = 255;

/// A validated `(k, n)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErasureParams {
    data_shards: usize,
    total_shards: usize,
}

impl ErasureParams {
    /// Checks `0 < k <= n <= 255`.
    pub fn new(data_shards: usize, total_shards: usize) -> Result<Self> {
        if data_shards == 0 {
            return Err(ErasureError::invalid_parameters(
                "data shard count k must be at least 1",
            ));
        }
        if total_shards < data_shards {
            return Err(ErasureError::invalid_parameters(format!(
                "total shard count n = {total_shards} is smaller than k = {data_shards}"
            )));
        }
        if total_shards > MAX_TOTAL_SHARDS {
            return Err(ErasureError::invalid_parameters(format!(
                "total shard count n = {total_shards} exceeds {MAX_TOTAL_SHARDS}"
            )));
        }
        Ok(Self {
            data_shards,
            total_shards,
        })
    }

    #[inline]
    pub fn data_shards(&self) -> usize {
        self.data_shards
    }

    #[inline]
    pub fn total_shards(&self) -> usize {
        self.total_shards
    }

    #[inline]
    pub fn parity_shards(&self) -> usize {
        self.total_shards - self.data_shards
    }
}
