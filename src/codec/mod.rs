pub mod encode_shards;
pub mod generator;
pub mod matrix;
pub mod metadata;
pub mod params;
pub mod reconstruct_shards;

use crate::error::Result;
use encode_shards::Encoded;
use metadata::Metadata;
use params::ErasureParams;
use reconstruct_shards::Codec;

/// Splits `data` into `k` blocks and produces `n` shards plus their metadata.
///
/// Parameters are checked before anything is allocated.
pub fn encode(data: &[u8], k: usize, n: usize) -> Result<Encoded> {
    let params = ErasureParams::new(k, n)?;
    Codec::new(params)?.encode(data)
}

/// Rebuilds the original bytes from any `metadata.k` distinct `(index, block)` pairs.
pub fn decode(shards: &[(usize, &[u8])], metadata: &Metadata) -> Result<Vec<u8>> {
    Codec::for_metadata(metadata)?.decode(shards, metadata)
}
