//! # shardvault
//!
//! Systematic Reed-Solomon style erasure coding over GF(2^8): a buffer is cut
//! into `k` data shards and extended with `n - k` parity shards, and any `k`
//! of the `n` shards rebuild it byte for byte.
//!
//! ```
//! let data = b"Secret message: The quick brown fox jumps over the lazy dog";
//! let encoded = shardvault::encode(data, 4, 8)?;
//!
//! // Only parity survives.
//! let parity = encoded.select(&[4, 5, 6, 7]);
//! assert_eq!(shardvault::decode(&parity, &encoded.metadata)?, data);
//! # Ok::<(), shardvault::ErasureError>(())
//! ```

pub mod algorithm;
pub mod codec;
pub mod error;

pub use codec::{
    decode, encode,
    encode_shards::{Encoded, Shard},
    metadata::{ContentHash, Metadata},
    params::ErasureParams,
    reconstruct_shards::Codec,
};
pub use error::{ErasureError, Result};
