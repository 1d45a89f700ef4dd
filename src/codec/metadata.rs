//! The descriptor that travels with every shard set.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::{
    codec::params::ErasureParams,
    error::{ErasureError, Result},
};

/// SHA-256 of the original, unpadded input.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn of(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out)
            .map_err(|e| ErasureError::InvalidMetadata(format!("content_hash: {e}")))?;
        Ok(Self(out))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ContentHash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Everything a decoder needs besides the shards themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub original_length: usize,
    pub padding: usize,
    pub block_size: usize,
    pub k: usize,
    pub n: usize,
    pub content_hash: ContentHash,
}

impl Metadata {
    /// Describes `data` encoded under `params`.
    pub fn describe(data: &[u8], params: ErasureParams) -> Self {
        let k = params.data_shards();
        let original_length = data.len();
        let block_size = original_length.div_ceil(k);
        Self {
            original_length,
            padding: block_size * k - original_length,
            block_size,
            k,
            n: params.total_shards(),
            content_hash: ContentHash::of(data),
        }
    }

    pub fn params(&self) -> Result<ErasureParams> {
        ErasureParams::new(self.k, self.n)
    }

    /// Length of the zero-padded buffer the blocks were cut from.
    ///
    /// Only meaningful once [`Metadata::validate`] has passed.
    #[inline]
    pub fn padded_length(&self) -> usize {
        self.block_size * self.k
    }

    /// Checks the field relations a well-formed descriptor must satisfy.
    pub fn validate(&self) -> Result<()> {
        self.params()
            .map_err(|e| ErasureError::InvalidMetadata(e.to_string()))?;
        if self.block_size != self.original_length.div_ceil(self.k) {
            return Err(ErasureError::InvalidMetadata(format!(
                "block_size {} does not match ceil({} / {})",
                self.block_size, self.original_length, self.k
            )));
        }
        let padded = self.block_size.checked_mul(self.k).ok_or_else(|| {
            ErasureError::InvalidMetadata(format!(
                "block_size {} * k {} overflows",
                self.block_size, self.k
            ))
        })?;
        let covered = self.original_length.checked_add(self.padding).ok_or_else(|| {
            ErasureError::InvalidMetadata(format!(
                "original_length {} + padding {} overflows",
                self.original_length, self.padding
            ))
        })?;
        if padded != covered {
            return Err(ErasureError::InvalidMetadata(format!(
                "block_size * k = {padded} but original_length + padding = {covered}"
            )));
        }
        Ok(())
    }

    /// Length and digest check of reconstructed bytes.
    pub fn verify(&self, data: &[u8]) -> Result<()> {
        let actual = ContentHash::of(data);
        if data.len() != self.original_length || actual != self.content_hash {
            return Err(ErasureError::IntegrityMismatch {
                expected: self.content_hash.to_hex(),
                actual: actual.to_hex(),
            });
        }
        Ok(())
    }
}
