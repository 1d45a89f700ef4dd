//! Error types for the erasure coding engine.

pub type Result<T> = std::result::Result<T, ErasureError>;

/// Every way an encode or decode call can fail.
///
/// All variants are reported synchronously; the engine never retries or
/// substitutes data on its own.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErasureError {
    /// `k = 0`, `n < k`, or `n > 255`.
    #[error("invalid parameters: {reason}")]
    InvalidParameters { reason: String },

    /// The field has only 255 distinct non-zero evaluation points.
    #[error("too many shards: {total} exceeds the GF(256) limit of 255")]
    TooManyShards { total: usize },

    /// Fewer than `k` distinct shards were presented.
    #[error("insufficient shards: need {needed}, got {got}")]
    InsufficientShards { needed: usize, got: usize },

    /// A presented index repeats or is not in `[0, total)`.
    #[error("shard index {index} is duplicated or outside [0, {total})")]
    DuplicateOrOutOfRangeIndex { index: usize, total: usize },

    /// A presented shard does not have the block size recorded in the metadata.
    #[error("shard {index} is {got} bytes, expected {expected}")]
    ShardSizeMismatch {
        index: usize,
        expected: usize,
        got: usize,
    },

    /// The selected generator submatrix has no inverse.
    #[error("matrix is singular and cannot be inverted")]
    Singular,

    /// The reconstructed bytes do not hash to the recorded digest.
    #[error("integrity mismatch: expected {expected}, reconstructed {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    #[error("inverse of zero is undefined")]
    InverseOfZero,

    #[error("matrix dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
}

impl ErasureError {
    pub(crate) fn invalid_parameters(reason: impl Into<String>) -> Self {
        ErasureError::InvalidParameters {
            reason: reason.into(),
        }
    }
}
