use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::{
    algorithm::gf256::Gf256,
    codec::{matrix::Matrix, metadata::Metadata},
    error::{ErasureError, Result},
};

/// One encoded output block. Indices `0..k` carry data, `k..n` parity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    pub index: usize,
    pub data: Vec<u8>,
}

impl Shard {
    pub fn is_parity(&self, k: usize) -> bool {
        self.index >= k
    }

    pub fn as_pair(&self) -> (usize, &[u8]) {
        (self.index, self.data.as_slice())
    }
}

/// Result of one encode call: all `n` shards in index order plus their descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub shards: Vec<Shard>,
    pub metadata: Metadata,
}

impl Encoded {
    /// `(index, bytes)` view of every shard, ready for decoding.
    pub fn pairs(&self) -> Vec<(usize, &[u8])> {
        self.shards.iter().map(Shard::as_pair).collect()
    }

    /// Pairs for the given indices only, in the given order.
    ///
    /// An index with no shard is kept with an empty block, so decoding it
    /// fails with `DuplicateOrOutOfRangeIndex` rather than a shard count error.
    pub fn select(&self, indices: &[usize]) -> Vec<(usize, &[u8])> {
        indices
            .iter()
            .map(|&i| self.shards.get(i).map_or((i, &[][..]), Shard::as_pair))
            .collect()
    }
}

/// Zero-pads `data` to a multiple of `k` and cuts it into `k` equal blocks.
pub fn split_blocks(data: &[u8], k: usize, block_size: usize) -> Vec<Vec<u8>> {
    let mut blocks = vec![vec![0u8; block_size]; k];
    if block_size == 0 {
        return blocks;
    }
    blocks
        .par_iter_mut()
        .zip(data.par_chunks(block_size))
        .for_each(|(block, chunk)| {
            block[..chunk.len()].copy_from_slice(chunk);
        });
    blocks
}

/// One output block per row of `matrix`, each the row's dot product with
/// `data_blocks` taken independently at every byte offset.
#[instrument(skip_all, fields(k = data_blocks.len(), rows = matrix.row_count()))]
pub fn shard_encoding(matrix: &Matrix, data_blocks: &[Vec<u8>]) -> Result<Vec<Vec<u8>>> {
    let rows = matrix.row_count();
    if rows == 0 {
        return Ok(vec![]);
    }
    if matrix.col_count() != data_blocks.len() {
        return Err(ErasureError::DimensionMismatch(format!(
            "matrix has {} columns but {} data blocks were given",
            matrix.col_count(),
            data_blocks.len()
        )));
    }
    let block_len = data_blocks.first().map_or(0, Vec::len);
    if let Some(bad) = data_blocks.iter().position(|b| b.len() != block_len) {
        return Err(ErasureError::ShardSizeMismatch {
            index: bad,
            expected: block_len,
            got: data_blocks[bad].len(),
        });
    }

    let gf = Gf256::global();
    let mut outputs = vec![vec![0u8; block_len]; rows];
    debug!("computing encoded rows in parallel");

    outputs.par_iter_mut().enumerate().for_each(|(r, out)| {
        for (&coef, block) in matrix.row(r).iter().zip(data_blocks) {
            gf.mul_slice_xor(coef, block, out);
        }
    });

    Ok(outputs)
}
