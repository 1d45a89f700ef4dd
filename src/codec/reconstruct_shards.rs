use std::sync::Arc;

use dashmap::DashMap;
use rayon::prelude::*;
use tracing::{debug, info_span, instrument};

use crate::{
    algorithm::gf256::Gf256,
    codec::{
        encode_shards::{Encoded, Shard, shard_encoding, split_blocks},
        generator::build_generator,
        matrix::Matrix,
        metadata::Metadata,
        params::ErasureParams,
    },
    error::{ErasureError, Result},
};

/// Encoder and decoder for one `(k, n)` pair.
///
/// Holding on to a `Codec` only saves work: the generator is built once and
/// inverted submatrices are memoised. Every result is the same as building
/// a fresh one per call.
pub struct Codec {
    params: ErasureParams,
    /// `n × k`, identity on top.
    generator: Matrix,
    /// Rows `k..n` of the generator.
    parity_rows: Matrix,
    /// Inverted `k × k` submatrices, keyed by the ascending row indices they were built from.
    inverse_matrix_cache: DashMap<Vec<usize>, Arc<Matrix>>,
}

impl Codec {
    pub fn new(params: ErasureParams) -> Result<Self> {
        let k = params.data_shards();
        let n = params.total_shards();
        let generator = build_generator(k, n)?;
        let parity: Vec<usize> = (k..n).collect();
        let parity_rows = generator.select_rows(&parity)?;
        Ok(Self {
            params,
            generator,
            parity_rows,
            inverse_matrix_cache: DashMap::new(),
        })
    }

    /// Codec matching an existing descriptor.
    pub fn for_metadata(metadata: &Metadata) -> Result<Self> {
        metadata.validate()?;
        Self::new(metadata.params()?)
    }

    pub fn params(&self) -> ErasureParams {
        self.params
    }

    pub fn generator(&self) -> &Matrix {
        &self.generator
    }

    #[instrument(skip_all, fields(k = self.params.data_shards(), n = self.params.total_shards(), len = data.len()))]
    pub fn encode(&self, data: &[u8]) -> Result<Encoded> {
        let metadata = Metadata::describe(data, self.params);
        let blocks = split_blocks(data, metadata.k, metadata.block_size);
        let parities = shard_encoding(&self.parity_rows, &blocks)?;

        let shards = blocks
            .into_iter()
            .chain(parities)
            .enumerate()
            .map(|(index, data)| Shard { index, data })
            .collect::<Vec<_>>();

        debug!(block_size = metadata.block_size, padding = metadata.padding, "encoded");
        Ok(Encoded { shards, metadata })
    }

    fn get_or_compute_inverse_matrix(&self, survivors: &[usize]) -> Result<Arc<Matrix>> {
        if let Some(cached_inv) = self.inverse_matrix_cache.get(survivors) {
            return Ok(Arc::clone(cached_inv.value()));
        }

        let inverted = Arc::new(self.generator.select_rows(survivors)?.invert()?);
        self.inverse_matrix_cache
            .insert(survivors.to_vec(), Arc::clone(&inverted));
        Ok(inverted)
    }

    /// Places each presented shard in its slot, rejecting repeats, indices
    /// outside `[0, n)` and blocks of the wrong length.
    fn slot_shards<'a>(
        &self,
        shards: &[(usize, &'a [u8])],
        block_size: usize,
    ) -> Result<Vec<Option<&'a [u8]>>> {
        let n = self.params.total_shards();
        let mut slots: Vec<Option<&[u8]>> = vec![None; n];
        for &(index, data) in shards {
            if index >= n || slots[index].is_some() {
                return Err(ErasureError::DuplicateOrOutOfRangeIndex { index, total: n });
            }
            if data.len() != block_size {
                return Err(ErasureError::ShardSizeMismatch {
                    index,
                    expected: block_size,
                    got: data.len(),
                });
            }
            slots[index] = Some(data);
        }
        Ok(slots)
    }

    /// Recovers the original bytes from at least `k` distinct shards.
    ///
    /// When more than `k` shards are presented, only the `k` with the lowest
    /// indices are read. The result is checked against `metadata.content_hash`.
    #[instrument(skip_all, fields(k = metadata.k, n = metadata.n, presented = shards.len()))]
    pub fn decode(&self, shards: &[(usize, &[u8])], metadata: &Metadata) -> Result<Vec<u8>> {
        metadata.validate()?;
        if metadata.params()? != self.params {
            return Err(ErasureError::InvalidMetadata(format!(
                "metadata is for k = {}, n = {} but codec is k = {}, n = {}",
                metadata.k,
                metadata.n,
                self.params.data_shards(),
                self.params.total_shards()
            )));
        }

        let k = self.params.data_shards();
        let slots = self.slot_shards(shards, metadata.block_size)?;

        let present: Vec<usize> = (0..slots.len()).filter(|&i| slots[i].is_some()).collect();
        if present.len() < k {
            return Err(ErasureError::InsufficientShards {
                needed: k,
                got: present.len(),
            });
        }

        let survivors = &present[..k];
        let survivor_data: Vec<&[u8]> = survivors.iter().filter_map(|&i| slots[i]).collect();

        let mut out = Vec::with_capacity(metadata.padded_length());
        if survivors.iter().copied().eq(0..k) {
            debug!("all data shards present, concatenating");
            for block in &survivor_data {
                out.extend_from_slice(block);
            }
        } else {
            let recovered = self.recover_data_blocks(survivors, &survivor_data, metadata.block_size)?;
            for block in &recovered {
                out.extend_from_slice(block);
            }
        }

        out.truncate(metadata.original_length);
        metadata.verify(&out)?;
        Ok(out)
    }

    /// Convenience over [`Codec::decode`] for owned shards.
    pub fn decode_shards(&self, shards: &[Shard], metadata: &Metadata) -> Result<Vec<u8>> {
        let pairs: Vec<(usize, &[u8])> = shards.iter().map(Shard::as_pair).collect();
        self.decode(&pairs, metadata)
    }

    /// All `k` data blocks from exactly `k` survivors, listed in ascending index order.
    fn recover_data_blocks(
        &self,
        survivors: &[usize],
        survivor_data: &[&[u8]],
        block_size: usize,
    ) -> Result<Vec<Vec<u8>>> {
        let k = self.params.data_shards();
        let a_inv = self.get_or_compute_inverse_matrix(survivors)?;
        let gf = Gf256::global();

        debug!(?survivors, "solving for missing data blocks");
        let blocks: Vec<Vec<u8>> = (0..k)
            .into_par_iter()
            .map(|data_idx| {
                // A surviving data shard is its own block.
                if let Ok(pos) = survivors.binary_search(&data_idx) {
                    return survivor_data[pos].to_vec();
                }
                let mut block = vec![0u8; block_size];
                for (&coef, sdata) in a_inv.row(data_idx).iter().zip(survivor_data) {
                    gf.mul_slice_xor(coef, sdata, &mut block);
                }
                block
            })
            .collect();
        Ok(blocks)
    }

    /// Refills every empty slot of an `n`-slot shard array, data and parity
    /// alike, from any `k` present slots. Present slots are left untouched.
    #[instrument(skip_all, fields(k = self.params.data_shards(), n = self.params.total_shards()))]
    pub fn reconstruct(&self, shards_opt: &mut [Option<Vec<u8>>]) -> Result<()> {
        let k = self.params.data_shards();
        let n = self.params.total_shards();
        if shards_opt.len() != n {
            return Err(ErasureError::DimensionMismatch(format!(
                "expected {n} shard slots, got {}",
                shards_opt.len()
            )));
        }

        let present_indices: Vec<usize> = (0..n).filter(|&i| shards_opt[i].is_some()).collect();
        if present_indices.len() < k {
            return Err(ErasureError::InsufficientShards {
                needed: k,
                got: present_indices.len(),
            });
        }

        let survivor_data: Vec<&[u8]> = present_indices[..k]
            .iter()
            .filter_map(|&i| shards_opt[i].as_deref())
            .collect();
        let shard_len = survivor_data[0].len();
        for &i in &present_indices {
            let got = shards_opt[i].as_ref().map_or(0, Vec::len);
            if got != shard_len {
                return Err(ErasureError::ShardSizeMismatch {
                    index: i,
                    expected: shard_len,
                    got,
                });
            }
        }

        let missing_indices: Vec<usize> = (0..n).filter(|&i| shards_opt[i].is_none()).collect();
        if missing_indices.is_empty() {
            return Ok(());
        }

        let survivors = &present_indices[..k];
        let a_inv = self.get_or_compute_inverse_matrix(survivors)?;
        let gf = Gf256::global();

        let recovered_shards = missing_indices
            .par_iter()
            .map(|&missing_idx| -> Result<(usize, Vec<u8>)> {
                let _span = info_span!("reconstruct_shard", index = missing_idx).entered();
                // Data rows come straight from the inverse; parity rows are
                // their generator row pushed through it.
                let recovery_row = if missing_idx < k {
                    a_inv.row(missing_idx).to_vec()
                } else {
                    a_inv.left_multiply_row(self.generator.row(missing_idx))?
                };

                let mut out_shard = vec![0u8; shard_len];
                for (&coef, sdata) in recovery_row.iter().zip(&survivor_data) {
                    gf.mul_slice_xor(coef, sdata, &mut out_shard);
                }
                Ok((missing_idx, out_shard))
            })
            .collect::<Result<Vec<_>>>()?;

        for (idx, shard_data) in recovered_shards {
            shards_opt[idx] = Some(shard_data);
        }
        debug!(rebuilt = missing_indices.len(), "reconstruction complete");
        Ok(())
    }
}
