//! Systematic MDS generator matrices.
//!
//! `G = V · V_top⁻¹` where `V[i][j] = (2^i)^j` is an `n × k` Vandermonde
//! matrix over distinct non-zero points. Any `k` rows of `V` are invertible,
//! and right-multiplying by an invertible matrix keeps that true while
//! turning the top `k × k` block into the identity.

use tracing::{debug, instrument};

use crate::{
    algorithm::gf256::Gf256,
    codec::{matrix::Matrix, params::MAX_TOTAL_SHARDS},
    error::{ErasureError, Result},
};

/// `n × k` Vandermonde matrix on the points `2^0 .. 2^(n-1)`.
pub fn build_vandermonde(k: usize, n: usize) -> Matrix {
    let gf = Gf256::global();
    let mut matrix = Matrix::zero(n, k);
    for r in 0..n {
        let x = gf.exp(r);
        for c in 0..k {
            matrix.set(r, c, gf.pow(x, c));
        }
    }
    matrix
}

/// Deterministic `n × k` generator whose first `k` rows are the identity.
#[instrument(level = "debug")]
pub fn build_generator(k: usize, n: usize) -> Result<Matrix> {
    if n > MAX_TOTAL_SHARDS {
        return Err(ErasureError::TooManyShards { total: n });
    }
    if k == 0 || n < k {
        return Err(ErasureError::invalid_parameters(format!(
            "cannot build a generator for k = {k}, n = {n}"
        )));
    }

    let vandermonde = build_vandermonde(k, n);
    let top: Vec<usize> = (0..k).collect();
    let top_inv = vandermonde.select_rows(&top)?.invert()?;
    let generator = vandermonde.multiply(&top_inv)?;

    debug!("built systematic generator");
    Ok(generator)
}
