use anyhow::{Context, Result};
use rand::RngCore;
use shardvault::{Codec, ErasureParams};
use std::time::{Duration, Instant};
use tracing::{info, instrument};

use crate::cli::commands::Commands;

#[derive(Debug, Clone, Copy)]
pub struct BenchResult {
    pub bytes: usize,
    pub encode: Duration,
    pub decode: Duration,
}

impl BenchResult {
    fn mib_per_sec(bytes: usize, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64().max(f64::EPSILON);
        bytes as f64 / (1024.0 * 1024.0) / secs
    }

    pub fn encode_mib_s(&self) -> f64 {
        Self::mib_per_sec(self.bytes, self.encode)
    }

    pub fn decode_mib_s(&self) -> f64 {
        Self::mib_per_sec(self.bytes, self.decode)
    }
}

#[instrument(skip(args))]
pub async fn handle_bench(args: Commands) -> Result<()> {
    let (size_mib, k, n) = match args {
        Commands::Bench {
            size_mib,
            data_shards,
            total_shards,
        } => (size_mib, data_shards, total_shards),
        _ => unreachable!(),
    };

    let params = ErasureParams::new(k, n).context("Invalid k/n values")?;
    let result = tokio::task::spawn_blocking(move || run_bench(size_mib * 1024 * 1024, params))
        .await
        .context("Benchmark task panicked")??;

    info!(
        "k={} n={} size={} MiB: encode {:.2?} ({:.1} MiB/s), decode {:.2?} ({:.1} MiB/s)",
        k,
        n,
        size_mib,
        result.encode,
        result.encode_mib_s(),
        result.decode,
        result.decode_mib_s()
    );
    Ok(())
}

/// Times one encode and one decode that leans on as many parity shards as possible.
pub fn run_bench(bytes: usize, params: ErasureParams) -> Result<BenchResult> {
    let mut data = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut data);

    let codec = Codec::new(params)?;

    let start = Instant::now();
    let encoded = codec.encode(&data)?;
    let encode = start.elapsed();

    let n = params.total_shards();
    let survivors: Vec<usize> = (n - params.data_shards()..n).collect();
    let start = Instant::now();
    let decoded = codec.decode(&encoded.select(&survivors), &encoded.metadata)?;
    let decode = start.elapsed();

    debug_assert_eq!(decoded.len(), bytes);
    Ok(BenchResult {
        bytes,
        encode,
        decode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_bench_runs() -> Result<()> {
        let result = run_bench(64 * 1024, ErasureParams::new(4, 6)?)?;
        assert_eq!(result.bytes, 64 * 1024);
        assert!(result.encode_mib_s() > 0.0);
        assert!(result.decode_mib_s() > 0.0);
        Ok(())
    }
}
