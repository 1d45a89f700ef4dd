use anyhow::{Context, Result, anyhow};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use shardvault::{Codec, ErasureParams};
use tokio::fs;
use tracing::{info, instrument};

use crate::cli::commands::Commands;

/// What one simulated loss looked like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LossReport {
    pub lost: Vec<usize>,
    pub survivors: Vec<usize>,
    pub recovered: bool,
}

#[instrument(skip(args))]
pub async fn handle_simulate(args: Commands) -> Result<()> {
    let (input, k, n, lose, seed) = match args {
        Commands::Simulate {
            input,
            data_shards,
            total_shards,
            lose,
            seed,
        } => (input, data_shards, total_shards, lose, seed),
        _ => unreachable!(),
    };

    let params = ErasureParams::new(k, n).context("Invalid k/n values")?;
    let data = fs::read(&input)
        .await
        .with_context(|| format!("Failed to read input file: {:?}", input))?;
    let lose = lose.unwrap_or(params.parity_shards());

    let report = tokio::task::spawn_blocking(move || simulate_loss(&data, params, lose, seed))
        .await
        .context("Simulation task panicked")??;

    info!("Lost shards: {:?}", report.lost);
    info!("Surviving shards: {:?}", report.survivors);
    if report.recovered {
        info!("✅ Recovered the original bytes from {} shards", report.survivors.len());
    } else {
        info!(
            "❌ {} survivors are below the threshold of {}",
            report.survivors.len(),
            k
        );
    }
    Ok(())
}

/// Encodes `data`, drops `lose` random shards and decodes from the rest.
///
/// Falling below `k` survivors is reported, not raised; any other failure is
/// an error.
pub fn simulate_loss(
    data: &[u8],
    params: ErasureParams,
    lose: usize,
    seed: Option<u64>,
) -> Result<LossReport> {
    let n = params.total_shards();
    if lose > n {
        return Err(anyhow!("Cannot lose {lose} of only {n} shards"));
    }

    let codec = Codec::new(params)?;
    let encoded = codec.encode(data)?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut rng);

    let mut lost = order[..lose].to_vec();
    let mut survivors = order[lose..].to_vec();
    lost.sort_unstable();
    survivors.sort_unstable();

    let recovered = match codec.decode(&encoded.select(&survivors), &encoded.metadata) {
        Ok(bytes) => bytes == data,
        Err(shardvault::ErasureError::InsufficientShards { .. }) => false,
        Err(e) => return Err(e.into()),
    };

    Ok(LossReport {
        lost,
        survivors,
        recovered,
    })
}
