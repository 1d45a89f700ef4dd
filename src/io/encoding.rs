use anyhow::{Context, Result, anyhow};
use futures_util::future::join_all;
use shardvault::{Codec, ContentHash, ErasureParams};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{info, instrument};

use crate::{
    cli::commands::Commands,
    io::{
        manifest::{Manifest, part_dir, shard_path},
        progress_bar,
    },
};

#[instrument(skip(args))]
pub async fn handle_encode(args: Commands) -> Result<()> {
    let (input_path, out_dir, k, n, parts) = match args {
        Commands::Encode {
            input,
            output,
            data_shards,
            total_shards,
            parts,
        } => (input, output, data_shards, total_shards, parts),
        _ => unreachable!(),
    };

    let params = ErasureParams::new(k, n).context("Invalid k/n values")?;
    let manifest = encode_file(&input_path, &out_dir, params, parts).await?;

    info!(
        "✅ Successfully encoded '{}' ({} bytes, {} parts, {} shards each)",
        input_path.display(),
        manifest.original_size,
        manifest.parts.len(),
        n
    );
    Ok(())
}

/// Encodes `input_path` into `out_dir` as `parts` independent shard sets.
pub async fn encode_file(
    input_path: &Path,
    out_dir: &Path,
    params: ErasureParams,
    parts: usize,
) -> Result<Manifest> {
    if parts == 0 {
        return Err(anyhow!("Part count must be at least 1"));
    }

    info!("Reading input file: {:?}", input_path);
    let buf = fs::read(input_path)
        .await
        .with_context(|| format!("Failed to read input file: {:?}", input_path))?;
    let original_size = buf.len();
    let original_hash = ContentHash::of(&buf);

    let part_size = original_size.div_ceil(parts).max(1);
    let buf = Arc::new(buf);
    let codec = Arc::new(Codec::new(params)?);

    let pb_compute = progress_bar(
        parts as u64,
        "[{elapsed_precise}] [{bar:40.yellow/black}] Encoding parts {pos}/{len}",
    )?;
    let ranges: Vec<(usize, usize)> = (0..parts)
        .map(|p| {
            let start = (p * part_size).min(original_size);
            let end = ((p + 1) * part_size).min(original_size);
            (start, end)
        })
        .collect();

    let codec_clone = codec.clone();
    let buf_clone = buf.clone();
    let pb_clone = pb_compute.clone();
    let encoded_parts = tokio::task::spawn_blocking(move || {
        ranges
            .into_iter()
            .map(|(start, end)| {
                let encoded = codec_clone.encode(&buf_clone[start..end]);
                pb_clone.inc(1);
                encoded
            })
            .collect::<Result<Vec<_>, _>>()
    })
    .await
    .context("Encoding task panicked")??;
    pb_compute.finish_with_message("Parity computed!");

    info!(
        "Writing {} parts of {} data and {} parity shards to {:?}",
        parts,
        params.data_shards(),
        params.parity_shards(),
        out_dir
    );
    for p in 0..parts {
        fs::create_dir_all(part_dir(out_dir, p))
            .await
            .with_context(|| format!("Failed to create output directory: {:?}", out_dir))?;
    }

    let pb_write = progress_bar(
        (parts * params.total_shards()) as u64,
        "[{elapsed_precise}] [{bar:40.green/black}] Writing shards {pos}/{len}",
    )?;

    let mut metadata = Vec::with_capacity(parts);
    let mut write_handles = Vec::with_capacity(parts * params.total_shards());
    for (p, encoded) in encoded_parts.into_iter().enumerate() {
        metadata.push(encoded.metadata);
        for shard in encoded.shards {
            let path = shard_path(out_dir, p, shard.index);
            let pb_clone = pb_write.clone();
            write_handles.push(tokio::spawn(async move {
                fs::write(&path, shard.data)
                    .await
                    .with_context(|| format!("Failed to write shard {:?}", path))?;
                pb_clone.inc(1);
                Ok::<_, anyhow::Error>(())
            }));
        }
    }

    for handle in join_all(write_handles).await {
        handle.context("Join error in shard write task")??;
    }
    pb_write.finish_with_message("All shards written!");

    let manifest = Manifest {
        original_filename: input_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        original_size,
        original_hash,
        parts: metadata,
    };
    manifest.save(out_dir).await?;
    Ok(manifest)
}
