use anyhow::{Context, Result, anyhow};
use futures_util::future::join_all;
use shardvault::{Codec, ContentHash};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{info, instrument, warn};

use crate::{
    cli::commands::Commands,
    io::{
        manifest::{Manifest, shard_path},
        progress_bar,
    },
};

#[instrument(skip(args))]
pub async fn handle_decode(args: Commands) -> Result<()> {
    let (shard_dir, output_path) = match args {
        Commands::Decode { input, output } => (input, output),
        _ => unreachable!(),
    };

    let written = decode_dir(&shard_dir, &output_path).await?;
    info!(
        "✅ Successfully reconstructed '{}' ({} bytes)",
        output_path.display(),
        written
    );
    Ok(())
}

/// Reads every shard file that still exists for one part.
async fn read_part(shard_dir: &Path, part: usize, n: usize) -> Result<Vec<(usize, Vec<u8>)>> {
    let mut read_handles = Vec::with_capacity(n);
    for i in 0..n {
        let path = shard_path(shard_dir, part, i);
        read_handles.push(tokio::spawn(async move {
            let data = if fs::try_exists(&path).await? {
                Some(fs::read(&path).await?)
            } else {
                None
            };
            Ok::<Option<Vec<u8>>, anyhow::Error>(data)
        }));
    }

    let mut available = Vec::with_capacity(n);
    for (i, result) in join_all(read_handles).await.into_iter().enumerate() {
        if let Some(data) = result.context("Join error in shard read task")?? {
            available.push((i, data));
        }
    }
    Ok(available)
}

/// Rebuilds the file described by `shard_dir/manifest.json` into `output_path`.
pub async fn decode_dir(shard_dir: &Path, output_path: &Path) -> Result<usize> {
    info!("Reading manifest from: {:?}", shard_dir);
    let manifest = Manifest::load(shard_dir).await?;
    let first = manifest
        .parts
        .first()
        .ok_or_else(|| anyhow!("Manifest lists no parts"))?;
    let codec = Arc::new(Codec::for_metadata(first)?);
    let n = first.n;

    let pb_read = progress_bar(
        manifest.parts.len() as u64,
        "[{elapsed_precise}] [{bar:40.green/black}] Decoding parts {pos}/{len}",
    )?;

    let mut out_buf = Vec::with_capacity(manifest.original_size);
    for (part, metadata) in manifest.parts.iter().enumerate() {
        let available = read_part(shard_dir, part, n).await?;
        let missing = n - available.len();
        if missing > 0 {
            warn!(part, missing, "Some shards are missing, reconstructing");
        }

        let codec_clone = codec.clone();
        let metadata = metadata.clone();
        let recovered = tokio::task::spawn_blocking(move || {
            let pairs: Vec<(usize, &[u8])> =
                available.iter().map(|(i, d)| (*i, d.as_slice())).collect();
            codec_clone.decode(&pairs, &metadata)
        })
        .await
        .context("Shard reconstruction task panicked")?
        .with_context(|| format!("Failed to decode part {part}"))?;

        out_buf.extend_from_slice(&recovered);
        pb_read.inc(1);
    }
    pb_read.finish_with_message("File assembled!");

    if out_buf.len() != manifest.original_size || ContentHash::of(&out_buf) != manifest.original_hash
    {
        return Err(anyhow!(
            "Reassembled file does not match manifest hash {}",
            manifest.original_hash
        ));
    }

    fs::write(output_path, &out_buf)
        .await
        .with_context(|| format!("Failed to write {:?}", output_path))?;
    Ok(out_buf.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::encoding::encode_file;
    use shardvault::{ErasureError, ErasureParams};

    #[tokio::test]
    async fn test_file_roundtrip_with_lost_shards() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("input.bin");
        let shards = dir.path().join("shards");
        let output = dir.path().join("output.bin");

        let data: Vec<u8> = b"Hello, this is a test file for erasure coding! "
            .iter()
            .copied()
            .cycle()
            .take(4700)
            .collect();
        fs::write(&input, &data).await?;

        let manifest = encode_file(&input, &shards, ErasureParams::new(4, 6)?, 2).await?;
        assert_eq!(manifest.parts.len(), 2);
        assert_eq!(manifest.parts[0].block_size, 588);
        assert_eq!(manifest.original_filename, "input.bin");

        // Two data shards gone from part 0, one of each kind from part 1.
        fs::remove_file(shard_path(&shards, 0, 0)).await?;
        fs::remove_file(shard_path(&shards, 0, 2)).await?;
        fs::remove_file(shard_path(&shards, 1, 3)).await?;
        fs::remove_file(shard_path(&shards, 1, 5)).await?;

        let written = decode_dir(&shards, &output).await?;
        assert_eq!(written, data.len());
        assert_eq!(fs::read(&output).await?, data);
        Ok(())
    }

    #[tokio::test]
    async fn test_too_few_shards_fails() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("input.bin");
        let shards = dir.path().join("shards");
        fs::write(&input, vec![7u8; 100]).await?;

        encode_file(&input, &shards, ErasureParams::new(3, 5)?, 1).await?;
        for i in 0..3 {
            fs::remove_file(shard_path(&shards, 0, i)).await?;
        }

        let err = decode_dir(&shards, &dir.path().join("out.bin"))
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ErasureError>(),
            Some(&ErasureError::InsufficientShards { needed: 3, got: 2 })
        );
        Ok(())
    }
}
