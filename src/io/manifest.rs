use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shardvault::{ContentHash, Metadata};
use std::path::{Path, PathBuf};
use tokio::fs;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Written next to the shards; one [`Metadata`] per independently encoded part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub original_filename: String,
    pub original_size: usize,
    pub original_hash: ContentHash,
    pub parts: Vec<Metadata>,
}

impl Manifest {
    pub async fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        let raw = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {path:?}. Is the shard directory correct?"))?;
        serde_json::from_str(&raw).with_context(|| format!("Malformed manifest {path:?}"))
    }

    pub async fn save(&self, dir: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(dir.join(MANIFEST_FILE), json)
            .await
            .context("Failed to write manifest")
    }
}

pub fn part_dir(root: &Path, part: usize) -> PathBuf {
    root.join(format!("part_{part:03}"))
}

pub fn shard_path(root: &Path, part: usize, index: usize) -> PathBuf {
    part_dir(root, part).join(format!("shard_{index:02}.dat"))
}
