use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about,
    long_about = "Any-k-of-n erasure coding over GF(2^8)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Split a file into data and parity shards.
    Encode {
        #[arg(short, long)]
        input: PathBuf,

        /// Directory receiving the shard files and `manifest.json`.
        #[arg(short, long)]
        output: PathBuf,

        /// Shards needed to rebuild (k).
        #[arg(short = 'k', long)]
        data_shards: usize,

        /// Shards written in total (n).
        #[arg(short = 'n', long)]
        total_shards: usize,

        /// Encode the file as this many independent parts.
        #[arg(short, long, default_value_t = 1)]
        parts: usize,
    },
    /// Rebuild a file from whatever shards are left in a directory.
    Decode {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
    /// Encode in memory, drop random shards and decode from the rest.
    Simulate {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short = 'k', long)]
        data_shards: usize,

        #[arg(short = 'n', long)]
        total_shards: usize,

        /// Shards to drop. Defaults to n - k.
        #[arg(short, long)]
        lose: Option<usize>,

        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Measure encode and parity-only decode throughput on random data.
    Bench {
        #[arg(long, default_value_t = 64)]
        size_mib: usize,

        #[arg(short = 'k', long, default_value_t = 10)]
        data_shards: usize,

        #[arg(short = 'n', long, default_value_t = 14)]
        total_shards: usize,
    },
}
