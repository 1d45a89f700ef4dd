//! # shardvault
//!
//! ## Usage
//!
//! ### Encoding a file
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- encode --input my_large_file.bin --output shards_out -k 10 -n 14
//! ```
//!
//! ### Reconstructing a file
//!
//! After removing up to `n - k` shard files from each part directory in `shards_out`...
//! ```bash
//! RUST_LOG=info cargo run --release -- decode --input shards_out --output recovered_file.bin
//! ```
//!
//! ### Trying random losses
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- simulate --input my_file.bin -k 3 -n 7 --seed 7
//! ```

mod cli;
mod io;

use crate::{
    cli::commands::{Cli, Commands},
    io::{
        bench::handle_bench, decoding::handle_decode, encoding::handle_encode,
        simulate::handle_simulate,
    },
};
use anyhow::Result;
use clap::Parser;
use std::time::Instant;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    let start_time = Instant::now();

    let result = match cli.command {
        Commands::Encode { .. } => handle_encode(cli.command).await,
        Commands::Decode { .. } => handle_decode(cli.command).await,
        Commands::Simulate { .. } => handle_simulate(cli.command).await,
        Commands::Bench { .. } => handle_bench(cli.command).await,
    };

    if let Err(e) = &result {
        error!("Operation failed: {:?}", e);
    }

    info!("Total execution time: {:.2?}", start_time.elapsed());

    result
}
