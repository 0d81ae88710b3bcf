//! Build a channel's Markov brain from a plain-text chat log.
//!
//! Usage: `build_brain <input.txt> <channel> [brain_dir]`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::info;

use minibot::scripts::markov::{build_table, decode_chat_log, BrainStore};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (input, channel, brain_dir) = match args.as_slice() {
        [input, channel] => (PathBuf::from(input), channel, PathBuf::from("data")),
        [input, channel, dir] => (PathBuf::from(input), channel, PathBuf::from(dir)),
        _ => bail!("usage: build_brain <input.txt> <channel> [brain_dir]"),
    };

    let bytes = std::fs::read(&input)
        .with_context(|| format!("Failed to read input file {}", input.display()))?;
    let text = decode_chat_log(&bytes);

    // Always a fresh brain; an existing file for the channel is replaced.
    let (table, stats) = build_table(&text);
    let store = BrainStore::new(brain_dir);
    store
        .save(channel, &table)
        .with_context(|| format!("Failed to save brain for {}", channel))?;

    info!(
        "Learned {} lines ({} skipped); {} keys",
        stats.learned,
        stats.skipped,
        table.len()
    );
    info!("Markov brain saved to {}", store.path_for(channel).display());
    Ok(())
}
