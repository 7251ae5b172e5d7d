//! MetricDB CLI - operate on a local metric store directory

mod generate;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use metricdb_core::config::{DATA_DIR_ENV, DEFAULT_DATA_DIR, DEFAULT_TIMESHIFT_MS, TIMESHIFT_ENV};
use metricdb_core::partition::{PartitionKey, Timeshift};
use metricdb_core::record::RECORD_SIZE;
use metricdb_core::storage::MetricStore;
use metricdb_core::MetricKey;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "MetricDB command line tool", long_about = None)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct StoreArgs {
    /// Store directory
    #[arg(long, global = true, env = DATA_DIR_ENV, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Partition width in milliseconds
    #[arg(long, global = true, env = TIMESHIFT_ENV, default_value_t = DEFAULT_TIMESHIFT_MS)]
    timeshift: i64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append one sample
    #[command(allow_negative_numbers = true)]
    Add {
        key: MetricKey,
        value: i32,
        /// Milliseconds; defaults to now
        #[arg(long)]
        timestamp: Option<i64>,
    },
    /// Sum values for a key over [start, end)
    #[command(allow_negative_numbers = true)]
    Sum {
        key: MetricKey,
        start: i64,
        end: i64,
    },
    /// List partition files
    #[command(alias = "ls")]
    Partitions {
        /// Only this key
        #[arg(long)]
        key: Option<MetricKey>,
    },
    /// Write synthetic samples with late arrivals
    Generate {
        /// Keys to generate, one character each
        #[arg(long, default_value = "ab")]
        keys: String,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        start: i64,
        #[arg(long, default_value_t = 1_500_000)]
        max_timestamp: i64,
        #[arg(long, default_value_t = 1)]
        value: i32,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = MetricStore::open(&cli.store.data_dir, cli.store.timeshift)
        .with_context(|| format!("opening store at {:?}", cli.store.data_dir))?;

    match cli.command {
        Command::Add {
            key,
            value,
            timestamp,
        } => {
            let timestamp = timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
            store.add(timestamp, key, value);
            if store.stats().failed_writes > 0 {
                bail!("failed to write sample, see log output");
            }
        }
        Command::Sum { key, start, end } => {
            println!("{}", store.sum(start, end, key)?);
        }
        Command::Partitions { key } => list_partitions(&store, key)?,
        Command::Generate {
            keys,
            start,
            max_timestamp,
            value,
        } => {
            let mut rng = rand::thread_rng();
            for key in keys.chars() {
                let samples = generate::samples(&mut rng, key, start, max_timestamp, value);
                for sample in &samples {
                    store.add_sample(*sample);
                }
                println!("{}: {} samples", key, samples.len());
            }
            println!("{}", serde_json::to_string_pretty(&store.stats())?);
        }
    }

    store.close();
    Ok(())
}

/// One partition file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
struct PartitionRow {
    partition: PartitionKey,
    records: u64,
    trailing_bytes: u64,
}

fn partition_rows(
    store: &MetricStore,
    only: Option<MetricKey>,
) -> anyhow::Result<Vec<PartitionRow>> {
    let timeshift: Timeshift = store.timeshift();
    let mut rows = Vec::new();

    for entry in std::fs::read_dir(store.data_dir())? {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        let Some(partition) = PartitionKey::parse_file_name(&name, timeshift) else {
            continue;
        };
        if only.map_or(true, |key| key == partition.key()) {
            let len = entry.metadata()?.len();
            rows.push(PartitionRow {
                partition,
                records: len / RECORD_SIZE as u64,
                trailing_bytes: len % RECORD_SIZE as u64,
            });
        }
    }

    rows.sort_by_key(|row| (row.partition.key(), row.partition.index()));
    Ok(rows)
}

fn list_partitions(store: &MetricStore, only: Option<MetricKey>) -> anyhow::Result<()> {
    for row in partition_rows(store, only)? {
        if row.trailing_bytes == 0 {
            println!("{}\t{} records", row.partition, row.records);
        } else {
            println!(
                "{}\t{} records (+{} trailing bytes)",
                row.partition, row.records, row.trailing_bytes
            );
        }
    }
    Ok(())
}
