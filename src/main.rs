//! Memlane CLI
//!
//! # Commands
//!
//! - `hash` - Hash a header at a height
//! - `benchmark` - Multi-threaded hashrate benchmark
//! - `seed-height` - Show the epoch seed heights for a block height
//! - `params` - Print algorithm parameters

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use memlane::algorithm::{self, check_difficulty, epoch_number, epoch_seed_hash, seed_heights};
use memlane::logger::init_logger;
use memlane::{Engine, EngineConfig, MinerThreadTag, SeedHash, Settings, Worker};

#[derive(Parser)]
#[command(name = "memlane")]
#[command(author = "Memlane Developers")]
#[command(version)]
#[command(about = "Memlane proof-of-work hasher")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (default: <config dir>/memlane/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level: off, error, warn, info, debug, trace
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Number of dataset items
    #[arg(long, global = true)]
    dataset_items: Option<usize>,

    /// Dataset init threads (0 = one per CPU)
    #[arg(long, global = true)]
    init_threads: Option<usize>,

    /// Compute dataset items on demand instead of building the dataset
    #[arg(long, global = true)]
    light: bool,

    /// Do not request huge pages
    #[arg(long, global = true)]
    no_large_pages: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash a header
    Hash {
        /// Header bytes, hex
        #[arg(long)]
        header: String,

        /// Block height
        #[arg(long, default_value = "0")]
        height: u64,

        /// Seed hash, hex (default: derived from the height's epoch)
        #[arg(long)]
        seed: Option<String>,

        /// Also check the hash against this difficulty
        #[arg(short, long)]
        difficulty: Option<u64>,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of hashes to compute
        #[arg(short, long, default_value = "1000")]
        count: u64,

        /// Number of threads to use (default: number of CPU cores)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Block height to hash at
        #[arg(long, default_value = "0")]
        height: u64,
    },

    /// Show the seed heights for a block height
    SeedHeight {
        /// Block height
        height: u64,
    },

    /// Print algorithm parameters
    Params,
}

fn main() {
    let cli = Cli::parse();

    let result = run(cli);

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    apply_overrides(&mut settings, &cli);
    settings.validate()?;

    init_logger(settings.log_level_filter().unwrap_or(LevelFilter::Info))?;

    match cli.command {
        Commands::Hash {
            header,
            height,
            seed,
            difficulty,
        } => cmd_hash(settings.engine, &header, height, seed.as_deref(), difficulty),
        Commands::Benchmark {
            count,
            threads,
            height,
        } => cmd_benchmark(settings.engine, count, threads, height),
        Commands::SeedHeight { height } => cmd_seed_height(height),
        Commands::Params => cmd_params(&settings.engine),
    }
}

fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(level) = &cli.log_level {
        settings.log_level = level.clone();
    }
    if let Some(items) = cli.dataset_items {
        settings.engine.dataset_items = items;
    }
    if let Some(threads) = cli.init_threads {
        settings.engine.init_threads = threads;
    }
    if cli.light {
        settings.engine.full_dataset = false;
    }
    if cli.no_large_pages {
        settings.engine.large_pages = false;
    }
}

fn cmd_hash(
    config: EngineConfig,
    header_hex: &str,
    height: u64,
    seed_hex: Option<&str>,
    difficulty: Option<u64>,
) -> anyhow::Result<()> {
    let header = hex::decode(header_hex.trim_start_matches("0x"))?;
    let seed: SeedHash = match seed_hex {
        Some(s) => s.trim_start_matches("0x").parse()?,
        None => epoch_seed_hash(epoch_number(height)),
    };

    let engine = Engine::new(config)?;
    let start = Instant::now();
    let result = engine.compute_hash(&seed, &header, height);

    println!("Seed:   {}", seed);
    println!("Height: {}", height);
    println!("Hash:   {}", hex::encode(result));
    log::debug!("Hash computed in {:.2?} including epoch build", start.elapsed());

    if let Some(difficulty) = difficulty {
        let passed = check_difficulty(&result, difficulty);
        println!(
            "Difficulty {}: {}",
            difficulty,
            if passed { "pass" } else { "fail" }
        );
    }

    Ok(())
}

fn cmd_benchmark(config: EngineConfig, count: u64, threads: Option<usize>, height: u64) -> anyhow::Result<()> {
    let num_threads = threads.unwrap_or_else(num_cpus::get).max(1);

    println!("Running benchmark with {} hashes on {} threads...", count, num_threads);

    let engine = Arc::new(Engine::new(config)?);
    let seed = epoch_seed_hash(epoch_number(height));

    let init_start = Instant::now();
    engine.set_main_seed_hash(&seed);
    let init_elapsed = init_start.elapsed();

    let per_thread = count / num_threads as u64;
    let remainder = count % num_threads as u64;

    let start = Instant::now();
    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let engine = Arc::clone(&engine);
            let hashes = per_thread + u64::from((t as u64) < remainder);
            thread::spawn(move || -> algorithm::Result<u64> {
                let mut worker = Worker::new(engine, MinerThreadTag(t as u32));
                worker.allocate_state()?;

                let mut header = [0u8; 40];
                header[..4].copy_from_slice(&(t as u32).to_le_bytes());
                for nonce in 0..hashes {
                    header[32..].copy_from_slice(&nonce.to_le_bytes());
                    worker.compute_hash(&seed, &header, height)?;
                }

                worker.free_state();
                Ok(hashes)
            })
        })
        .collect();

    let mut total = 0u64;
    for handle in handles {
        total += handle
            .join()
            .map_err(|_| anyhow::anyhow!("benchmark thread panicked"))??;
    }

    let elapsed = start.elapsed();
    let hashrate = total as f64 / elapsed.as_secs_f64();

    println!("\nResults:");
    println!("  Total hashes: {}", total);
    println!("  Epoch init: {:.2}s", init_elapsed.as_secs_f64());
    println!("  Time elapsed: {:.2}s", elapsed.as_secs_f64());
    println!("  Hashrate: {:.2} H/s", hashrate);
    println!("  Mode: {}", if engine.is_light() { "light" } else { "full" });
    println!("  Flags: {}", engine.flags());

    Ok(())
}

fn cmd_seed_height(height: u64) -> anyhow::Result<()> {
    let (current, next) = seed_heights(height);

    println!("Height: {}", height);
    println!("Epoch: {}", epoch_number(height));
    println!("Seed height: {}", current);
    println!("Next seed height: {}", next);

    Ok(())
}

fn cmd_params(config: &EngineConfig) -> anyhow::Result<()> {
    println!("Algorithm parameters (v{}):", algorithm::VERSION);
    println!("  Epoch length: {} blocks", algorithm::EPOCH_LENGTH);
    println!("  Period length: {} blocks", algorithm::PERIOD_LENGTH);
    println!("  Lanes: {}", algorithm::LANES);
    println!("  Registers per lane: {}", algorithm::REGS);
    println!("  Dataset loads per iteration: {}", algorithm::DAG_LOADS);
    println!("  Iterations: {}", algorithm::CNT_DAG);
    println!("  Cache ops per iteration: {}", algorithm::CNT_CACHE);
    println!("  Math ops per iteration: {}", algorithm::CNT_MATH);

    println!("\nMemory:");
    println!("  Cache: {} KB", config.cache_size / 1024);
    println!(
        "  Dataset: {} items, {} MB",
        config.dataset_items,
        config.dataset_items * algorithm::ITEM_SIZE / (1024 * 1024)
    );
    println!("  Full dataset: {}", config.full_dataset);
    println!("  Large pages: {}", config.large_pages);

    Ok(())
}
