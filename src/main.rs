// src/main.rs
use bundle_miner::miner::MinerEvent;
use bundle_miner::ternary::NORMALIZED_BUNDLE_LENGTH;
use bundle_miner::transaction::{TRANSACTION_LENGTH, obsolete_tag_trytes};
use bundle_miner::utils::init_bench_logging;
use bundle_miner::{self, *};
use clap::Parser;
use crossbeam_channel::Receiver;
use std::path::Path;
use std::time::{Duration, Instant};

/// How long the mining loop waits for a report between budget checks
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Transactions in the synthetic benchmark bundle
const BENCH_BUNDLE_TRANSACTIONS: usize = 4;

/// Main entry point for the bundle miner
///
/// # Returns
/// - `Ok(())` on successful execution
/// - `Err(MinerError)` if any operation fails
///
/// # Flow
/// 1. Parses command line arguments
/// 2. Delegates to appropriate subcommand handler
/// 3. Propagates any errors upward
fn main() -> Result<(), MinerError> {
    let cli = cli::Commands::parse();

    match cli.action {
        cli::Action::Mine(opts) => start_mining(opts),
        cli::Action::Benchmark(opts) => run_benchmark(opts),
        cli::Action::Config(opts) => generate_config(opts),
    }
}

/// Runs a mining session with the given options
///
/// # Operations
/// 1. Initializes logging
/// 2. Loads the configuration and resolves the start offset
/// 3. Sets up statistics reporting
/// 4. Drives the miner until it completes, stops or exhausts its budget
/// 5. Prints the winning candidate as a JSON line
fn start_mining(opts: cli::MineOptions) -> Result<(), MinerError> {
    utils::init_logging();

    let mut config = config::load(&opts.config)?;
    // Apply CLI overrides
    if let Some(workers) = opts.workers {
        config.worker_threads = workers;
    }

    let offset = match (opts.offset, opts.resume) {
        (Some(offset), _) => Some(offset),
        (None, true) => {
            let path = config.checkpoint.as_deref().ok_or_else(|| {
                MinerError::ConfigError("--resume needs a checkpoint file in the config".into())
            })?;
            let offset = config::read_checkpoint(path)?;
            if offset.is_none() {
                log::warn!("No checkpoint at {}, starting from round 0", path.display());
            }
            offset
        }
        (None, false) => None,
    };

    let mut miner = BundleMiner::new(config.to_params()?)?;

    // Statistics reporting
    let reporter = stats::StatsReporter::new(Duration::from_secs(60));
    miner.set_hash_counter(reporter.hash_sender());
    reporter.start_reporting();

    let events = miner.events();
    miner.start(offset)?;

    let started = Instant::now();
    let timeout = opts.timeout.map(Duration::from_secs);
    let mut saved_offset = None;

    while miner.is_running() {
        if timeout.is_some_and(|timeout| started.elapsed() >= timeout) {
            log::info!("Timeout reached after {}s", started.elapsed().as_secs());
            miner.stop();
            break;
        }
        if opts.max_rounds.is_some_and(|max| miner.offset() >= max) {
            log::info!("Round limit reached at round {}", miner.offset());
            miner.stop();
            break;
        }

        miner.process(POLL_INTERVAL)?;
        drain_events(&events);

        if let Some(path) = config.checkpoint.as_deref() {
            saved_offset = save_checkpoint(path, miner.offset(), saved_offset)?;
        }
    }
    drain_events(&events);
    if let Some(path) = config.checkpoint.as_deref() {
        save_checkpoint(path, miner.offset(), saved_offset)?;
    }

    reporter.stop_reporting();
    let stats = reporter.get_stats();
    log::info!(
        "Hashed {} candidates in {:.1}s ({:.2} H/s)",
        stats.hashes_total,
        started.elapsed().as_secs_f64(),
        stats.avg_hashrate
    );

    match miner.winner() {
        Some(winner) => {
            let output = serde_json::json!({
                "index": winner.index,
                "obsolete_tag": obsolete_tag_trytes(winner.index)?,
                "distance": winner.distance,
                "matches": winner.matches,
                "means": winner.means,
            });
            println!("{}", serde_json::to_string(&output)?);
        }
        None => log::warn!(
            "No candidate below threshold {} (best distance {:.4}), resume at round {}",
            config.threshold,
            miner.best_distance(),
            miner.offset()
        ),
    }

    Ok(())
}

/// Runs throughput benchmarks against a zero bundle
///
/// # Operations
/// 1. Initializes benchmark-specific logging
/// 2. Builds a session whose threshold can never be reached
/// 3. Searches for the requested duration
/// 4. Reports performance statistics
fn run_benchmark(opts: cli::BenchmarkOptions) -> Result<(), MinerError> {
    init_bench_logging();

    let params = MinerParams {
        threshold: -1.0,
        number_of_workers: opts.threads,
        ..MinerParams::new(
            vec![vec![0; NORMALIZED_BUNDLE_LENGTH]],
            vec![0; BENCH_BUNDLE_TRANSACTIONS * TRANSACTION_LENGTH],
        )
    };
    let mut miner = BundleMiner::new(params)?;

    let mut reporter = stats::StatsReporter::new(Duration::from_secs(5));
    miner.set_hash_counter(reporter.hash_sender());
    reporter.start_reporting();

    log::info!(
        "Starting benchmark for {} seconds on {} threads",
        opts.duration,
        opts.threads
    );
    log::logger().flush();

    miner.start(None)?;
    miner.run(Some(Duration::from_secs(opts.duration)))?;
    reporter.stop_reporting();

    // Report final results
    let stats = reporter.get_stats();
    let hardware = reporter.get_hardware_stats();
    log::info!("Benchmark results:");
    log::info!("Total hashes: {}", stats.hashes_total);
    log::info!("Rounds completed: {}", stats.rounds_completed);
    log::info!("Average hashrate: {:.2} H/s", stats.avg_hashrate);
    log::info!(
        "CPU: {:.1}% | Mem: {} MiB",
        hardware.cpu_usage,
        hardware.memory_used / (1024 * 1024)
    );
    log::logger().flush(); // Ensure final results appear

    Ok(())
}

/// Generates configuration template file
///
/// # Operations
/// 1. Generates template content
/// 2. Writes template to specified output file
fn generate_config(opts: cli::ConfigOptions) -> Result<(), MinerError> {
    let config = config::generate_template();
    std::fs::write(&opts.output, config)?;
    println!("Wrote config template to {}", opts.output.display());
    Ok(())
}

/// Logs every pending session event
fn drain_events(events: &Receiver<MinerEvent>) {
    for event in events.try_iter() {
        match event {
            MinerEvent::Data(candidate) => log::info!(
                "Progress: index {} distance {:.4}",
                candidate.index,
                candidate.distance
            ),
            MinerEvent::End(candidate) => log::info!(
                "Found index {} with distance {:.4}",
                candidate.index,
                candidate.distance
            ),
            MinerEvent::Error(e) => log::error!("{}", e),
        }
    }
}

/// Writes the offset if it changed since the last save
fn save_checkpoint(
    path: &Path,
    offset: u64,
    saved: Option<u64>,
) -> Result<Option<u64>, MinerError> {
    if saved != Some(offset) {
        config::write_checkpoint(path, offset)?;
    }
    Ok(Some(offset))
}
