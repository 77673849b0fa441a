// src/utils/logging.rs
//! Logger setup
//!
//! Lines go to stdout as `[ts level thread module:line] message`. Worker
//! threads are named `search-worker-N`, so the thread column tells rounds of
//! different workers apart. `RUST_LOG`, when set, replaces the default filter.

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Per-candidate worker output, kept out of normal mining logs
const WORKER_MODULE: &str = "bundle_miner::miner::worker";

/// Logging for `mine`: Info, with worker chatter limited to warnings
pub fn init_logging() {
    let mut builder = base_builder();
    if env::var("RUST_LOG").is_err() {
        builder
            .filter_level(LevelFilter::Info)
            .filter_module(WORKER_MODULE, LevelFilter::Warn);
    }
    install(builder);
}

/// Logging for `benchmark`: Debug everywhere except per-candidate traces
pub fn init_bench_logging() {
    let mut builder = base_builder();
    if env::var("RUST_LOG").is_err() {
        builder.filter_level(LevelFilter::Debug);
    }
    install(builder);
}

fn install(mut builder: Builder) {
    // Tests and embedding applications may have installed a logger already.
    if builder.try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}

fn base_builder() -> Builder {
    let mut builder = Builder::new();

    builder
        .format(|buf, record| {
            let ts = buf.timestamp_seconds();
            let thread = std::thread::current();

            writeln!(
                buf,
                "[{} {} {} {}:{}] {}",
                ts,
                record.level(),
                thread.name().unwrap_or("main"),
                record.module_path().unwrap_or_default(),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(Target::Stdout);

    if env::var("RUST_LOG").is_ok() {
        builder.parse_env("RUST_LOG");
    }

    builder
}
