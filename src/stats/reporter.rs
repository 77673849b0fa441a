// src/stats/reporter.rs
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use sysinfo::System;

/// Statistics related to search throughput
#[derive(Debug, Clone, Default)]
pub struct MiningStats {
    /// Total number of candidates hashed
    pub hashes_total: u64,
    /// Number of rounds reported by workers
    pub rounds_completed: u64,
    /// Average candidates per second since the reporter was created
    pub avg_hashrate: f64,
}

/// Statistics related to hardware usage
#[derive(Debug, Clone)]
pub struct HardwareStats {
    /// Current CPU usage percentage (0-100)
    pub cpu_usage: f32,
    /// Memory currently in use (in bytes)
    pub memory_used: u64,
}

/// Collects and reports search and hardware statistics
pub struct StatsReporter {
    /// Atomic counters for search statistics
    stats: Arc<MiningStatsAtomic>,
    /// System information collector
    system: System,
    /// Interval at which stats are reported
    report_interval: Duration,
    /// Keeps the periodic reporting thread alive
    active: Arc<AtomicBool>,
}

/// Atomic version of MiningStats for thread-safe operations
struct MiningStatsAtomic {
    hashes: AtomicU64,
    rounds: AtomicU64,
    start_time: Instant,
}

impl StatsReporter {
    /// Creates a new StatsReporter with the specified reporting interval
    ///
    /// # Arguments
    /// * `report_interval` - How often to log statistics
    pub fn new(report_interval: Duration) -> Self {
        StatsReporter {
            stats: Arc::new(MiningStatsAtomic {
                hashes: AtomicU64::new(0),
                rounds: AtomicU64::new(0),
                start_time: Instant::now(),
            }),
            system: System::new_all(),
            report_interval,
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Creates and returns a channel sender for hash counts
    ///
    /// Each message is the number of candidates hashed in one worker round.
    /// The reporter listens for these on a background thread.
    pub fn hash_sender(&self) -> Sender<u64> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.start_hashrate_listener(rx);
        tx
    }

    /// Gets the current search statistics
    pub fn get_stats(&self) -> MiningStats {
        snapshot(&self.stats)
    }

    /// Gets the current hardware statistics
    ///
    /// This refreshes system information before returning the stats.
    pub fn get_hardware_stats(&mut self) -> HardwareStats {
        hardware_snapshot(&mut self.system)
    }

    /// Starts the periodic reporting of statistics
    ///
    /// This spawns a background thread that logs stats at the configured
    /// interval until [`StatsReporter::stop_reporting`] is called.
    pub fn start_reporting(&self) {
        let stats = self.stats.clone();
        let interval = self.report_interval;
        let active = self.active.clone();

        std::thread::spawn(move || {
            let mut system = System::new_all();

            while active.load(Ordering::Relaxed) {
                std::thread::sleep(interval);
                if !active.load(Ordering::Relaxed) {
                    break;
                }
                let mining_stats = snapshot(&stats);
                let hw_stats = hardware_snapshot(&mut system);

                log::info!(
                    "Hashrate: {:.2} H/s | Hashed: {} | Rounds: {} | CPU: {:.1}% | Mem: {} MiB",
                    mining_stats.avg_hashrate,
                    mining_stats.hashes_total,
                    mining_stats.rounds_completed,
                    hw_stats.cpu_usage,
                    hw_stats.memory_used / (1024 * 1024)
                );
            }
        });
    }

    /// Stops the periodic reporting thread after its current sleep
    pub fn stop_reporting(&self) {
        self.active.store(false, Ordering::Relaxed);
    }

    /// Starts a listener for hash counts on a background thread
    fn start_hashrate_listener(&self, receiver: Receiver<u64>) {
        let stats = self.stats.clone();

        std::thread::spawn(move || {
            for count in receiver {
                stats.hashes.fetch_add(count, Ordering::Relaxed);
                stats.rounds.fetch_add(1, Ordering::Relaxed);
            }
        });
    }
}

fn snapshot(stats: &MiningStatsAtomic) -> MiningStats {
    let total_seconds = stats.start_time.elapsed().as_secs_f64();
    let hashes = stats.hashes.load(Ordering::Relaxed);

    MiningStats {
        hashes_total: hashes,
        rounds_completed: stats.rounds.load(Ordering::Relaxed),
        avg_hashrate: if total_seconds > 0.0 {
            hashes as f64 / total_seconds
        } else {
            0.0
        },
    }
}

fn hardware_snapshot(system: &mut System) -> HardwareStats {
    system.refresh_cpu_all();
    system.refresh_memory();

    let cpus = system.cpus();
    let cpu_usage = if cpus.is_empty() {
        0.0
    } else {
        cpus.iter().map(|c| c.cpu_usage()).sum::<f32>() / cpus.len() as f32
    };

    HardwareStats {
        cpu_usage,
        memory_used: system.used_memory(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_counts_accumulate() {
        let reporter = StatsReporter::new(Duration::from_secs(60));
        let sender = reporter.hash_sender();
        sender.send(1000).unwrap();
        sender.send(250).unwrap();
        drop(sender);

        let deadline = Instant::now() + Duration::from_secs(5);
        while reporter.get_stats().rounds_completed < 2 {
            assert!(Instant::now() < deadline, "listener did not drain");
            std::thread::sleep(Duration::from_millis(5));
        }
        let stats = reporter.get_stats();
        assert_eq!(stats.hashes_total, 1250);
        assert!(stats.avg_hashrate > 0.0);
    }
}
