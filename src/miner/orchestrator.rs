// src/miner/orchestrator.rs
//! Mining session orchestration
//!
//! The orchestrator owns the search state and the worker pool. It hands out
//! rounds of the nonce space on demand: every worker gets one round on
//! `start`, and a fresh one each time it reports back, until a round result
//! beats the caller's threshold or the session is stopped.
//!
//! All state changes happen on the thread that owns the [`BundleMiner`];
//! workers only see round assignments and only send back reports.

use crate::miner::essence::bundle_essence;
use crate::miner::scorer::ScoredCandidate;
use crate::miner::threshold::min_normalized_bundle;
use crate::miner::worker::{
    RoundAssignment, SearchWorker, SpongeFactory, WorkerHandle, WorkerReport, WorkerState,
};
use crate::ternary::{Kerl, Trit, Tryte};
use crate::types::SecurityLevel;
use crate::utils::error::MinerError;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long `run` waits for a report before re-checking its budget
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Inputs of a mining session
#[derive(Debug, Clone)]
pub struct MinerParams {
    /// Normalized bundle hashes already signed by the address
    pub normalized_bundles: Vec<Vec<Tryte>>,
    /// Sweep bundle, a whole number of transactions
    pub bundle: Vec<Trit>,
    /// Distance below which the search completes
    pub threshold: f64,
    /// Security level of the address (1, 2 or 3)
    pub security_level: u8,
    /// Size of the worker pool
    pub number_of_workers: usize,
    /// Nonces per round
    pub values_per_worker_round: u64,
}

impl MinerParams {
    /// Creates parameters with the default threshold (100), security level (2),
    /// a single worker and rounds of 1000 nonces
    pub fn new(normalized_bundles: Vec<Vec<Tryte>>, bundle: Vec<Trit>) -> Self {
        MinerParams {
            normalized_bundles,
            bundle,
            threshold: 100.0,
            security_level: SecurityLevel::default().into(),
            number_of_workers: 1,
            values_per_worker_round: 1000,
        }
    }
}

/// Observable session events
#[derive(Debug)]
pub enum MinerEvent {
    /// A round result improved on the best distance seen so far
    Data(ScoredCandidate),
    /// A round result beat the threshold; the session has stopped
    End(ScoredCandidate),
    /// A worker failed; the remaining workers keep searching
    Error(MinerError),
}

/// Orchestrator-owned search state
#[derive(Debug)]
struct SearchState {
    running: bool,
    /// Next unallocated round; never reused
    round_counter: u64,
    best_distance: f64,
    winner: Option<ScoredCandidate>,
}

/// Searches for a sweep-bundle nonce that minimizes new key exposure
pub struct BundleMiner {
    essence: Arc<[Trit]>,
    thresholds: Arc<[Tryte]>,
    threshold: f64,
    round_size: u64,
    worker_count: usize,
    sponge_factory: SpongeFactory,
    hash_sender: Option<Sender<u64>>,
    state: SearchState,
    workers: Vec<WorkerHandle>,
    /// Pools replaced by a restart; joined on drop
    retired: Vec<WorkerHandle>,
    report_sender: Sender<WorkerReport>,
    reports: Receiver<WorkerReport>,
    event_sender: Sender<MinerEvent>,
    events: Receiver<MinerEvent>,
}

impl BundleMiner {
    /// Validates the inputs and prepares a session hashing with Kerl
    ///
    /// # Errors
    /// `InvalidSecurityLevel`, `InvalidInputLength`, `InvalidBundleLength`, or
    /// `InputError` for a zero worker count or round size. Nothing is spawned
    /// when validation fails.
    pub fn new(params: MinerParams) -> Result<Self, MinerError> {
        Self::with_sponge(params, Arc::new(|| Box::new(Kerl::new())))
    }

    /// Same as [`BundleMiner::new`] with a custom sponge per worker
    pub fn with_sponge(
        params: MinerParams,
        sponge_factory: SpongeFactory,
    ) -> Result<Self, MinerError> {
        let security_level = SecurityLevel::try_from(params.security_level)?;

        if params.number_of_workers == 0 {
            return Err(MinerError::InputError(
                "number of workers must be at least 1".into(),
            ));
        }
        if params.values_per_worker_round == 0 {
            return Err(MinerError::InputError(
                "values per worker round must be at least 1".into(),
            ));
        }

        let thresholds = min_normalized_bundle(&params.normalized_bundles, security_level)?;
        let essence = bundle_essence(&params.bundle)?;

        let (report_sender, reports) = crossbeam_channel::unbounded();
        let (event_sender, events) = crossbeam_channel::unbounded();

        debug!(
            "Prepared session: {} signed bundles, security {}, {} trit essence",
            params.normalized_bundles.len(),
            security_level,
            essence.len()
        );

        Ok(BundleMiner {
            essence: essence.into(),
            thresholds: thresholds.into(),
            threshold: params.threshold,
            round_size: params.values_per_worker_round,
            worker_count: params.number_of_workers,
            sponge_factory,
            hash_sender: None,
            state: SearchState {
                running: false,
                round_counter: 0,
                best_distance: f64::INFINITY,
                winner: None,
            },
            workers: Vec::new(),
            retired: Vec::new(),
            report_sender,
            reports,
            event_sender,
            events,
        })
    }

    /// Routes per-round hash counts from workers spawned after this call
    pub fn set_hash_counter(&mut self, sender: Sender<u64>) {
        self.hash_sender = Some(sender);
    }

    /// Receiver for progress, completion and error events
    pub fn events(&self) -> Receiver<MinerEvent> {
        self.events.clone()
    }

    /// Whether the search is running
    pub fn is_running(&self) -> bool {
        self.state.running
    }

    /// Next unallocated round index.
    ///
    /// Persist this and pass it to [`BundleMiner::start`] to resume without
    /// rescanning earlier rounds.
    pub fn offset(&self) -> u64 {
        self.state.round_counter
    }

    /// Best distance reported so far in this session
    pub fn best_distance(&self) -> f64 {
        self.state.best_distance
    }

    /// Candidate that completed the search, if any
    pub fn winner(&self) -> Option<&ScoredCandidate> {
        self.state.winner.as_ref()
    }

    /// Thresholds derived from the signed bundles
    pub fn thresholds(&self) -> &[Tryte] {
        &self.thresholds
    }

    /// Lifecycle state of each worker in the current pool
    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.workers.iter().map(WorkerHandle::state).collect()
    }

    /// Starts searching, optionally resuming at round `offset`.
    ///
    /// Each worker receives one round. A pool that was stopped is replaced by
    /// fresh workers.
    ///
    /// # Errors
    /// `AlreadyRunning` if the search is running, `InputError` if the starting
    /// round lies beyond the `u64` nonce space.
    pub fn start(&mut self, offset: Option<u64>) -> Result<(), MinerError> {
        if self.state.running {
            return Err(MinerError::AlreadyRunning);
        }

        let first_round = offset.unwrap_or(self.state.round_counter);
        if self.round_start(first_round).is_none() {
            return Err(MinerError::InputError(format!(
                "round {} of {} values is beyond the nonce space",
                first_round, self.round_size
            )));
        }
        self.state.round_counter = first_round;

        if self.workers.is_empty() || self.workers.iter().any(WorkerHandle::is_stop_requested) {
            self.spawn_pool()?;
        }

        self.state.running = true;
        self.state.winner = None;
        info!(
            "Starting search at round {} with {} workers ({} values per round)",
            self.state.round_counter,
            self.workers.len(),
            self.round_size
        );

        for slot in 0..self.workers.len() {
            if self.state.running && self.workers[slot].state() == WorkerState::Idle {
                self.dispatch(slot);
            }
        }
        Ok(())
    }

    /// Stops searching; a no-op when already stopped
    pub fn stop(&mut self) {
        if !self.state.running {
            return;
        }
        self.state.running = false;

        for worker in &mut self.workers {
            worker.stop();
        }
        info!("Search stopped at round {}", self.state.round_counter);
    }

    /// Handles at most one worker report, waiting up to `timeout`.
    ///
    /// Returns `false` if no report arrived in time.
    pub fn process(&mut self, timeout: Duration) -> Result<bool, MinerError> {
        match self.reports.recv_timeout(timeout) {
            Ok(report) => {
                self.handle_report(report);
                Ok(true)
            }
            Err(RecvTimeoutError::Timeout) => Ok(false),
            Err(RecvTimeoutError::Disconnected) => Err(MinerError::ChannelError(
                "worker report channel closed".into(),
            )),
        }
    }

    /// Processes reports until the search completes or stops.
    ///
    /// With a `budget`, the search is stopped once that much time has passed.
    /// Returns the winning candidate, if the threshold was reached.
    pub fn run(&mut self, budget: Option<Duration>) -> Result<Option<ScoredCandidate>, MinerError> {
        let started = Instant::now();

        while self.state.running {
            if budget.is_some_and(|budget| started.elapsed() >= budget) {
                info!("Search budget exhausted at round {}", self.state.round_counter);
                self.stop();
                break;
            }
            self.process(POLL_INTERVAL)?;
        }

        Ok(self.state.winner.clone())
    }

    fn spawn_pool(&mut self) -> Result<(), MinerError> {
        // Reports of an old pool must never reach the new session.
        let (report_sender, reports) = crossbeam_channel::unbounded();
        self.report_sender = report_sender;
        self.reports = reports;
        self.retired.append(&mut self.workers);

        for id in 0..self.worker_count {
            let worker = SearchWorker::spawn(
                id,
                (self.sponge_factory)(),
                self.report_sender.clone(),
                self.hash_sender.clone(),
            )?;
            self.workers.push(worker);
        }
        debug!("Spawned {} workers", self.worker_count);
        Ok(())
    }

    /// First nonce of `round`, if the whole round fits in `u64`
    fn round_start(&self, round: u64) -> Option<u64> {
        round
            .checked_mul(self.round_size)
            .filter(|start| start.checked_add(self.round_size).is_some())
    }

    fn dispatch(&mut self, slot: usize) {
        let round = self.state.round_counter;
        let Some(start_index) = self.round_start(round) else {
            warn!("Nonce space exhausted at round {}", round);
            self.emit(MinerEvent::Error(MinerError::InputError(format!(
                "round {} of {} values is beyond the nonce space",
                round, self.round_size
            ))));
            self.stop();
            return;
        };
        self.state.round_counter += 1;

        let assignment = RoundAssignment {
            round,
            essence: self.essence.clone(),
            thresholds: self.thresholds.clone(),
            start_index,
            count: self.round_size,
        };

        debug!("Round {} -> worker {}", round, slot);
        if let Err(e) = self.workers[slot].assign(assignment) {
            self.workers[slot].set_state(WorkerState::Failed);
            self.fail_worker(slot, e.to_string());
        }
    }

    fn handle_report(&mut self, report: WorkerReport) {
        match report {
            WorkerReport::RoundComplete {
                worker,
                round,
                best,
                evaluated,
            } => {
                self.workers[worker].set_state(WorkerState::Idle);

                if !self.state.running {
                    debug!("Discarding round {} from worker {}", round, worker);
                    return;
                }
                debug!("Worker {} finished round {} ({} hashed)", worker, round, evaluated);

                if let Some(best) = best {
                    if best.distance < self.state.best_distance {
                        self.state.best_distance = best.distance;
                        info!(
                            "New best index {} with distance {:.4} ({} matching)",
                            best.index, best.distance, best.matches
                        );
                        self.emit(MinerEvent::Data(best.clone()));
                    }

                    if best.distance < self.threshold {
                        info!(
                            "Index {} reached threshold {} with distance {:.4}",
                            best.index, self.threshold, best.distance
                        );
                        self.state.winner = Some(best.clone());
                        self.emit(MinerEvent::End(best));
                        self.stop();
                        return;
                    }
                }

                self.dispatch(worker);
            }
            WorkerReport::Failed { worker, error } => {
                self.workers[worker].set_state(WorkerState::Failed);
                self.fail_worker(worker, error.to_string());
            }
            WorkerReport::Stopped { worker } => {
                self.workers[worker].set_state(WorkerState::Stopped);
                debug!("Worker {} confirmed stop", worker);
            }
        }
    }

    fn fail_worker(&mut self, worker: usize, reason: String) {
        error!("Worker {} failed: {}", worker, reason);
        self.emit(MinerEvent::Error(MinerError::WorkerFailure { worker, reason }));

        if self.state.running && !self.workers.iter().any(|w| w.state().is_alive()) {
            warn!("No workers left, stopping search");
            self.stop();
        }
    }

    fn emit(&self, event: MinerEvent) {
        // The miner holds a receiver, so the channel stays open.
        let _ = self.event_sender.send(event);
    }
}

impl Drop for BundleMiner {
    fn drop(&mut self) {
        self.stop();
        for worker in self.workers.iter_mut().chain(self.retired.iter_mut()) {
            worker.stop();
            worker.join();
        }
    }
}
