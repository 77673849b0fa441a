// src/miner/worker.rs
//! Search worker thread implementation
//!
//! Each worker owns one sponge and one thread. It waits for round assignments,
//! scans the assigned nonce range on a private copy of the essence and reports
//! the best candidate of the round back to the orchestrator. Cancellation is
//! cooperative: the stop flag is polled before every candidate.

use crate::miner::scorer::{ScoredCandidate, score_candidate};
use crate::ternary::{HASH_LENGTH, Sponge, Trit, Tryte, normalized_bundle};
use crate::transaction::set_essence_nonce;
use crate::utils::error::MinerError;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, trace, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

/// Builds a fresh sponge for each worker
pub type SpongeFactory = Arc<dyn Fn() -> Box<dyn Sponge> + Send + Sync>;

/// One bounded batch of nonces handed to a worker
#[derive(Debug, Clone)]
pub struct RoundAssignment {
    /// Round number, taken from the orchestrator's counter
    pub round: u64,
    /// Session essence, shared read-only
    pub essence: Arc<[Trit]>,
    /// Session threshold vector, shared read-only
    pub thresholds: Arc<[Tryte]>,
    /// First nonce index of the round
    pub start_index: u64,
    /// Number of nonces to evaluate
    pub count: u64,
}

/// Messages from the orchestrator to a worker
#[derive(Debug)]
pub enum WorkerCommand {
    /// Search one round
    Start(RoundAssignment),
    /// Abandon any round and exit
    Stop,
}

/// Messages from a worker to the orchestrator
#[derive(Debug)]
pub enum WorkerReport {
    /// A round finished; `best` is `None` if no candidate was scoreable
    RoundComplete {
        /// Reporting worker
        worker: usize,
        /// Round that finished
        round: u64,
        /// Best candidate of the round
        best: Option<ScoredCandidate>,
        /// Candidates hashed during the round
        evaluated: u64,
    },
    /// Hashing failed; the worker has exited
    Failed {
        /// Reporting worker
        worker: usize,
        /// Underlying error
        error: MinerError,
    },
    /// The worker observed a stop request and exited
    Stopped {
        /// Reporting worker
        worker: usize,
    },
}

/// Lifecycle of a worker as seen by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting for an assignment
    Idle,
    /// Searching a round
    Running,
    /// Exited after a stop request (terminal)
    Stopped,
    /// Exited after a hashing failure (terminal)
    Failed,
}

impl WorkerState {
    /// Whether the worker thread can still take assignments
    pub fn is_alive(self) -> bool {
        matches!(self, WorkerState::Idle | WorkerState::Running)
    }
}

enum RoundOutcome {
    Complete {
        best: Option<ScoredCandidate>,
        evaluated: u64,
    },
    Cancelled,
}

/// Worker thread that searches nonce rounds
pub struct SearchWorker {
    /// Position in the orchestrator's pool
    id: usize,
    /// Sponge reused for every candidate
    sponge: Box<dyn Sponge>,
    /// Incoming commands
    commands: Receiver<WorkerCommand>,
    /// Outgoing reports
    reports: Sender<WorkerReport>,
    /// Set once the orchestrator requests a stop
    cancel: Arc<AtomicBool>,
    /// Optional sink for hashed-candidate counts
    hash_sender: Option<Sender<u64>>,
}

impl SearchWorker {
    /// Spawns a worker thread and returns the orchestrator's handle to it
    ///
    /// # Arguments
    /// * `id` - Worker index, echoed in every report
    /// * `sponge` - Sponge instance owned by the worker
    /// * `reports` - Channel for round results and lifecycle reports
    /// * `hash_sender` - Optional channel receiving candidates hashed per round
    pub fn spawn(
        id: usize,
        sponge: Box<dyn Sponge>,
        reports: Sender<WorkerReport>,
        hash_sender: Option<Sender<u64>>,
    ) -> Result<WorkerHandle, MinerError> {
        let (command_sender, commands) = crossbeam_channel::unbounded();
        let cancel = Arc::new(AtomicBool::new(false));

        let worker = SearchWorker {
            id,
            sponge,
            commands,
            reports,
            cancel: cancel.clone(),
            hash_sender,
        };

        let thread = std::thread::Builder::new()
            .name(format!("search-worker-{}", id))
            .spawn(move || worker.run())?;

        Ok(WorkerHandle {
            id,
            commands: command_sender,
            cancel,
            thread: Some(thread),
            state: WorkerState::Idle,
            stop_requested: false,
        })
    }

    fn run(mut self) {
        debug!("Worker {} started", self.id);

        while let Ok(command) = self.commands.recv() {
            let round = match command {
                WorkerCommand::Start(round) => round,
                WorkerCommand::Stop => break,
            };

            match self.search(&round) {
                Ok(RoundOutcome::Complete { best, evaluated }) => {
                    if let Some(sender) = &self.hash_sender {
                        let _ = sender.send(evaluated);
                    }
                    let report = WorkerReport::RoundComplete {
                        worker: self.id,
                        round: round.round,
                        best,
                        evaluated,
                    };
                    if self.reports.send(report).is_err() {
                        warn!("Worker {}: orchestrator went away", self.id);
                        return;
                    }
                }
                Ok(RoundOutcome::Cancelled) => {
                    debug!("Worker {} abandoned round {}", self.id, round.round);
                    break;
                }
                Err(error) => {
                    error!("Worker {} failed in round {}: {}", self.id, round.round, error);
                    let _ = self.reports.send(WorkerReport::Failed {
                        worker: self.id,
                        error,
                    });
                    return;
                }
            }

            if self.cancel.load(Ordering::Relaxed) {
                break;
            }
        }

        debug!("Worker {} stopped", self.id);
        let _ = self.reports.send(WorkerReport::Stopped { worker: self.id });
    }

    /// Scans one round.
    ///
    /// A candidate only competes if its match count is at least the best match
    /// count seen so far in the round; the lowest distance among those wins,
    /// the earliest index on ties. A candidate matching every position ends the
    /// round early.
    fn search(&mut self, round: &RoundAssignment) -> Result<RoundOutcome, MinerError> {
        let mut essence = round.essence.to_vec();
        let mut hash = [0 as Trit; HASH_LENGTH];
        let thresholds = &round.thresholds[..];

        let mut best: Option<ScoredCandidate> = None;
        let mut best_matches = 0;
        let mut evaluated = 0;

        let end = round.start_index.saturating_add(round.count);
        for index in round.start_index..end {
            if self.cancel.load(Ordering::Relaxed) {
                return Ok(RoundOutcome::Cancelled);
            }

            set_essence_nonce(&mut essence, index)?;
            self.sponge.absorb(&essence)?;
            self.sponge.squeeze(&mut hash)?;
            self.sponge.reset();
            evaluated += 1;

            let normalized = normalized_bundle(&hash);
            let Some(score) = score_candidate(&normalized, thresholds) else {
                continue;
            };
            if score.matches < best_matches {
                continue;
            }
            best_matches = score.matches;

            if best.as_ref().is_none_or(|b| score.distance < b.distance) {
                trace!(
                    "Worker {}: index {} distance {:.4}",
                    self.id, index, score.distance
                );
                best = Some(ScoredCandidate::new(index, score, &normalized));
            }

            if best_matches == thresholds.len() {
                debug!("Worker {}: index {} matches every position", self.id, index);
                break;
            }
        }

        Ok(RoundOutcome::Complete { best, evaluated })
    }
}

/// Orchestrator-side handle to a worker thread
pub struct WorkerHandle {
    id: usize,
    commands: Sender<WorkerCommand>,
    cancel: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    state: WorkerState,
    stop_requested: bool,
}

impl WorkerHandle {
    /// Last known lifecycle state
    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: WorkerState) {
        self.state = state;
    }

    /// Sends a round assignment and marks the worker running
    pub fn assign(&mut self, round: RoundAssignment) -> Result<(), MinerError> {
        self.commands.send(WorkerCommand::Start(round))?;
        self.state = WorkerState::Running;
        Ok(())
    }

    /// Signals the worker to abandon its round and exit.
    ///
    /// Returns `false` if a stop was already signalled; the worker sees at
    /// most one stop message.
    pub fn stop(&mut self) -> bool {
        if self.stop_requested {
            return false;
        }
        self.stop_requested = true;
        self.cancel.store(true, Ordering::Relaxed);
        let _ = self.commands.send(WorkerCommand::Stop);
        true
    }

    /// Whether a stop has been signalled
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// Waits for the worker thread to exit
    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Worker {} panicked", self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ternary::{Kerl, NORMALIZED_FRAGMENT_LENGTH, value_to_trits};
    use crate::transaction::TRANSACTION_ESSENCE_LENGTH;
    use std::time::Duration;

    /// Sponge that produces the same all-zero hash for every candidate
    struct ConstantSponge;

    impl Sponge for ConstantSponge {
        fn absorb(&mut self, _trits: &[Trit]) -> Result<(), MinerError> {
            Ok(())
        }
        fn squeeze(&mut self, trits: &mut [Trit]) -> Result<(), MinerError> {
            trits.fill(0);
            Ok(())
        }
        fn reset(&mut self) {}
    }

    /// Sponge that fails on first use
    struct BrokenSponge;

    impl Sponge for BrokenSponge {
        fn absorb(&mut self, _trits: &[Trit]) -> Result<(), MinerError> {
            Err(MinerError::HashError("broken".into()))
        }
        fn squeeze(&mut self, _trits: &mut [Trit]) -> Result<(), MinerError> {
            Ok(())
        }
        fn reset(&mut self) {}
    }

    /// Sponge that squeezes a fixed cycle of hashes, one per candidate
    struct ScriptedSponge {
        hashes: Vec<Vec<Trit>>,
        next: usize,
    }

    impl Sponge for ScriptedSponge {
        fn absorb(&mut self, _trits: &[Trit]) -> Result<(), MinerError> {
            Ok(())
        }
        fn squeeze(&mut self, trits: &mut [Trit]) -> Result<(), MinerError> {
            trits.copy_from_slice(&self.hashes[self.next % self.hashes.len()]);
            self.next += 1;
            Ok(())
        }
        fn reset(&mut self) {}
    }

    /// Hash whose first fragment holds `first` (zero-sum, so normalization
    /// keeps it) and whose other fragments are zero
    fn hash_with_first_fragment(first: &[(usize, Tryte)]) -> Vec<Trit> {
        let mut trytes = [0 as Tryte; HASH_LENGTH / 3];
        for &(position, value) in first {
            trytes[position] = value;
        }
        trytes
            .iter()
            .flat_map(|&tryte| {
                let mut trits = value_to_trits(i64::from(tryte));
                trits.resize(3, 0);
                trits
            })
            .collect()
    }

    /// Positions 0..5 only match non-positive trytes, the rest always match
    fn ratchet_thresholds() -> Vec<Tryte> {
        let mut thresholds = vec![0; NORMALIZED_FRAGMENT_LENGTH];
        thresholds[..5].fill(13);
        thresholds
    }

    fn scripted_round(hashes: Vec<Vec<Trit>>) -> ScoredCandidate {
        let (tx, rx) = crossbeam_channel::unbounded();
        let sponge = ScriptedSponge { hashes, next: 0 };
        let count = sponge.hashes.len() as u64;
        let mut handle = SearchWorker::spawn(0, Box::new(sponge), tx, None).unwrap();

        handle
            .assign(assignment(0, count, ratchet_thresholds()))
            .unwrap();
        let best = match recv(&rx) {
            WorkerReport::RoundComplete { best, evaluated, .. } => {
                assert_eq!(evaluated, count);
                best.unwrap()
            }
            other => panic!("unexpected report {:?}", other),
        };
        handle.stop();
        handle.join();
        best
    }

    #[test]
    fn test_fewer_matches_never_replace_best() {
        // 26 matches, four -1 trytes: distance sqrt(1 + 64)
        let wide = hash_with_first_fragment(&[(0, 4), (10, -1), (11, -1), (12, -1), (13, -1)]);
        // 25 matches, one -2 tryte: distance sqrt(4 + 1), lower but behind the ratchet
        let fewer = hash_with_first_fragment(&[(0, 1), (1, 1), (10, -2)]);

        let best = scripted_round(vec![wide, fewer]);
        assert_eq!(best.index, 0);
        assert_eq!(best.matches, 26);
        assert!((best.distance - 65f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_equal_matches_with_lower_distance_replace_best() {
        let wide = hash_with_first_fragment(&[(0, 4), (10, -1), (11, -1), (12, -1), (13, -1)]);
        let fewer = hash_with_first_fragment(&[(0, 1), (1, 1), (10, -2)]);
        // 26 matches again, one -2 tryte: distance sqrt(4 + 1)
        let tighter = hash_with_first_fragment(&[(0, 2), (10, -2)]);

        let best = scripted_round(vec![wide, fewer, tighter]);
        assert_eq!(best.index, 2);
        assert_eq!(best.matches, 26);
        assert!((best.distance - 5f64.sqrt()).abs() < 1e-9);
    }

    fn assignment(start_index: u64, count: u64, thresholds: Vec<Tryte>) -> RoundAssignment {
        RoundAssignment {
            round: 0,
            essence: vec![0; 4 * TRANSACTION_ESSENCE_LENGTH].into(),
            thresholds: thresholds.into(),
            start_index,
            count,
        }
    }

    fn recv(reports: &Receiver<WorkerReport>) -> WorkerReport {
        reports
            .recv_timeout(Duration::from_secs(30))
            .expect("worker report")
    }

    #[test]
    fn test_ties_keep_first_index() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut handle = SearchWorker::spawn(0, Box::new(ConstantSponge), tx, None).unwrap();

        // Thresholds above anything reachable so the all-zero hash never
        // matches every position and the round runs to the end.
        let thresholds = vec![14; 2 * NORMALIZED_FRAGMENT_LENGTH];
        handle.assign(assignment(500, 20, thresholds)).unwrap();

        match recv(&rx) {
            WorkerReport::RoundComplete {
                best, evaluated, ..
            } => {
                let best = best.unwrap();
                assert_eq!(best.index, 500);
                assert_eq!(best.distance, 0.0);
                assert_eq!(evaluated, 20);
            }
            other => panic!("unexpected report {:?}", other),
        }

        assert!(handle.stop());
        assert!(!handle.stop(), "second stop must not signal again");
        assert!(matches!(recv(&rx), WorkerReport::Stopped { worker: 0 }));
        handle.join();
    }

    #[test]
    fn test_perfect_match_ends_round() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut handle = SearchWorker::spawn(3, Box::new(ConstantSponge), tx, None).unwrap();

        handle
            .assign(assignment(0, 1000, vec![0; NORMALIZED_FRAGMENT_LENGTH]))
            .unwrap();

        match recv(&rx) {
            WorkerReport::RoundComplete {
                worker,
                best,
                evaluated,
                ..
            } => {
                assert_eq!(worker, 3);
                assert_eq!(best.unwrap().matches, NORMALIZED_FRAGMENT_LENGTH);
                assert_eq!(evaluated, 1);
            }
            other => panic!("unexpected report {:?}", other),
        }
        handle.stop();
        handle.join();
    }

    #[test]
    fn test_hash_failure_is_reported() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut handle = SearchWorker::spawn(1, Box::new(BrokenSponge), tx, None).unwrap();

        handle
            .assign(assignment(0, 10, vec![0; NORMALIZED_FRAGMENT_LENGTH]))
            .unwrap();

        match recv(&rx) {
            WorkerReport::Failed { worker, error } => {
                assert_eq!(worker, 1);
                assert!(matches!(error, MinerError::HashError(_)));
            }
            other => panic!("unexpected report {:?}", other),
        }
        handle.join();
    }

    #[test]
    fn test_stop_abandons_round() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let (hash_tx, hash_rx) = crossbeam_channel::unbounded();
        let mut handle = SearchWorker::spawn(0, Box::new(Kerl::new()), tx, Some(hash_tx)).unwrap();

        handle
            .assign(assignment(0, u64::MAX, vec![26; NORMALIZED_FRAGMENT_LENGTH]))
            .unwrap();
        std::thread::sleep(Duration::from_millis(20));
        handle.stop();

        assert!(matches!(recv(&rx), WorkerReport::Stopped { .. }));
        handle.join();
        assert!(hash_rx.try_recv().is_err(), "abandoned rounds report nothing");
    }
}
