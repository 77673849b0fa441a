use bundle_miner::miner::{MinerEvent, MinerParams};
use bundle_miner::ternary::{Tryte, normalized_bundle, trytes_to_trits};
use bundle_miner::transaction::{TRANSACTION_LENGTH, obsolete_tag_trytes};
use bundle_miner::{BundleMiner, MinerError};
use std::time::Duration;

const SIGNED_BUNDLE_HASHES: [&str; 2] = [
    "QVXRKNRXFZIPFPREXRAPNHNSRFFQOWBGCAFZEGFCKDPDXRNVZQ9VJPQPPTFXKPVZVAIENQLETXRVSFKFO",
    "JKHLAKTRTDIKMTERIRYEWI9PPOJAKHZEMNCXFB9GTRZRWKSFVAZANHSPABGGQIJAVULKMPPAL9VBSRB9E",
];

fn signed_bundles() -> Vec<Vec<Tryte>> {
    SIGNED_BUNDLE_HASHES
        .iter()
        .map(|hash| normalized_bundle(&trytes_to_trits(hash).unwrap()).to_vec())
        .collect()
}

fn sweep_params() -> MinerParams {
    MinerParams {
        threshold: 100.0,
        security_level: 2,
        number_of_workers: 2,
        values_per_worker_round: 1000,
        ..MinerParams::new(signed_bundles(), vec![0; TRANSACTION_LENGTH * 4])
    }
}

#[test]
fn finds_index_for_zero_sweep_bundle() {
    let mut miner = BundleMiner::new(sweep_params()).unwrap();
    let events = miner.events();
    assert_eq!(miner.thresholds().len(), 54);

    miner.start(None).unwrap();
    let winner = miner
        .run(Some(Duration::from_secs(600)))
        .unwrap()
        .expect("search should reach the threshold");

    assert_eq!(winner.index, 4091);
    assert!(winner.distance < 100.0);
    assert!(!miner.is_running());
    assert_eq!(obsolete_tag_trytes(winner.index).unwrap().len(), 27);

    let events: Vec<MinerEvent> = events.try_iter().collect();
    let ends: Vec<u64> = events
        .iter()
        .filter_map(|event| match event {
            MinerEvent::End(candidate) => Some(candidate.index),
            _ => None,
        })
        .collect();
    assert_eq!(ends, vec![4091]);

    let mut last = f64::INFINITY;
    for event in &events {
        match event {
            MinerEvent::Data(candidate) => {
                assert!(candidate.distance < last);
                last = candidate.distance;
            }
            MinerEvent::Error(e) => panic!("unexpected error event: {}", e),
            MinerEvent::End(_) => {}
        }
    }
}

#[test]
fn rejects_short_signed_bundle() {
    let mut params = sweep_params();
    params.normalized_bundles[1].truncate(40);

    assert!(matches!(
        BundleMiner::new(params),
        Err(MinerError::InvalidInputLength(_))
    ));
}

#[test]
fn rejects_invalid_security_level() {
    let mut params = sweep_params();
    params.security_level = 4;

    assert!(matches!(
        BundleMiner::new(params),
        Err(MinerError::InvalidSecurityLevel(4))
    ));
}

#[test]
fn rejects_partial_transaction_bundle() {
    let mut params = sweep_params();
    params.bundle.truncate(TRANSACTION_LENGTH + 1);

    assert!(matches!(
        BundleMiner::new(params),
        Err(MinerError::InvalidBundleLength(len)) if len == TRANSACTION_LENGTH + 1
    ));
}
