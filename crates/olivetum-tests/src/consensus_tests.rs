//! Sealing and verification pipelines across consensus and mining.

use crate::harness::{cached_engine, small_engine, TestChain};
use olivetum_consensus::{difficulty_to_target, digest_meets_target, ConsensusError};
use olivetum_mining::CpuSealer;
use olivetum_params::RuntimeParams;
use olivetum_types::{BlockHeader, BlockNonce, U256};
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::sync_channel;
use std::sync::Arc;
use std::time::Duration;

fn mine_header(
    engine: &Arc<olivetum_consensus::Engine>,
    header: &mut BlockHeader,
) {
    let seal_hash = engine.seal_hash(header);
    let target = difficulty_to_target(header.difficulty);
    let epoch = engine.epoch_of(header.number);
    for nonce in 0..1u64 << 24 {
        let encoded = BlockNonce::encode(nonce);
        let (mix, digest) = engine.compute_seal(seal_hash, encoded, epoch);
        if digest_meets_target(digest, target) {
            header.nonce = encoded;
            header.mix_digest = mix;
            return;
        }
    }
    panic!("no nonce found at difficulty {}", header.difficulty);
}

#[test]
fn test_mine_and_verify_three_block_chain() {
    let runtime = Arc::new(RuntimeParams::new());
    let engine = small_engine(Arc::clone(&runtime));
    let chain = TestChain::new();

    let genesis = TestChain::genesis();
    chain.insert(&genesis);

    let mut parent = genesis;
    let mut batch = Vec::new();
    for _ in 0..3 {
        let mut header = BlockHeader {
            parent_hash: parent.hash(),
            number: parent.number + 1,
            time: parent.time + 15,
            gas_limit: parent.gas_limit,
            extra: b"mined".to_vec(),
            ..Default::default()
        };
        engine.prepare(chain.as_ref(), &mut header).unwrap();
        mine_header(&engine, &mut header);

        engine
            .verify_header_against(chain.as_ref(), &header, &parent, true, header.time)
            .unwrap();
        chain.insert(&header);
        batch.push(header.clone());
        parent = header;
    }

    // The same three headers verify as a batch, results in input order.
    let (_abort, results) = engine.verify_headers(
        Arc::clone(&chain) as Arc<dyn olivetum_consensus::ChainHeaderReader>,
        batch,
        vec![true, true, true],
    );
    for _ in 0..3 {
        results
            .recv_timeout(Duration::from_secs(60))
            .unwrap()
            .unwrap();
    }
}

#[test]
fn test_cpu_sealer_output_verifies() {
    let runtime = Arc::new(RuntimeParams::new());
    let engine = small_engine(Arc::clone(&runtime));
    engine.set_threads(2);
    let chain = TestChain::new();
    let genesis = TestChain::genesis();
    chain.insert(&genesis);

    let mut header = BlockHeader {
        parent_hash: genesis.hash(),
        number: 1,
        time: genesis.time + 15,
        gas_limit: genesis.gas_limit,
        ..Default::default()
    };
    engine.prepare(chain.as_ref(), &mut header).unwrap();
    // Keep the search fast regardless of the controller's output.
    header.difficulty = U256::from(16u64);

    let sealer = CpuSealer::new(Arc::clone(&engine));
    let (results_tx, results_rx) = sync_channel(1);
    sealer
        .seal(header, results_tx, Arc::new(AtomicBool::new(false)))
        .unwrap();

    let sealed = results_rx
        .recv_timeout(Duration::from_secs(60))
        .expect("sealing at difficulty 16 should finish quickly");
    engine.verify_seal(&sealed).unwrap();

    // A wrong nonce no longer verifies.
    let mut tampered = sealed;
    tampered.nonce = BlockNonce::encode(tampered.nonce.to_u64().wrapping_add(1));
    assert!(matches!(
        engine.verify_seal(&tampered),
        Err(ConsensusError::InvalidMixDigest) | Err(ConsensusError::InvalidPoW)
    ));
}

#[test]
fn test_dataset_survives_eviction_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = Arc::new(RuntimeParams::new());

    let first = {
        let engine = cached_engine(Arc::clone(&runtime), dir.path());
        engine.dataset(3).as_ref().clone()
    };
    // A fresh engine with the same cache dir loads identical bytes.
    let engine = cached_engine(runtime, dir.path());
    let second = engine.dataset(3);
    assert_eq!(first, *second.as_ref());
}

#[test]
fn test_target_scales_inversely_with_difficulty() {
    let easy = difficulty_to_target(U256::from(1u64));
    let hard = difficulty_to_target(U256::from(1u64) << 32u32);
    assert!(hard < easy);

    // A nonce valid at the easy target can fail the hard one.
    let runtime = Arc::new(RuntimeParams::new());
    let engine = small_engine(runtime);
    let header = TestChain::genesis();
    let seal_hash = engine.seal_hash(&header);
    let (_, digest) = engine.compute_seal(seal_hash, BlockNonce::encode(0), 0);
    assert!(digest_meets_target(digest, easy));
}
