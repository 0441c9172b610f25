//! The Olivetumhash mixing function.
//!
//! A 64-byte mix state seeded from `Keccak-512(sealHash || nonce)` is
//! stirred for a configured number of rounds. Each round performs three
//! dataset reads at indices derived from the mix lanes, a pseudo-random
//! program word and an evolving salt, making the access pattern depend on
//! all prior rounds. Every eighth round the program words are re-keyed
//! from a digest of the seed buffer.

use olivetum_types::{keccak256, keccak512, BlockNonce, H256};

const REFRESH_INTERVAL: u64 = 8;

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;
const SPLITMIX_C1: u64 = 0x517c_c1b7_2722_0a95;
const SPLITMIX_C2: u64 = 0x94d0_49bb_1331_11eb;
const XORSHIFT_MULT: u64 = 0x2545_f491_4f6c_dd1d;
const SHA_IV: u64 = 0x6a09_e667_f3bc_c908;

fn le_u64(bytes: &[u8]) -> u64 {
    u64::from_le_bytes(bytes.try_into().expect("8-byte slice"))
}

fn read_lanes(dataset: &[u8], chunk_index: u64) -> [u64; 8] {
    let offset = chunk_index as usize * 64;
    let chunk = &dataset[offset..offset + 64];
    let mut lanes = [0u64; 8];
    for (lane, bytes) in lanes.iter_mut().zip(chunk.chunks_exact(8)) {
        *lane = le_u64(bytes);
    }
    lanes
}

/// Computes `(mixDigest, finalDigest)` for a header hash and nonce over the
/// given epoch dataset.
pub fn olive_mix(
    header_hash: H256,
    nonce: BlockNonce,
    dataset: &[u8],
    rounds: u64,
) -> (H256, H256) {
    let hh = header_hash.as_bytes();
    let nb = nonce.as_bytes();

    let initial = keccak512(&[hh, nb]);
    let mut mix = initial;
    let mut mix_words = [0u64; 8];
    for (word, bytes) in mix_words.iter_mut().zip(initial.chunks_exact(8)) {
        *word = le_u64(bytes);
    }

    let chunk_count = ((dataset.len() / 64) as u64).max(1);

    // Pseudo-random operation schedule derived from the header and nonce.
    let second = keccak512(&[&initial, hh, nb]);
    let mut program = [0u64; 16];
    for (word, bytes) in program
        .iter_mut()
        .zip(initial.chunks_exact(8).chain(second.chunks_exact(8)))
    {
        *word = le_u64(bytes);
    }

    // The salt and the periodic program refresh couple rounds together,
    // making the access pattern hard to pipeline in hardware.
    let mut dynamic_salt = le_u64(&hh[8..16]) ^ le_u64(nb);

    for i in 0..rounds {
        if i != 0 && i % REFRESH_INTERVAL == 0 {
            // The refresh digests the mix buffer, which holds the seed state
            // until the lanes are repacked after the final round.
            let sum = keccak512(&[&mix, hh, nb]);
            for (j, word) in program.iter_mut().enumerate() {
                let offset = (j * 8) % sum.len();
                *word ^= le_u64(&sum[offset..offset + 8]);
            }
            dynamic_salt ^= le_u64(&sum[..8]);
        }

        let prog_word = program[(i % 16) as usize] ^ i.wrapping_mul(GOLDEN_GAMMA);
        let source_lane = ((prog_word >> 5) & 7) as usize;
        let rotate_amt = ((prog_word & 63) + 1) as u32;

        let mut index = mix_words[source_lane] ^ prog_word ^ le_u64(&hh[0..8]);
        index ^= i
            .wrapping_add(source_lane as u64)
            .wrapping_mul(SPLITMIX_C1);
        let chunk = read_lanes(dataset, index % chunk_count);

        // Second, differently indexed read to raise memory bandwidth pressure.
        let mut index2 = mix_words[(source_lane + 3) & 7]
            ^ prog_word
            ^ dynamic_salt
            ^ (i.rotate_left(source_lane as u32) & 0xffff);
        index2 ^= le_u64(&hh[16..24]);
        index2 ^= i
            .wrapping_add((source_lane * 3 + 1) as u64)
            .wrapping_mul(SPLITMIX_C2);
        let chunk2 = read_lanes(dataset, index2 % chunk_count);

        // Third read with a different stride, stressing random access further.
        let mut index3 =
            mix_words[(source_lane + 5) & 7] ^ dynamic_salt ^ prog_word ^ le_u64(&hh[24..32]);
        index3 ^= i
            .wrapping_mul(XORSHIFT_MULT)
            .wrapping_add((source_lane << 3) as u64);
        let chunk3 = read_lanes(dataset, index3 % chunk_count);

        for lane in 0..8 {
            let data1 = chunk[(lane + source_lane) & 7];
            let data2 = chunk2[(lane + (source_lane ^ 3)) & 7];
            let data3 = chunk3[(lane + (source_lane ^ 5)) & 7];
            mix_words[lane] ^= data1 ^ data3;
            mix_words[lane] = mix_words[lane]
                .wrapping_add(data1.wrapping_mul(GOLDEN_GAMMA))
                .wrapping_add(data2)
                .wrapping_add(data3.wrapping_mul(SHA_IV))
                .rotate_left(rotate_amt + (lane & 7) as u32);
            mix_words[lane] ^=
                (prog_word ^ dynamic_salt ^ data2 ^ data3).rotate_left(lane as u32 + 1);
        }

        // Evolve the salt from fresh mix state to perturb future indexing.
        dynamic_salt ^= mix_words[(source_lane + 1) & 7]
            .wrapping_add(mix_words[(source_lane + 2) & 7]);
        dynamic_salt = dynamic_salt.rotate_left(rotate_amt & 31);
    }

    for (lane, bytes) in mix_words.iter().zip(mix.chunks_exact_mut(8)) {
        bytes.copy_from_slice(&lane.to_le_bytes());
    }

    let mix_digest = keccak256(&[&mix]);
    let final_digest = keccak256(&[mix_digest.as_bytes(), hh, nb]);
    (mix_digest, final_digest)
}
