//! Recovery guarantees of the public `encode`/`decode` pair.

use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use shardvault::codec::generator::build_generator;
use shardvault::{Codec, ErasureError, ErasureParams, decode, encode};

const FOX: &[u8] = b"Secret message: The quick brown fox jumps over the lazy dog";

/// Every ascending `k`-subset of `0..n`.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut cur = Vec::with_capacity(k);
    fn go(start: usize, n: usize, k: usize, cur: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if cur.len() == k {
            out.push(cur.clone());
            return;
        }
        for i in start..n {
            cur.push(i);
            go(i + 1, n, k, cur, out);
            cur.pop();
        }
    }
    go(0, n, k, &mut cur, &mut out);
    out
}

fn sample_data(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 + 7) as u8).collect()
}

#[test]
fn test_three_of_seven_scenario() {
    let data = sample_data(565);
    let enc = encode(&data, 3, 7).unwrap();
    assert_eq!(enc.shards.len(), 7);

    assert_eq!(decode(&enc.select(&[0, 1, 2]), &enc.metadata).unwrap(), data);

    // All four parity shards presented, and every 3 of them on their own.
    assert_eq!(decode(&enc.select(&[3, 4, 5, 6]), &enc.metadata).unwrap(), data);
    for subset in combinations(4, 3) {
        let indices: Vec<usize> = subset.iter().map(|i| i + 3).collect();
        assert_eq!(
            decode(&enc.select(&indices), &enc.metadata).unwrap(),
            data,
            "indices {indices:?}"
        );
    }

    assert_eq!(
        decode(&enc.select(&[2, 5]), &enc.metadata),
        Err(ErasureError::InsufficientShards { needed: 3, got: 2 })
    );
}

#[test]
fn test_pure_parity_equals_pure_data() {
    assert_eq!(FOX.len(), 59);
    let enc = encode(FOX, 4, 8).unwrap();
    let from_parity = decode(&enc.select(&[4, 5, 6, 7]), &enc.metadata).unwrap();
    let from_data = decode(&enc.select(&[0, 1, 2, 3]), &enc.metadata).unwrap();
    assert_eq!(from_parity, from_data);
    assert_eq!(from_data, FOX);
    assert_eq!(enc.metadata.block_size, 15);
    assert_eq!(enc.metadata.padding, 1);
}

#[test]
fn test_every_k_rows_of_generator_are_invertible() {
    for (k, n) in [(2, 4), (3, 7), (4, 8), (5, 9)] {
        let g = build_generator(k, n).unwrap();
        for subset in combinations(n, k) {
            let sub = g.select_rows(&subset).unwrap();
            assert!(sub.invert().is_ok(), "k={k} n={n} rows {subset:?}");
        }
    }
}

#[test]
fn test_every_subset_recovers() {
    for (k, n) in [(1, 3), (2, 5), (3, 6), (4, 8)] {
        let data = sample_data(101);
        let enc = encode(&data, k, n).unwrap();
        for subset in combinations(n, k) {
            assert_eq!(
                decode(&enc.select(&subset), &enc.metadata).unwrap(),
                data,
                "k={k} n={n} subset {subset:?}"
            );
        }
    }
}

#[test]
fn test_one_below_threshold_always_fails() {
    let (k, n) = (4, 7);
    let enc = encode(FOX, k, n).unwrap();
    for subset in combinations(n, k - 1) {
        assert_eq!(
            decode(&enc.select(&subset), &enc.metadata),
            Err(ErasureError::InsufficientShards { needed: k, got: k - 1 })
        );
    }
}

#[test]
fn test_encoding_is_deterministic() {
    let a = encode(FOX, 5, 9).unwrap();
    let b = encode(FOX, 5, 9).unwrap();
    assert_eq!(a.metadata, b.metadata);
    assert_eq!(a.shards, b.shards);
}

#[test]
fn test_bit_flip_in_used_shard_is_detected() {
    let data = sample_data(300);
    let (k, n) = (3, 6);
    let enc = encode(&data, k, n).unwrap();

    for subset in combinations(n, k) {
        for &victim in &subset {
            let mut shards: Vec<Vec<u8>> =
                subset.iter().map(|&i| enc.shards[i].data.clone()).collect();
            let pos = subset.iter().position(|&i| i == victim).unwrap();
            shards[pos][17] ^= 0x04;

            let presented: Vec<(usize, &[u8])> = subset
                .iter()
                .zip(&shards)
                .map(|(&i, s)| (i, s.as_slice()))
                .collect();
            assert!(
                matches!(
                    decode(&presented, &enc.metadata),
                    Err(ErasureError::IntegrityMismatch { .. })
                ),
                "subset {subset:?} victim {victim}"
            );
        }
    }
}

#[test]
fn test_bit_flip_in_unused_excess_shard_is_ignored() {
    let data = sample_data(300);
    let enc = encode(&data, 3, 6).unwrap();
    let mut tampered = enc.shards[5].data.clone();
    tampered[0] ^= 0x80;

    // 0, 2, 4 are the lowest three, so 5 is never read.
    let presented = vec![
        (5, tampered.as_slice()),
        (0, enc.shards[0].data.as_slice()),
        (4, enc.shards[4].data.as_slice()),
        (2, enc.shards[2].data.as_slice()),
    ];
    assert_eq!(decode(&presented, &enc.metadata).unwrap(), data);
}

#[test]
fn test_rejects_bad_indices() {
    let enc = encode(FOX, 2, 4).unwrap();
    let s = enc.shards[0].data.as_slice();

    assert_eq!(
        decode(&[(0, s), (0, s)], &enc.metadata),
        Err(ErasureError::DuplicateOrOutOfRangeIndex { index: 0, total: 4 })
    );
    assert_eq!(
        decode(&[(0, s), (4, s)], &enc.metadata),
        Err(ErasureError::DuplicateOrOutOfRangeIndex { index: 4, total: 4 })
    );

    // Selecting an index that was never produced surfaces the index, not a count.
    let selected = enc.select(&[0, 9]);
    assert_eq!(selected.len(), 2);
    assert_eq!(
        decode(&selected, &enc.metadata),
        Err(ErasureError::DuplicateOrOutOfRangeIndex { index: 9, total: 4 })
    );
}

#[test]
fn test_rejects_bad_parameters_before_work() {
    for (k, n) in [(0, 3), (4, 3), (10, 256)] {
        assert!(
            matches!(encode(FOX, k, n), Err(ErasureError::InvalidParameters { .. })),
            "k={k} n={n}"
        );
    }
}

#[test]
fn test_edge_inputs() {
    // Empty input, a single byte, and k = n (no parity at all).
    let enc = encode(b"", 3, 5).unwrap();
    assert!(enc.shards.iter().all(|s| s.data.is_empty()));
    assert_eq!(decode(&enc.select(&[1, 3, 4]), &enc.metadata).unwrap(), b"");

    let enc = encode(b"x", 4, 6).unwrap();
    assert_eq!(enc.metadata.block_size, 1);
    assert_eq!(enc.metadata.padding, 3);
    assert_eq!(decode(&enc.select(&[2, 3, 4, 5]), &enc.metadata).unwrap(), b"x");

    let enc = encode(FOX, 3, 3).unwrap();
    assert_eq!(decode(&enc.pairs(), &enc.metadata).unwrap(), FOX);
}

#[test]
fn test_metadata_survives_json() {
    let enc = encode(FOX, 4, 8).unwrap();
    let json = serde_json::to_string(&enc.metadata).unwrap();
    let metadata = serde_json::from_str(&json).unwrap();
    assert_eq!(decode(&enc.select(&[1, 5, 6, 7]), &metadata).unwrap(), FOX);
}

#[test]
fn test_wide_code_at_field_limit() {
    let data = sample_data(5000);
    let codec = Codec::new(ErasureParams::new(20, 255).unwrap()).unwrap();
    let enc = codec.encode(&data).unwrap();
    let tail: Vec<usize> = (235..255).collect();
    assert_eq!(codec.decode(&enc.select(&tail), &enc.metadata).unwrap(), data);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_random_k_subset_round_trips(
        data in proptest::collection::vec(any::<u8>(), 0..600),
        k in 1usize..8,
        extra in 0usize..6,
        seed in any::<u64>(),
    ) {
        let n = k + extra;
        let enc = encode(&data, k, n).unwrap();

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));
        let subset = &order[..k];

        prop_assert_eq!(decode(&enc.select(subset), &enc.metadata).unwrap(), data);
    }
}
