//! Proptest generators for property-based testing.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use ioverify_core::{seal, ChecksumAlgorithm, FileId, HistoryEntry, HEADER_SIZE};

/// Generate any algorithm, including `none`.
pub fn algorithm() -> impl Strategy<Value = ChecksumAlgorithm> {
    prop::sample::select(ChecksumAlgorithm::ALL.to_vec())
}

/// Generate an algorithm that produces a real digest.
pub fn sealing_algorithm() -> impl Strategy<Value = ChecksumAlgorithm> {
    prop::sample::select(ChecksumAlgorithm::SEALING.to_vec())
}

/// Generate a sealable unit length: a header plus up to `max_body` bytes.
pub fn unit_length(max_body: usize) -> impl Strategy<Value = usize> {
    HEADER_SIZE..=HEADER_SIZE + max_body
}

/// Generate a history entry on one of a few files.
pub fn history_entry() -> impl Strategy<Value = HistoryEntry> {
    (0u64..1 << 20, unit_length(4096), 0u32..4)
        .prop_map(|(offset, length, file)| HistoryEntry::new(offset, length, FileId(file)))
}

/// A step in a random sequence of history operations.
#[derive(Debug, Clone)]
pub enum HistoryOp {
    RecordOrdered(HistoryEntry),
    RecordSequential(HistoryEntry),
    Next,
}

/// Generate a history operation.
pub fn history_op() -> impl Strategy<Value = HistoryOp> {
    prop_oneof![
        history_entry().prop_map(HistoryOp::RecordOrdered),
        history_entry().prop_map(HistoryOp::RecordSequential),
        Just(HistoryOp::Next),
    ]
}

/// Parameters for sealing a buffer.
#[derive(Debug, Clone)]
pub struct SealParams {
    pub algorithm: ChecksumAlgorithm,
    pub length: usize,
    pub seed: u64,
}

impl Arbitrary for SealParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (sealing_algorithm(), unit_length(2048), any::<u64>())
            .prop_map(|(algorithm, length, seed)| SealParams {
                algorithm,
                length,
                seed,
            })
            .boxed()
    }
}

/// Seal a fresh buffer from parameters.
pub fn sealed_buffer(params: &SealParams) -> Vec<u8> {
    let mut buf = vec![0u8; params.length];
    let mut rng = StdRng::seed_from_u64(params.seed);
    // Lengths from `unit_length` always fit a header.
    if seal(&mut buf, params.algorithm, &mut rng).is_err() {
        buf.clear();
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use ioverify_core::{
        inspect, verify_payload, verify_payload_as, Checksums, CorruptionError, HistoryMode,
        WriteHistory,
    };
    use std::collections::HashMap;

    /// Remove one occurrence of `entry` from the multiset.
    fn take(entry: HistoryEntry, pending: &mut HashMap<HistoryEntry, usize>) -> bool {
        match pending.get_mut(&entry) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    proptest! {
        #[test]
        fn test_sealed_buffer_verifies(params: SealParams) {
            let buf = sealed_buffer(&params);
            prop_assert_eq!(buf.len(), params.length);
            prop_assert_eq!(verify_payload(&Checksums, &buf), Ok(params.algorithm));
        }

        #[test]
        fn test_sealing_is_deterministic(params: SealParams) {
            prop_assert_eq!(sealed_buffer(&params), sealed_buffer(&params));
        }

        #[test]
        fn test_body_bit_flip_is_detected(
            algorithm in sealing_algorithm(),
            length in unit_length(1024).prop_filter("needs a body", |&l| l > HEADER_SIZE),
            seed in any::<u64>(),
            pick in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let mut buf = sealed_buffer(&SealParams { algorithm, length, seed });
            let at = HEADER_SIZE + pick.index(length - HEADER_SIZE);
            buf[at] ^= 1 << bit;

            let err = verify_payload(&Checksums, &buf).unwrap_err();
            prop_assert!(err.is_digest_mismatch(), "{}: {:?}", algorithm, err);
        }

        #[test]
        fn test_header_tag_must_match_configured(
            params in any::<SealParams>(),
            configured in algorithm(),
        ) {
            let buf = sealed_buffer(&params);
            let result = verify_payload_as(&Checksums, &buf, configured);
            if configured == params.algorithm {
                prop_assert_eq!(result, Ok(params.algorithm));
            } else {
                prop_assert_eq!(
                    result,
                    Err(CorruptionError::AlgorithmMismatch {
                        expected: configured,
                        found: params.algorithm,
                    })
                );
            }
        }

        #[test]
        fn test_none_tag_never_verifies(params in any::<SealParams>(), body_mask in 1u8..=255) {
            let mut buf = sealed_buffer(&params);
            buf[8] = ChecksumAlgorithm::None.to_tag();
            if buf.len() > HEADER_SIZE {
                buf[HEADER_SIZE] ^= body_mask;
            }
            let rejected = Err(CorruptionError::UnknownAlgorithm { tag: 0 });
            prop_assert_eq!(verify_payload(&Checksums, &buf), rejected.clone());
            prop_assert_eq!(verify_payload_as(&Checksums, &buf, params.algorithm), rejected);
        }

        #[test]
        fn test_magic_damage_is_bad_magic(
            params in any::<SealParams>(),
            byte in 0usize..4,
            mask in 1u8..=255,
        ) {
            let mut buf = sealed_buffer(&params);
            buf[byte] ^= mask;
            let is_bad_magic = matches!(inspect(&buf), Err(CorruptionError::BadMagic { .. }));
            prop_assert!(is_bad_magic);
        }

        #[test]
        fn test_history_one_in_one_out(ops in prop::collection::vec(history_op(), 0..200)) {
            let mut history = WriteHistory::new(HistoryMode::Sequential);
            // Multiset of recorded entries not yet returned.
            let mut pending: HashMap<HistoryEntry, usize> = HashMap::new();
            let mut outstanding = 0usize;

            for op in ops {
                match op {
                    HistoryOp::RecordOrdered(entry) => {
                        history.record_ordered(entry);
                        *pending.entry(entry).or_default() += 1;
                        outstanding += 1;
                    }
                    HistoryOp::RecordSequential(entry) => {
                        history.record_sequential(entry);
                        *pending.entry(entry).or_default() += 1;
                        outstanding += 1;
                    }
                    HistoryOp::Next => {
                        let next = history.next();
                        prop_assert_eq!(next.is_some(), outstanding > 0);
                        if let Some(entry) = next {
                            prop_assert!(take(entry, &mut pending), "{} was never recorded or came back twice", entry);
                            outstanding -= 1;
                        }
                    }
                }
                prop_assert_eq!(history.len(), outstanding);
            }

            while outstanding > 0 {
                let next = history.next();
                prop_assert!(next.is_some(), "history ran dry with {} entries pending", outstanding);
                if let Some(entry) = next {
                    prop_assert!(take(entry, &mut pending), "{} was never recorded or came back twice", entry);
                }
                outstanding -= 1;
            }
            prop_assert!(pending.values().all(|&count| count == 0));
            prop_assert_eq!(history.next(), None);
        }

        #[test]
        fn test_ordered_history_is_sorted(entries in prop::collection::vec(history_entry(), 0..100)) {
            let mut history = WriteHistory::new(HistoryMode::Ordered);
            for entry in &entries {
                history.record(*entry);
            }
            let offsets: Vec<u64> = std::iter::from_fn(|| history.next()).map(|e| e.offset).collect();
            let mut sorted = offsets.clone();
            sorted.sort_unstable();
            prop_assert_eq!(offsets.len(), entries.len());
            prop_assert_eq!(offsets, sorted);
        }
    }
}
