//! Per-worker verification state.

use ioverify_core::{ChecksumAlgorithm, HistoryMode, WriteHistory};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::VerifyConfig;

/// Offsets are shuffled from a stream independent of the payload stream, so
/// the write order does not change payload contents.
const OFFSET_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// State owned by exactly one worker.
///
/// Holds the payload generator, the configured algorithm (fixed for the
/// worker's lifetime), and the worker's own write history.
#[derive(Debug, Clone)]
pub struct ThreadVerifyState {
    rng: StdRng,
    offset_rng: StdRng,
    algorithm: ChecksumAlgorithm,
    history: WriteHistory,
}

impl ThreadVerifyState {
    /// Create state with a seeded generator.
    pub fn new(algorithm: ChecksumAlgorithm, mode: HistoryMode, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            offset_rng: StdRng::seed_from_u64(seed ^ OFFSET_SEED_SALT),
            algorithm,
            history: WriteHistory::new(mode),
        }
    }

    /// State for worker `worker` of a job.
    pub fn from_config(config: &VerifyConfig, worker: usize) -> Self {
        Self::new(
            config.algorithm,
            config.pattern.history_mode(),
            config.worker_seed(worker),
        )
    }

    /// The configured algorithm.
    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    /// Whether verification is enabled.
    pub fn verifying(&self) -> bool {
        !self.algorithm.is_none()
    }

    /// Pending writes.
    pub fn history(&self) -> &WriteHistory {
        &self.history
    }

    /// Pending writes, mutably.
    pub fn history_mut(&mut self) -> &mut WriteHistory {
        &mut self.history
    }

    /// Payload generator.
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Offset-order generator.
    pub fn offset_rng_mut(&mut self) -> &mut StdRng {
        &mut self.offset_rng
    }

    /// Split borrow of the payload generator and the algorithm for sealing.
    pub(crate) fn seal_parts(&mut self) -> (ChecksumAlgorithm, &mut StdRng) {
        (self.algorithm, &mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = ThreadVerifyState::new(ChecksumAlgorithm::Crc32, HistoryMode::Sequential, 5);
        let mut b = ThreadVerifyState::new(ChecksumAlgorithm::Crc32, HistoryMode::Sequential, 5);
        assert_eq!(a.rng_mut().next_u64(), b.rng_mut().next_u64());
    }

    #[test]
    fn test_offset_stream_is_independent() {
        let mut state = ThreadVerifyState::new(ChecksumAlgorithm::Md5, HistoryMode::Ordered, 5);
        let payload = state.rng_mut().next_u64();
        let offset = state.offset_rng_mut().next_u64();
        assert_ne!(payload, offset);
    }

    #[test]
    fn test_from_config_uses_worker_seed() {
        let config = VerifyConfig {
            seed: 10,
            ..VerifyConfig::default()
        };
        let mut w0 = ThreadVerifyState::from_config(&config, 0);
        let mut w1 = ThreadVerifyState::from_config(&config, 1);
        let mut direct = ThreadVerifyState::new(config.algorithm, HistoryMode::Sequential, 11);
        assert_ne!(w0.rng_mut().next_u64(), w1.rng_mut().next_u64());

        let mut w1_again = ThreadVerifyState::from_config(&config, 1);
        assert_eq!(w1_again.rng_mut().next_u64(), direct.rng_mut().next_u64());
        assert!(w0.verifying());
    }
}
