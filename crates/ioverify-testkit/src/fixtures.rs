//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ioverify::{ThreadVerifyState, Verifier};
use ioverify_core::{ChecksumAdapter, ChecksumAlgorithm, Checksums, Digest, FileId, HistoryMode};
use ioverify_store::MemoryBackend;

/// Default unit size for fixtures.
pub const FIXTURE_BLOCK: usize = 512;

/// An in-memory backend with one file sized for `blocks` units.
pub struct TestFixture {
    pub backend: Arc<MemoryBackend>,
    pub file: FileId,
    pub algorithm: ChecksumAlgorithm,
    pub blocks: u64,
}

impl TestFixture {
    /// Create a fixture whose file holds `blocks` units of [`FIXTURE_BLOCK`] bytes.
    pub fn new(algorithm: ChecksumAlgorithm, blocks: u64) -> Self {
        let backend = Arc::new(MemoryBackend::new());
        let size = blocks * FIXTURE_BLOCK as u64;
        let file = match backend.add_file("fixture", size) {
            Ok(file) => file,
            Err(e) => panic!("fixture file: {e}"),
        };
        Self {
            backend,
            file,
            algorithm,
            blocks,
        }
    }

    /// A verifier with the standard adapter, sequential history, and `seed`.
    pub fn verifier(&self, seed: u64) -> Verifier<MemoryBackend> {
        Verifier::new(0, self.state(seed), Arc::clone(&self.backend))
    }

    /// A verifier that counts digest computations.
    pub fn counting_verifier(&self, seed: u64) -> Verifier<MemoryBackend, CountingChecksums> {
        Verifier::with_adapter(
            0,
            self.state(seed),
            Arc::clone(&self.backend),
            CountingChecksums::default(),
        )
    }

    fn state(&self, seed: u64) -> ThreadVerifyState {
        ThreadVerifyState::new(self.algorithm, HistoryMode::Sequential, seed)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new(ChecksumAlgorithm::default(), 8)
    }
}

/// Checksum adapter that counts how often each operation runs.
#[derive(Debug, Default)]
pub struct CountingChecksums {
    fills: AtomicUsize,
    verifies: AtomicUsize,
}

impl CountingChecksums {
    /// Digest computations, including those made by `verify`.
    pub fn fills(&self) -> usize {
        self.fills.load(Ordering::SeqCst)
    }

    /// Verification calls.
    pub fn verifies(&self) -> usize {
        self.verifies.load(Ordering::SeqCst)
    }
}

impl ChecksumAdapter for CountingChecksums {
    fn fill(&self, algorithm: ChecksumAlgorithm, body: &[u8]) -> Digest {
        self.fills.fetch_add(1, Ordering::SeqCst);
        Checksums.fill(algorithm, body)
    }

    fn verify(&self, algorithm: ChecksumAlgorithm, body: &[u8], expected: &Digest) -> bool {
        self.verifies.fetch_add(1, Ordering::SeqCst);
        if algorithm.is_none() {
            return true;
        }
        self.fill(algorithm, body).matches(expected)
    }
}
