//! The Verifier: per-worker write sealing, verification scheduling, and
//! read-back checking.
//!
//! A worker drives its buffers through two paths:
//!
//! - write: [`Verifier::prepare_write`], submit, [`Verifier::complete_write`]
//! - read: [`Verifier::prepare_verify`], submit, [`Verifier::complete_read`],
//!   [`Verifier::verify`], [`Verifier::recycle`]
//!
//! [`Verifier::write_pass`] and [`Verifier::verify_pass`] run those paths over
//! a whole file.

use std::sync::Arc;

use ioverify_core::{
    seal_with, verify_payload_as, BufferState, ChecksumAdapter, ChecksumAlgorithm, Checksums,
    CorruptionError, FileId, HistoryEntry, IoBuffer, IoDirection,
};
use ioverify_store::{IoBackend, StoreError};
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{IoPattern, VerifyConfig};
use crate::error::{EngineError, Result};
use crate::state::ThreadVerifyState;

/// Outcome of [`Verifier::prepare_verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// The buffer is bound to this entry and ready to be read into.
    Ready(HistoryEntry),
    /// The buffer was already bound; its read is being re-issued.
    Requeued,
    /// History is empty. Not an error.
    NoPendingVerification,
}

/// Outcome of [`Verifier::verify`] for a unit that passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Header and digest matched.
    Verified(ChecksumAlgorithm),
    /// Verification is disabled for this worker, or the unit was not a read.
    Skipped,
}

/// A recorded verification failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyFailure {
    pub file: FileId,
    pub offset: u64,
    pub length: usize,
    pub error: CorruptionError,
}

/// Counters for one worker's run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    pub worker: usize,
    pub written: u64,
    pub verified: u64,
    pub skipped: u64,
    #[serde(skip)]
    pub failures: Vec<VerifyFailure>,
}

impl WorkerReport {
    fn new(worker: usize) -> Self {
        Self {
            worker,
            ..Self::default()
        }
    }

    /// No verification failures were recorded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// What one worker does to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassPlan {
    pub file: FileId,
    pub blocks: u64,
    pub block_size: usize,
    pub pattern: IoPattern,
    pub continue_on_error: bool,
}

impl PassPlan {
    /// Plan for `file` from a job configuration.
    pub fn from_config(config: &VerifyConfig, file: FileId) -> Self {
        Self {
            file,
            blocks: config.blocks,
            block_size: config.block_size,
            pattern: config.pattern,
            continue_on_error: config.continue_on_error,
        }
    }

    /// Block offsets in ascending order.
    pub fn offsets(&self) -> Vec<u64> {
        let stride = self.block_size as u64;
        (0..self.blocks).map(|block| block * stride).collect()
    }
}

/// A worker's verification engine.
///
/// Owns the worker's [`ThreadVerifyState`]; the backend is shared. Digests
/// are computed only through the adapter `C`.
pub struct Verifier<B: IoBackend, C: ChecksumAdapter = Checksums> {
    worker: usize,
    state: ThreadVerifyState,
    backend: Arc<B>,
    adapter: C,
}

impl<B: IoBackend> Verifier<B> {
    /// Create a verifier with the standard checksum adapter.
    pub fn new(worker: usize, state: ThreadVerifyState, backend: Arc<B>) -> Self {
        Self::with_adapter(worker, state, backend, Checksums)
    }
}

impl<B: IoBackend, C: ChecksumAdapter> Verifier<B, C> {
    /// Create a verifier with a custom checksum adapter.
    pub fn with_adapter(worker: usize, state: ThreadVerifyState, backend: Arc<B>, adapter: C) -> Self {
        Self {
            worker,
            state,
            backend,
            adapter,
        }
    }

    /// Worker index.
    pub fn worker(&self) -> usize {
        self.worker
    }

    /// The worker's state.
    pub fn state(&self) -> &ThreadVerifyState {
        &self.state
    }

    /// The worker's state, mutably.
    pub fn state_mut(&mut self) -> &mut ThreadVerifyState {
        &mut self.state
    }

    /// The shared backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The checksum adapter.
    pub fn adapter(&self) -> &C {
        &self.adapter
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Write Path
    // ─────────────────────────────────────────────────────────────────────────

    /// Bind `buf` to `file` at `offset` and seal its contents.
    ///
    /// `buf.length()` is the unit size. With verification disabled the
    /// contents are left untouched.
    pub fn prepare_write(&mut self, buf: &mut IoBuffer, file: FileId, offset: u64) -> Result<()> {
        buf.file = Some(file);
        buf.offset = offset;
        buf.direction = IoDirection::Write;
        buf.state = BufferState::Fresh;

        let (algorithm, rng) = self.state.seal_parts();
        if !algorithm.is_none() {
            seal_with(&self.adapter, buf.data_mut(), algorithm, rng)?;
        }
        Ok(())
    }

    /// Record a completed write in the history.
    ///
    /// The buffer stays bound until [`Verifier::recycle`] or
    /// [`IoBuffer::reset`] returns it to the pool. Handing it straight to
    /// [`Verifier::prepare_verify`] is also fine: a finished write is never
    /// taken for a requeue.
    pub fn complete_write(&mut self, buf: &mut IoBuffer) -> Result<HistoryEntry> {
        let file = buf.file.ok_or(EngineError::NotBound)?;
        let entry = HistoryEntry::new(buf.offset, buf.length(), file);
        self.state.history_mut().record(entry);
        buf.state = BufferState::Sealed;
        Ok(entry)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Read Path
    // ─────────────────────────────────────────────────────────────────────────

    /// Schedule a verification read into `buf`.
    ///
    /// A buffer holding an unchecked verification read is a requeue: its
    /// file and offset are kept and no entry is consumed. Any other buffer
    /// is reset and takes the next history entry, opening the entry's file
    /// if needed and taking a reference on it.
    ///
    /// A requeued unit whose file has been closed fails with
    /// [`StoreError::NotOpen`]. An open failure is returned as-is and leaves
    /// `buf` unbound.
    pub async fn prepare_verify(&mut self, buf: &mut IoBuffer) -> Result<Schedule> {
        if let Some(file) = buf.file.filter(|_| buf.is_read_pending()) {
            if !self.backend.is_open(file).await {
                warn!(
                    worker = self.worker,
                    %file,
                    offset = buf.offset,
                    "requeued verification targets a closed file"
                );
                return Err(StoreError::NotOpen(file).into());
            }
            buf.direction = IoDirection::Read;
            buf.state = BufferState::Pending;
            debug!(worker = self.worker, %file, offset = buf.offset, "requeued verification");
            return Ok(Schedule::Requeued);
        }
        if buf.is_bound() {
            // A finished write or an already checked read goes back to the
            // pool first.
            self.recycle(buf).await?;
        }

        let Some(entry) = self.state.history_mut().next() else {
            debug!(worker = self.worker, "no pending verification");
            return Ok(Schedule::NoPendingVerification);
        };

        if entry.length > buf.capacity() {
            return Err(EngineError::BufferTooSmall {
                entry,
                capacity: buf.capacity(),
            });
        }

        if !self.backend.is_open(entry.file).await {
            if let Err(e) = self.backend.open(entry.file).await {
                error!(worker = self.worker, %entry, error = %e, "failed to open file for verification");
                return Err(e.into());
            }
        }
        self.backend.retain(entry.file).await?;

        buf.bind(&entry)?;
        buf.state = BufferState::Pending;
        Ok(Schedule::Ready(entry))
    }

    /// Accept the result of a verification read.
    pub fn complete_read(&self, buf: &mut IoBuffer, transferred: usize) -> Result<()> {
        let file = buf.file.ok_or(EngineError::NotBound)?;
        if transferred != buf.length() {
            return Err(EngineError::ShortTransfer {
                file,
                offset: buf.offset,
                direction: IoDirection::Read,
                expected: buf.length(),
                transferred,
            });
        }
        buf.state = BufferState::ReadBack;
        Ok(())
    }

    /// Check the bytes read into `buf` against their header.
    ///
    /// The header must carry this worker's algorithm; any other tag,
    /// `none` included, is a failure.
    ///
    /// A failure is logged with the unit's file, offset and length and
    /// returned as [`EngineError::Corruption`]. It does not stop the worker;
    /// the caller decides whether to continue.
    pub fn verify(&self, buf: &mut IoBuffer) -> Result<Verification> {
        if !self.state.verifying() || buf.direction != IoDirection::Read {
            return Ok(Verification::Skipped);
        }
        let file = buf.file.ok_or(EngineError::NotBound)?;

        match verify_payload_as(&self.adapter, buf.data(), self.state.algorithm()) {
            Ok(algorithm) => {
                buf.state = BufferState::Verified;
                Ok(Verification::Verified(algorithm))
            }
            Err(source) => {
                buf.state = BufferState::Failed;
                self.log_failure(file, buf.offset, buf.length(), &source);
                Err(EngineError::Corruption {
                    worker: self.worker,
                    file,
                    offset: buf.offset,
                    length: buf.length(),
                    source,
                })
            }
        }
    }

    /// Return `buf` to the pool, dropping the file reference a verification
    /// read took.
    pub async fn recycle(&self, buf: &mut IoBuffer) -> Result<()> {
        if let (Some(file), IoDirection::Read) = (buf.file, buf.direction) {
            self.backend.release(file).await?;
        }
        buf.reset();
        Ok(())
    }

    fn log_failure(&self, file: FileId, offset: u64, length: usize, source: &CorruptionError) {
        match source {
            CorruptionError::DigestMismatch {
                algorithm,
                expected,
                actual,
            } => error!(
                worker = self.worker,
                %file,
                offset,
                length,
                %algorithm,
                wanted = %expected,
                got = %actual,
                "{algorithm}: verify failed at {offset}/{length}"
            ),
            CorruptionError::BadMagic { found } => error!(
                worker = self.worker,
                %file,
                offset,
                length,
                found = format_args!("{found:08x}"),
                "bad verify header magic"
            ),
            other => error!(
                worker = self.worker,
                %file,
                offset,
                length,
                error = %other,
                "verify failed"
            ),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Passes
    // ─────────────────────────────────────────────────────────────────────────

    /// Write every block of `plan.file` once. Returns the number of units
    /// written.
    pub async fn write_pass(&mut self, plan: &PassPlan) -> Result<u64> {
        let file = plan.file;
        if !self.backend.is_open(file).await {
            self.backend.open(file).await?;
        }

        let mut offsets = plan.offsets();
        if plan.pattern == IoPattern::Random {
            offsets.shuffle(self.state.offset_rng_mut());
        }

        let mut buf = IoBuffer::new(plan.block_size);
        let mut written = 0;
        for offset in offsets {
            self.prepare_write(&mut buf, file, offset)?;
            let transferred = self.backend.submit(&mut buf).await?;
            if transferred != buf.length() {
                return Err(EngineError::ShortTransfer {
                    file,
                    offset,
                    direction: IoDirection::Write,
                    expected: buf.length(),
                    transferred,
                });
            }
            self.complete_write(&mut buf)?;
            buf.reset();
            written += 1;
        }

        info!(
            worker = self.worker,
            %file,
            written,
            block_size = plan.block_size,
            algorithm = %self.state.algorithm(),
            "write pass complete"
        );
        Ok(written)
    }

    /// Re-read and verify everything in history.
    ///
    /// The first verification failure ends the pass with an error unless
    /// `plan.continue_on_error` is set, in which case it is recorded in the
    /// report. I/O errors always end the pass.
    pub async fn verify_pass(&mut self, plan: &PassPlan) -> Result<WorkerReport> {
        let mut report = WorkerReport::new(self.worker);
        let mut buf = IoBuffer::new(plan.block_size);

        loop {
            match self.prepare_verify(&mut buf).await? {
                Schedule::NoPendingVerification => break,
                Schedule::Ready(_) | Schedule::Requeued => {}
            }

            let outcome = self.read_and_verify(&mut buf).await;
            self.recycle(&mut buf).await?;

            match outcome {
                Ok(Verification::Verified(_)) => report.verified += 1,
                Ok(Verification::Skipped) => report.skipped += 1,
                Err(EngineError::Corruption {
                    file,
                    offset,
                    length,
                    source,
                    ..
                }) if plan.continue_on_error => report.failures.push(VerifyFailure {
                    file,
                    offset,
                    length,
                    error: source,
                }),
                Err(e) => return Err(e),
            }
        }

        if report.is_clean() {
            info!(
                worker = self.worker,
                verified = report.verified,
                skipped = report.skipped,
                "verify pass complete"
            );
        } else {
            warn!(
                worker = self.worker,
                verified = report.verified,
                failed = report.failures.len(),
                "verify pass complete with failures"
            );
        }
        Ok(report)
    }

    /// Write pass followed by verify pass.
    pub async fn run(&mut self, plan: &PassPlan) -> Result<WorkerReport> {
        let written = self.write_pass(plan).await?;
        let mut report = self.verify_pass(plan).await?;
        report.written = written;
        Ok(report)
    }

    async fn read_and_verify(&self, buf: &mut IoBuffer) -> Result<Verification> {
        let transferred = self.backend.submit(buf).await?;
        self.complete_read(buf, transferred)?;
        self.verify(buf)
    }
}
