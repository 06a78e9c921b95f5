//! Payload verification: header inspection plus digest check.

use crate::checksum::{ChecksumAdapter, ChecksumAlgorithm};
use crate::codec::{inspect, Inspected};
use crate::error::CorruptionError;

/// Verify a read-back payload against its own header.
///
/// Returns the algorithm the payload was sealed with. A header tagged
/// [`ChecksumAlgorithm::None`] carries no digest and is rejected as an
/// unknown verify type. The digest is only computed once the header has
/// been accepted; on a mismatch it is computed a second time so both values
/// can be reported.
pub fn verify_payload<C: ChecksumAdapter + ?Sized>(
    adapter: &C,
    buf: &[u8],
) -> Result<ChecksumAlgorithm, CorruptionError> {
    let inspected = inspect(buf)?;
    check_digest(adapter, &inspected)
}

/// Verify a read-back payload that must have been sealed with `expected`.
///
/// A header naming any other algorithm fails with
/// [`CorruptionError::AlgorithmMismatch`] before a digest is computed.
pub fn verify_payload_as<C: ChecksumAdapter + ?Sized>(
    adapter: &C,
    buf: &[u8],
    expected: ChecksumAlgorithm,
) -> Result<ChecksumAlgorithm, CorruptionError> {
    let inspected = inspect(buf)?;
    let found = inspected.algorithm();
    if !found.is_none() && found != expected {
        return Err(CorruptionError::AlgorithmMismatch { expected, found });
    }
    check_digest(adapter, &inspected)
}

fn check_digest<C: ChecksumAdapter + ?Sized>(
    adapter: &C,
    inspected: &Inspected<'_>,
) -> Result<ChecksumAlgorithm, CorruptionError> {
    let algorithm = inspected.algorithm();
    if algorithm.is_none() {
        return Err(CorruptionError::UnknownAlgorithm {
            tag: algorithm.to_tag(),
        });
    }
    let expected = inspected.stored_digest();

    if adapter.verify(algorithm, inspected.body, expected) {
        return Ok(algorithm);
    }

    Err(CorruptionError::DigestMismatch {
        algorithm,
        expected: *expected,
        actual: adapter.fill(algorithm, inspected.body),
    })
}
