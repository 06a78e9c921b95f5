//! Payload codec: seal buffers before they are written, inspect them after
//! they are read back.
//!
//! A sealed buffer is `header || body`, where the body is pseudo-random bytes
//! drawn from the worker's generator and the header carries the digest of the
//! body. Sealing is deterministic for a given generator state, so a fixed seed
//! reproduces the same payload stream.

use rand::RngCore;

use crate::checksum::{ChecksumAdapter, ChecksumAlgorithm, Checksums, Digest};
use crate::error::{CodecError, CorruptionError};
use crate::header::{self, offsets, VerifyHeader, HEADER_MAGIC, HEADER_SIZE};

/// The fields of a read-back payload, ready for digest verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inspected<'a> {
    /// The decoded header.
    pub header: VerifyHeader,
    /// The body the digest covers: `total_length - HEADER_SIZE` bytes.
    pub body: &'a [u8],
}

impl<'a> Inspected<'a> {
    /// Algorithm recorded in the header.
    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.header.algorithm
    }

    /// Digest recorded in the header.
    pub fn stored_digest(&self) -> &Digest {
        &self.header.digest
    }
}

/// Seal `buf` with the standard checksum adapter.
///
/// See [`seal_with`].
pub fn seal<R: RngCore + ?Sized>(
    buf: &mut [u8],
    algorithm: ChecksumAlgorithm,
    rng: &mut R,
) -> Result<VerifyHeader, CodecError> {
    seal_with(&Checksums, buf, algorithm, rng)
}

/// Seal `buf`: write the header, fill the body from `rng`, store the digest.
///
/// The whole buffer is used; `total_length` is `buf.len()`.
pub fn seal_with<C, R>(
    adapter: &C,
    buf: &mut [u8],
    algorithm: ChecksumAlgorithm,
    rng: &mut R,
) -> Result<VerifyHeader, CodecError>
where
    C: ChecksumAdapter + ?Sized,
    R: RngCore + ?Sized,
{
    if buf.len() < HEADER_SIZE {
        return Err(CodecError::BufferTooSmall {
            len: buf.len(),
            min: HEADER_SIZE,
        });
    }
    let total_length = u32::try_from(buf.len()).map_err(|_| CodecError::BufferTooLarge {
        len: buf.len(),
        max: u32::MAX as usize,
    })?;

    let (head, body) = buf.split_at_mut(HEADER_SIZE);
    rng.fill_bytes(body);

    let digest = adapter.fill(algorithm, body);
    let header = VerifyHeader::new(total_length, algorithm, digest);
    header.encode_into(head);
    Ok(header)
}

/// Parse the header of a read-back payload.
///
/// `buf` must be exactly the bytes of the I/O unit. The magic is checked
/// before anything else; once it fails no other field is trusted.
pub fn inspect(buf: &[u8]) -> Result<Inspected<'_>, CorruptionError> {
    if buf.len() < offsets::MAGIC + 4 {
        return Err(CorruptionError::Truncated { len: buf.len() });
    }
    let magic = header::read_u32(buf, offsets::MAGIC);
    if magic != HEADER_MAGIC {
        return Err(CorruptionError::BadMagic { found: magic });
    }
    if buf.len() < HEADER_SIZE {
        return Err(CorruptionError::Truncated { len: buf.len() });
    }

    let total_length = header::read_u32(buf, offsets::TOTAL_LENGTH);
    if total_length as usize != buf.len() {
        return Err(CorruptionError::LengthMismatch {
            header: total_length,
            buffer: buf.len(),
        });
    }

    let tag = buf[offsets::ALGORITHM];
    let algorithm =
        ChecksumAlgorithm::from_tag(tag).ok_or(CorruptionError::UnknownAlgorithm { tag })?;

    let digest = Digest::new(algorithm, header::read_digest_field(buf));
    Ok(Inspected {
        header: VerifyHeader {
            magic,
            total_length,
            algorithm,
            digest,
        },
        body: &buf[HEADER_SIZE..],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sealed(len: usize, algorithm: ChecksumAlgorithm, seed: u64) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        let mut rng = StdRng::seed_from_u64(seed);
        seal(&mut buf, algorithm, &mut rng).unwrap();
        buf
    }

    #[test]
    fn test_seal_inspect() {
        let buf = sealed(4096, ChecksumAlgorithm::Crc32, 7);
        let inspected = inspect(&buf).unwrap();

        assert_eq!(inspected.algorithm(), ChecksumAlgorithm::Crc32);
        assert_eq!(inspected.header.total_length, 4096);
        assert_eq!(inspected.body.len(), 4096 - HEADER_SIZE);
        assert_eq!(
            *inspected.stored_digest(),
            ChecksumAlgorithm::Crc32.compute(&buf[HEADER_SIZE..])
        );
    }

    #[test]
    fn test_seal_deterministic_per_seed() {
        assert_eq!(sealed(512, ChecksumAlgorithm::Md5, 1), sealed(512, ChecksumAlgorithm::Md5, 1));
        assert_ne!(sealed(512, ChecksumAlgorithm::Md5, 1), sealed(512, ChecksumAlgorithm::Md5, 2));
    }

    #[test]
    fn test_seal_empty_body() {
        let buf = sealed(HEADER_SIZE, ChecksumAlgorithm::Crc64, 3);
        let inspected = inspect(&buf).unwrap();
        assert!(inspected.body.is_empty());
    }

    #[test]
    fn test_seal_rejects_small_buffer() {
        let mut buf = vec![0u8; HEADER_SIZE - 1];
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            seal(&mut buf, ChecksumAlgorithm::Crc32, &mut rng),
            Err(CodecError::BufferTooSmall {
                len: HEADER_SIZE - 1,
                min: HEADER_SIZE
            })
        );
    }

    #[test]
    fn test_inspect_bad_magic() {
        let mut buf = sealed(256, ChecksumAlgorithm::Crc16, 4);
        buf[0] ^= 0xff;
        assert!(matches!(inspect(&buf), Err(CorruptionError::BadMagic { .. })));
    }

    #[test]
    fn test_inspect_bad_magic_on_short_buffer() {
        // Magic is judged before header completeness.
        let buf = [0u8; 8];
        assert_eq!(inspect(&buf), Err(CorruptionError::BadMagic { found: 0 }));
        assert_eq!(inspect(&buf[..2]), Err(CorruptionError::Truncated { len: 2 }));
    }

    #[test]
    fn test_inspect_length_mismatch() {
        let buf = sealed(256, ChecksumAlgorithm::Crc32, 5);
        assert_eq!(
            inspect(&buf[..128]),
            Err(CorruptionError::LengthMismatch {
                header: 256,
                buffer: 128
            })
        );
    }

    #[test]
    fn test_inspect_unknown_algorithm() {
        let mut buf = sealed(256, ChecksumAlgorithm::Crc32, 6);
        buf[offsets::ALGORITHM] = 0x7f;
        assert_eq!(inspect(&buf), Err(CorruptionError::UnknownAlgorithm { tag: 0x7f }));
    }
}
