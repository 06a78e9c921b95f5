//! The verify header: fixed-size prefix of every verified payload.
//!
//! Layout (little-endian, [`HEADER_SIZE`] bytes):
//!
//! ```text
//! offset  0 : magic          u32  (HEADER_MAGIC)
//! offset  4 : total_length   u32  (header + body)
//! offset  8 : algorithm tag  u8
//! offset  9 : reserved       3 bytes, zero
//! offset 12 : digest         16 bytes, algorithm-specific prefix used
//! offset 28 : reserved       4 bytes, zero
//! offset 32 : body
//! ```

use crate::checksum::{ChecksumAlgorithm, Digest, DIGEST_CAPACITY};

/// Sentinel identifying a verification-formatted payload.
pub const HEADER_MAGIC: u32 = 0xf00b_aaef;

/// Size of the encoded header in bytes.
pub const HEADER_SIZE: usize = 32;

/// Field offsets within the encoded header.
pub(crate) mod offsets {
    pub const MAGIC: usize = 0;
    pub const TOTAL_LENGTH: usize = 4;
    pub const ALGORITHM: usize = 8;
    pub const DIGEST: usize = 12;
}

/// Decoded verify header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyHeader {
    /// Always [`HEADER_MAGIC`] for a sealed payload.
    pub magic: u32,
    /// Length of header plus body.
    pub total_length: u32,
    /// Algorithm that produced `digest`.
    pub algorithm: ChecksumAlgorithm,
    /// Digest of the body.
    pub digest: Digest,
}

impl VerifyHeader {
    /// Create a header for a payload of `total_length` bytes.
    pub fn new(total_length: u32, algorithm: ChecksumAlgorithm, digest: Digest) -> Self {
        Self {
            magic: HEADER_MAGIC,
            total_length,
            algorithm,
            digest,
        }
    }

    /// Length of the body following the header.
    pub fn body_len(&self) -> usize {
        (self.total_length as usize).saturating_sub(HEADER_SIZE)
    }

    /// Encode into the first [`HEADER_SIZE`] bytes of `out`.
    ///
    /// Reserved bytes are zeroed. Panics if `out` is shorter than the header;
    /// callers size-check first.
    pub fn encode_into(&self, out: &mut [u8]) {
        let out = &mut out[..HEADER_SIZE];
        out.fill(0);
        out[offsets::MAGIC..offsets::MAGIC + 4].copy_from_slice(&self.magic.to_le_bytes());
        out[offsets::TOTAL_LENGTH..offsets::TOTAL_LENGTH + 4]
            .copy_from_slice(&self.total_length.to_le_bytes());
        out[offsets::ALGORITHM] = self.algorithm.to_tag();
        out[offsets::DIGEST..offsets::DIGEST + DIGEST_CAPACITY].copy_from_slice(self.digest.field());
    }

    /// Encode to a fresh array.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        self.encode_into(&mut out);
        out
    }
}

/// Read a little-endian u32 at `at`. `bytes` must hold `at + 4` bytes.
pub(crate) fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(word)
}

/// Read the raw digest field. `bytes` must hold a full header.
pub(crate) fn read_digest_field(bytes: &[u8]) -> [u8; DIGEST_CAPACITY] {
    let mut field = [0u8; DIGEST_CAPACITY];
    field.copy_from_slice(&bytes[offsets::DIGEST..offsets::DIGEST + DIGEST_CAPACITY]);
    field
}
