//! Checksum algorithms and the adapter seam over them.
//!
//! Every algorithm is a pure function from body bytes to a digest stored in
//! the leading bytes of a fixed 16-byte field. Adding an algorithm means
//! adding one variant here and one arm in [`ChecksumAlgorithm::compute`].

use crc::{Crc, CRC_16_ARC, CRC_7_MMC};
use md5::{Digest as _, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Capacity of the digest field, sized for the widest algorithm (MD5).
pub const DIGEST_CAPACITY: usize = 16;

const CRC7: Crc<u8> = Crc::<u8>::new(&CRC_7_MMC);
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_ARC);

/// Checksum algorithm recorded in a verify header.
///
/// Wire tags follow the declaration order below and must never be reused.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChecksumAlgorithm {
    /// Verification disabled. Always passes.
    None,
    /// MD5, 16-byte digest.
    Md5,
    /// CRC-64/XZ, 8-byte digest.
    Crc64,
    /// CRC-32/IEEE, 4-byte digest.
    #[default]
    Crc32,
    /// CRC-16/ARC, 2-byte digest.
    Crc16,
    /// CRC-7/MMC, 1-byte digest.
    Crc7,
}

impl ChecksumAlgorithm {
    /// All algorithms, in wire-tag order.
    pub const ALL: [ChecksumAlgorithm; 6] = [
        ChecksumAlgorithm::None,
        ChecksumAlgorithm::Md5,
        ChecksumAlgorithm::Crc64,
        ChecksumAlgorithm::Crc32,
        ChecksumAlgorithm::Crc16,
        ChecksumAlgorithm::Crc7,
    ];

    /// Algorithms that actually compute a digest.
    pub const SEALING: [ChecksumAlgorithm; 5] = [
        ChecksumAlgorithm::Md5,
        ChecksumAlgorithm::Crc64,
        ChecksumAlgorithm::Crc32,
        ChecksumAlgorithm::Crc16,
        ChecksumAlgorithm::Crc7,
    ];

    /// The on-wire tag.
    pub const fn to_tag(self) -> u8 {
        match self {
            ChecksumAlgorithm::None => 0,
            ChecksumAlgorithm::Md5 => 1,
            ChecksumAlgorithm::Crc64 => 2,
            ChecksumAlgorithm::Crc32 => 3,
            ChecksumAlgorithm::Crc16 => 4,
            ChecksumAlgorithm::Crc7 => 5,
        }
    }

    /// Parse an on-wire tag.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(ChecksumAlgorithm::None),
            1 => Some(ChecksumAlgorithm::Md5),
            2 => Some(ChecksumAlgorithm::Crc64),
            3 => Some(ChecksumAlgorithm::Crc32),
            4 => Some(ChecksumAlgorithm::Crc16),
            5 => Some(ChecksumAlgorithm::Crc7),
            _ => None,
        }
    }

    /// Number of leading digest bytes this algorithm occupies.
    pub const fn digest_len(self) -> usize {
        match self {
            ChecksumAlgorithm::None => 0,
            ChecksumAlgorithm::Md5 => 16,
            ChecksumAlgorithm::Crc64 => 8,
            ChecksumAlgorithm::Crc32 => 4,
            ChecksumAlgorithm::Crc16 => 2,
            ChecksumAlgorithm::Crc7 => 1,
        }
    }

    /// Whether verification is disabled.
    pub const fn is_none(self) -> bool {
        matches!(self, ChecksumAlgorithm::None)
    }

    /// Configuration name.
    pub const fn name(self) -> &'static str {
        match self {
            ChecksumAlgorithm::None => "none",
            ChecksumAlgorithm::Md5 => "md5",
            ChecksumAlgorithm::Crc64 => "crc64",
            ChecksumAlgorithm::Crc32 => "crc32",
            ChecksumAlgorithm::Crc16 => "crc16",
            ChecksumAlgorithm::Crc7 => "crc7",
        }
    }

    /// Compute the digest of `body`.
    pub fn compute(self, body: &[u8]) -> Digest {
        let mut field = [0u8; DIGEST_CAPACITY];
        match self {
            ChecksumAlgorithm::None => {}
            ChecksumAlgorithm::Md5 => {
                field.copy_from_slice(&Md5::digest(body));
            }
            ChecksumAlgorithm::Crc64 => {
                let mut hasher = crc64fast::Digest::new();
                hasher.write(body);
                field[..8].copy_from_slice(&hasher.sum64().to_le_bytes());
            }
            ChecksumAlgorithm::Crc32 => {
                field[..4].copy_from_slice(&crc32fast::hash(body).to_le_bytes());
            }
            ChecksumAlgorithm::Crc16 => {
                field[..2].copy_from_slice(&CRC16.checksum(body).to_le_bytes());
            }
            ChecksumAlgorithm::Crc7 => {
                field[0] = CRC7.checksum(body);
            }
        }
        Digest::new(self, field)
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "null" => Ok(ChecksumAlgorithm::None),
            "md5" => Ok(ChecksumAlgorithm::Md5),
            "crc64" => Ok(ChecksumAlgorithm::Crc64),
            "crc32" => Ok(ChecksumAlgorithm::Crc32),
            "crc16" => Ok(ChecksumAlgorithm::Crc16),
            "crc7" => Ok(ChecksumAlgorithm::Crc7),
            _ => Err(ConfigError::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl TryFrom<String> for ChecksumAlgorithm {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ChecksumAlgorithm> for String {
    fn from(algorithm: ChecksumAlgorithm) -> Self {
        algorithm.name().to_string()
    }
}

/// A digest as stored in the verify header.
///
/// The field is always [`DIGEST_CAPACITY`] bytes; only the leading
/// `algorithm.digest_len()` bytes are meaningful, the rest are zero.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: ChecksumAlgorithm,
    field: [u8; DIGEST_CAPACITY],
}

impl Digest {
    /// Create from a raw field.
    pub const fn new(algorithm: ChecksumAlgorithm, field: [u8; DIGEST_CAPACITY]) -> Self {
        Self { algorithm, field }
    }

    /// An all-zero digest for the given algorithm.
    pub const fn zero(algorithm: ChecksumAlgorithm) -> Self {
        Self::new(algorithm, [0u8; DIGEST_CAPACITY])
    }

    /// The algorithm that produced this digest.
    pub const fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    /// The meaningful leading bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.field[..self.algorithm.digest_len()]
    }

    /// The whole fixed-size field, including unused trailing bytes.
    pub const fn field(&self) -> &[u8; DIGEST_CAPACITY] {
        &self.field
    }

    /// Hex of the meaningful bytes, in storage order.
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// Whether two digests agree on the meaningful bytes.
    pub fn matches(&self, other: &Digest) -> bool {
        self.algorithm == other.algorithm && self.as_bytes() == other.as_bytes()
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({}:{})", self.algorithm, self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Uniform interface over the checksum algorithms.
///
/// The codec and engine only compute digests through this trait, so tests can
/// substitute an instrumented implementation.
pub trait ChecksumAdapter: Send + Sync {
    /// Compute the digest of `body`.
    fn fill(&self, algorithm: ChecksumAlgorithm, body: &[u8]) -> Digest;

    /// Check `body` against a stored digest. [`ChecksumAlgorithm::None`] always passes.
    fn verify(&self, algorithm: ChecksumAlgorithm, body: &[u8], expected: &Digest) -> bool {
        if algorithm.is_none() {
            return true;
        }
        self.fill(algorithm, body).as_bytes() == &expected.field()[..algorithm.digest_len()]
    }
}

/// The standard adapter backed by the real checksum primitives.
#[derive(Debug, Default, Clone, Copy)]
pub struct Checksums;

impl ChecksumAdapter for Checksums {
    fn fill(&self, algorithm: ChecksumAlgorithm, body: &[u8]) -> Digest {
        algorithm.compute(body)
    }
}

/// Compute the digest of `body` with the standard adapter.
pub fn fill(algorithm: ChecksumAlgorithm, body: &[u8]) -> Digest {
    Checksums.fill(algorithm, body)
}

/// Check `body` against `expected` with the standard adapter.
pub fn verify(algorithm: ChecksumAlgorithm, body: &[u8], expected: &Digest) -> bool {
    Checksums.verify(algorithm, body, expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECK: &[u8] = b"123456789";

    #[test]
    fn test_check_values() {
        assert_eq!(fill(ChecksumAlgorithm::Crc7, CHECK).to_hex(), "75");
        assert_eq!(fill(ChecksumAlgorithm::Crc16, CHECK).to_hex(), "3dbb");
        assert_eq!(fill(ChecksumAlgorithm::Crc32, CHECK).to_hex(), "2639f4cb");
        assert_eq!(
            fill(ChecksumAlgorithm::Crc64, CHECK).to_hex(),
            "fa3919dfbbc95d99"
        );
        assert_eq!(
            fill(ChecksumAlgorithm::Md5, CHECK).to_hex(),
            "25f9e794323b453885f5181f1b624d0b"
        );
        assert_eq!(fill(ChecksumAlgorithm::None, CHECK).to_hex(), "");
    }

    #[test]
    fn test_digest_widths() {
        for algorithm in ChecksumAlgorithm::ALL {
            let digest = fill(algorithm, b"payload");
            assert_eq!(digest.as_bytes().len(), algorithm.digest_len());
            assert!(digest.field()[algorithm.digest_len()..].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_tag_roundtrip() {
        for algorithm in ChecksumAlgorithm::ALL {
            assert_eq!(ChecksumAlgorithm::from_tag(algorithm.to_tag()), Some(algorithm));
        }
        assert_eq!(ChecksumAlgorithm::from_tag(6), None);
        assert_eq!(ChecksumAlgorithm::from_tag(0xff), None);
    }

    #[test]
    fn test_verify_detects_change() {
        for algorithm in ChecksumAlgorithm::SEALING {
            let digest = fill(algorithm, b"some body bytes");
            assert!(verify(algorithm, b"some body bytes", &digest));
            assert!(!verify(algorithm, b"some body bytez", &digest), "{algorithm}");
        }
    }

    #[test]
    fn test_none_always_verifies() {
        let digest = Digest::new(ChecksumAlgorithm::None, [0xab; DIGEST_CAPACITY]);
        assert!(verify(ChecksumAlgorithm::None, b"anything", &digest));
    }

    #[test]
    fn test_verify_ignores_unused_field_bytes() {
        let mut field = *fill(ChecksumAlgorithm::Crc16, b"abc").field();
        field[DIGEST_CAPACITY - 1] = 0xee;
        let stored = Digest::new(ChecksumAlgorithm::Crc16, field);
        assert!(verify(ChecksumAlgorithm::Crc16, b"abc", &stored));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("CRC32".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Crc32);
        assert_eq!("null".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::None);
        assert_eq!(
            "sha1".parse::<ChecksumAlgorithm>(),
            Err(ConfigError::UnknownAlgorithm("sha1".into()))
        );
        for algorithm in ChecksumAlgorithm::ALL {
            assert_eq!(algorithm.name().parse::<ChecksumAlgorithm>().unwrap(), algorithm);
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ChecksumAlgorithm::Crc64).unwrap();
        assert_eq!(json, "\"crc64\"");
        let parsed: ChecksumAlgorithm = serde_json::from_str("\"md5\"").unwrap();
        assert_eq!(parsed, ChecksumAlgorithm::Md5);
        assert!(serde_json::from_str::<ChecksumAlgorithm>("\"adler\"").is_err());
    }
}
