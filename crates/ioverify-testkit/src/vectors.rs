//! Golden test vectors for the on-media format.
//!
//! Check values are the published results over the ASCII string
//! `"123456789"`, written in storage order (CRCs little-endian).

use ioverify_core::{fill, ChecksumAlgorithm, VerifyHeader};

/// The standard check input.
pub const CHECK_INPUT: &[u8] = b"123456789";

/// A golden digest vector.
#[derive(Debug, Clone)]
pub struct CheckVector {
    /// Algorithm under test.
    pub algorithm: ChecksumAlgorithm,
    /// Expected digest bytes as stored in the header (hex).
    pub expected: &'static str,
}

/// Get all golden digest vectors.
pub fn all_check_vectors() -> Vec<CheckVector> {
    vec![
        CheckVector {
            algorithm: ChecksumAlgorithm::Md5,
            expected: "25f9e794323b453885f5181f1b624d0b",
        },
        CheckVector {
            algorithm: ChecksumAlgorithm::Crc64,
            // CRC-64/XZ 0x995dc9bbdf1939fa
            expected: "fa3919dfbbc95d99",
        },
        CheckVector {
            algorithm: ChecksumAlgorithm::Crc32,
            // 0xcbf43926
            expected: "2639f4cb",
        },
        CheckVector {
            algorithm: ChecksumAlgorithm::Crc16,
            // CRC-16/ARC 0xbb3d
            expected: "3dbb",
        },
        CheckVector {
            algorithm: ChecksumAlgorithm::Crc7,
            // CRC-7/MMC
            expected: "75",
        },
    ]
}

/// Encoded header for a 4096-byte CRC32 unit whose body digest is the
/// CRC32 check value.
pub const CRC32_HEADER_4096: &str = concat!(
    "efaa0bf0", // magic
    "00100000", // total length 4096
    "03000000", // tag + reserved
    "2639f4cb", // crc32
    "000000000000000000000000",
    "00000000",
);

/// Encode the header described by [`CRC32_HEADER_4096`].
pub fn crc32_header_4096() -> String {
    let digest = fill(ChecksumAlgorithm::Crc32, CHECK_INPUT);
    hex::encode(VerifyHeader::new(4096, ChecksumAlgorithm::Crc32, digest).to_bytes())
}

/// Check every vector against this build.
///
/// Returns `(name, matches, computed_hex)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_check_vectors()
        .iter()
        .map(|v| {
            let hex = fill(v.algorithm, CHECK_INPUT).to_hex();
            (v.algorithm.to_string(), hex == v.expected, hex)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_vectors() {
        for (name, matches, hex) in verify_all_vectors() {
            assert!(matches, "vector '{name}' computed {hex}");
        }
    }

    #[test]
    fn test_vectors_cover_every_sealing_algorithm() {
        let covered: Vec<_> = all_check_vectors().iter().map(|v| v.algorithm).collect();
        for algorithm in ChecksumAlgorithm::SEALING {
            assert!(covered.contains(&algorithm), "{algorithm}");
        }
    }

    #[test]
    fn test_header_vector() {
        assert_eq!(crc32_header_4096(), CRC32_HEADER_4096);
    }

    #[test]
    fn test_none_has_empty_digest() {
        assert_eq!(fill(ChecksumAlgorithm::None, CHECK_INPUT).to_hex(), "");
    }
}
