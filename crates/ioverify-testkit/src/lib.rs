//! # ioverify Testkit
//!
//! Testing utilities for ioverify.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Published check values and header encodings that
//!   pin the on-media format
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A ready-made verifier over an in-memory backend, and an
//!   instrumented checksum adapter
//!
//! ## Golden Vectors
//!
//! ```rust
//! use ioverify_testkit::vectors::{all_check_vectors, verify_all_vectors};
//!
//! for (name, ok, hex) in verify_all_vectors() {
//!     assert!(ok, "{name}: {hex}");
//! }
//! assert_eq!(all_check_vectors().len(), 5);
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use ioverify_testkit::generators::{SealParams, sealed_buffer};
//!
//! proptest! {
//!     #[test]
//!     fn sealed_buffers_verify(params: SealParams) {
//!         let buf = sealed_buffer(&params);
//!         prop_assert!(ioverify_core::verify_payload(&ioverify_core::Checksums, &buf).is_ok());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use ioverify_testkit::fixtures::TestFixture;
//! use ioverify_core::ChecksumAlgorithm;
//!
//! let fixture = TestFixture::new(ChecksumAlgorithm::Crc32, 8);
//! let verifier = fixture.verifier(0);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{CountingChecksums, TestFixture};
