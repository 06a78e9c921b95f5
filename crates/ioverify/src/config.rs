//! Verification configuration, loaded from JSON.
//!
//! Every field has a default, so `{}` is a valid configuration.

use std::fs;
use std::path::Path;

use ioverify_core::{ChecksumAlgorithm, ConfigError, HistoryMode, HEADER_SIZE};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Order in which a worker writes its blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IoPattern {
    /// Ascending offsets.
    #[default]
    Sequential,
    /// Every block once, in shuffled order.
    Random,
}

impl IoPattern {
    /// History layout for this pattern: random writes are re-read in offset
    /// order, sequential writes in completion order.
    pub fn history_mode(self) -> HistoryMode {
        match self {
            IoPattern::Sequential => HistoryMode::Sequential,
            IoPattern::Random => HistoryMode::Ordered,
        }
    }
}

/// Configuration for a verification job. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifyConfig {
    /// Checksum algorithm; `none` disables verification.
    pub algorithm: ChecksumAlgorithm,
    /// Write order.
    pub pattern: IoPattern,
    /// Bytes per I/O unit, header included.
    pub block_size: usize,
    /// Units each worker writes.
    pub blocks: u64,
    /// Independent workers, one file each.
    pub workers: usize,
    /// Base generator seed; worker `i` uses `seed + i`.
    pub seed: u64,
    /// Record verification failures and keep going instead of stopping.
    pub continue_on_error: bool,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            algorithm: ChecksumAlgorithm::Crc32,
            pattern: IoPattern::Sequential,
            block_size: 4096,
            blocks: 64,
            workers: 1,
            seed: 0,
            continue_on_error: false,
        }
    }
}

impl VerifyConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: VerifyConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| EngineError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.block_size < HEADER_SIZE {
            return Err(ConfigError::BlockTooSmall {
                block_size: self.block_size,
                min: HEADER_SIZE,
            });
        }
        if u32::try_from(self.block_size).is_err() {
            return Err(ConfigError::Invalid(format!(
                "block_size {} exceeds the 32-bit header length field",
                self.block_size
            )));
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.file_size_checked().is_none() {
            return Err(ConfigError::Invalid(format!(
                "{} blocks of {} bytes overflow a 64-bit file size",
                self.blocks, self.block_size
            )));
        }
        Ok(())
    }

    /// Bytes each worker's file must hold.
    pub fn file_size(&self) -> u64 {
        self.file_size_checked().unwrap_or(u64::MAX)
    }

    fn file_size_checked(&self) -> Option<u64> {
        self.blocks.checked_mul(self.block_size as u64)
    }

    /// Generator seed for a worker.
    pub fn worker_seed(&self, worker: usize) -> u64 {
        self.seed.wrapping_add(worker as u64)
    }
}
