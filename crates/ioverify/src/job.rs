//! Job: run one verifier per worker, each on its own file.

use std::sync::Arc;

use ioverify_core::{ConfigError, FileId};
use ioverify_store::IoBackend;
use serde::Serialize;
use tracing::{info, info_span, Instrument};

use crate::config::VerifyConfig;
use crate::engine::{PassPlan, Verifier, WorkerReport};
use crate::error::{EngineError, Result};
use crate::state::ThreadVerifyState;

/// Combined result of every worker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobReport {
    pub workers: Vec<WorkerReport>,
}

impl JobReport {
    /// Units written across all workers.
    pub fn written(&self) -> u64 {
        self.workers.iter().map(|w| w.written).sum()
    }

    /// Units that passed verification across all workers.
    pub fn verified(&self) -> u64 {
        self.workers.iter().map(|w| w.verified).sum()
    }

    /// Verification failures across all workers.
    pub fn failures(&self) -> usize {
        self.workers.iter().map(|w| w.failures.len()).sum()
    }

    /// No worker recorded a failure.
    pub fn is_clean(&self) -> bool {
        self.workers.iter().all(WorkerReport::is_clean)
    }
}

/// A verification job over a shared backend.
pub struct Job<B: IoBackend + 'static> {
    config: VerifyConfig,
    backend: Arc<B>,
}

impl<B: IoBackend + 'static> Job<B> {
    /// Create a job. The configuration is validated here.
    pub fn new(config: VerifyConfig, backend: Arc<B>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, backend })
    }

    /// The job configuration.
    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    /// Run every worker to completion. Worker `i` owns `files[i]`.
    ///
    /// Workers run concurrently and share nothing but the backend. The first
    /// worker error, in worker order, is returned.
    pub async fn run(&self, files: &[FileId]) -> Result<JobReport> {
        let workers = self.config.workers;
        if files.len() < workers {
            return Err(ConfigError::NotEnoughFiles {
                workers,
                files: files.len(),
            }
            .into());
        }

        info!(
            workers,
            algorithm = %self.config.algorithm,
            pattern = ?self.config.pattern,
            block_size = self.config.block_size,
            blocks = self.config.blocks,
            "starting verification job"
        );

        let mut handles = Vec::with_capacity(workers);
        for (worker, &file) in files.iter().take(workers).enumerate() {
            let state = ThreadVerifyState::from_config(&self.config, worker);
            let plan = PassPlan::from_config(&self.config, file);
            let mut verifier = Verifier::new(worker, state, Arc::clone(&self.backend));
            let span = info_span!("worker", worker, %file);
            handles.push(tokio::spawn(
                async move { verifier.run(&plan).await }.instrument(span),
            ));
        }

        let mut report = JobReport::default();
        let mut first_error = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(worker)) => report.workers.push(worker),
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    first_error.get_or_insert(EngineError::Worker(e.to_string()));
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        info!(
            written = report.written(),
            verified = report.verified(),
            failures = report.failures(),
            "verification job complete"
        );
        Ok(report)
    }
}
