// THEORY:
// The `ParallelPipeline` fans a batch of sources out to one task per image and
// joins every one of them before returning.
//
// Key architectural principles:
// 1.  **Eager fan-out**: a task is spawned per source as soon as the batch starts.
//     The scan itself runs on the blocking pool; a semaphore caps how many
//     images are being scanned at once, since each holds a full pixel grid.
// 2.  **Nothing shared but the profile**: every task owns its source, its grid
//     and its result. The `PipelineConfig` is `Copy` and moved into each task.
// 3.  **Index-tagged join**: tasks report `(index, job)` on a channel and the
//     join writes each job into its slot, so the batch comes back in input order
//     whatever order the tasks finish in.
// 4.  **Full join**: the call returns only after every task ended. A failing
//     image reports its own error; a task that died reports `JobAborted` in its
//     slot. Nothing is retried and nothing cancels the rest of the batch.

use crate::core_modules::flood_fill::FilterProfile;
use crate::error::SieveError;
use crate::pipeline::{ImageJob, ImageSource, PipelineConfig, run_job};
use crate::report::{self, BatchReport};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Semaphore, mpsc};
use tracing::{info, warn};

/// The jobs of one batch, in the order their sources were submitted.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub jobs: Vec<ImageJob>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImageJob> {
        self.jobs.iter()
    }

    pub fn succeeded(&self) -> usize {
        self.jobs.iter().filter(|job| job.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    pub fn report(&self) -> BatchReport {
        BatchReport::from(self)
    }
}

impl IntoIterator for BatchResult {
    type Item = ImageJob;
    type IntoIter = std::vec::IntoIter<ImageJob>;

    fn into_iter(self) -> Self::IntoIter {
        self.jobs.into_iter()
    }
}

pub struct ParallelPipeline {
    config: PipelineConfig,
}

impl ParallelPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Processes every source and waits for all of them.
    pub async fn process_batch(&self, sources: Vec<ImageSource>) -> BatchResult {
        self.process_batch_with(sources, run_job).await
    }

    /// Same as `process_batch`, with `run` executed on the blocking pool for each source.
    pub(crate) async fn process_batch_with(
        &self,
        sources: Vec<ImageSource>,
        run: fn(ImageSource, &FilterProfile) -> ImageJob,
    ) -> BatchResult {
        let started = Instant::now();
        let total = sources.len();
        let config = self.config;
        let permits = Arc::new(Semaphore::new(config.max_in_flight.max(1)));
        let (result_sender, mut result_receiver) = mpsc::unbounded_channel::<(usize, ImageJob)>();

        info!(images = total, max_in_flight = config.max_in_flight, profile = ?config.profile, "batch started");

        // --- 1. Fan out ---
        let mut names = Vec::with_capacity(total);
        let mut workers = Vec::with_capacity(total);
        for (index, source) in sources.into_iter().enumerate() {
            names.push(source.name().to_string());
            let permits = permits.clone();
            let result_sender = result_sender.clone();

            workers.push(tokio::spawn(async move {
                let name = source.name().to_string();
                let job = match permits.acquire_owned().await {
                    Ok(_permit) => {
                        let profile = config.profile;
                        match tokio::task::spawn_blocking(move || run(source, &profile)).await {
                            Ok(job) => job,
                            Err(err) => ImageJob::failed(
                                name.clone(),
                                SieveError::JobAborted {
                                    name,
                                    detail: err.to_string(),
                                },
                            ),
                        }
                    }
                    Err(err) => ImageJob::failed(
                        name.clone(),
                        SieveError::JobAborted {
                            name,
                            detail: err.to_string(),
                        },
                    ),
                };
                let _ = result_sender.send((index, job));
            }));
        }
        drop(result_sender);

        // --- 2. Join, placing each job in its input slot ---
        let mut slots: Vec<Option<ImageJob>> = (0..total).map(|_| None).collect();
        while let Some((index, job)) = result_receiver.recv().await {
            slots[index] = Some(job);
        }
        for joined in futures::future::join_all(workers).await {
            if let Err(err) = joined {
                warn!(error = %err, "batch task ended abnormally");
            }
        }

        let jobs: Vec<ImageJob> = slots
            .into_iter()
            .zip(names)
            .map(|(slot, name)| {
                slot.unwrap_or_else(|| {
                    ImageJob::failed(
                        name.clone(),
                        SieveError::JobAborted {
                            name,
                            detail: "task ended without reporting".to_string(),
                        },
                    )
                })
            })
            .collect();
        let result = BatchResult { jobs };

        for job in result.iter() {
            if let Some(error) = job.error() {
                warn!(name = %job.name, kind = error.kind(), "image failed: {}", error);
            }
        }
        info!(
            images = result.len(),
            succeeded = result.succeeded(),
            failed = result.failed(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch joined"
        );

        // --- 3. Report ---
        if config.logging {
            report::log_batch(&result);
        }

        result
    }
}
