//! Batch classification over rayon.
//!
//! Images are submitted in chunks of `batch_size`. Each chunk is classified
//! in parallel (or sequentially when parallelism is disabled) against one
//! shared path set. Cancellation stops submission between chunks; results
//! for images already classified are kept.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::classify::{Classifier, ValidationResult, ValidationStatus};
use crate::config::ParallelConfig;
use crate::errors::{Error, Result};
use crate::images::SpecificImage;
use crate::observability::{
    get_current_context, set_phase, set_pipeline_version, RunProgress, ValidationPhase,
};
use crate::paths::PathSet;

/// Stops a running batch from submitting further images.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clear a previous cancellation so the runner can be reused.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Status counts for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_images: usize,
    pub consistent: usize,
    pub consistent_with_warning: usize,
    pub partial: usize,
    pub inconsistent: usize,
    /// Images archival-ready per termination type
    pub archival_ready: BTreeMap<String, usize>,
}

impl RunSummary {
    pub fn from_results(results: &[ValidationResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, result| {
            summary.total_images += 1;
            match result.overall_status {
                ValidationStatus::Consistent => summary.consistent += 1,
                ValidationStatus::ConsistentWithWarning => summary.consistent_with_warning += 1,
                ValidationStatus::Partial => summary.partial += 1,
                ValidationStatus::Inconsistent => summary.inconsistent += 1,
            }
            for termination_type in &result.archival_ready_for {
                *summary
                    .archival_ready
                    .entry(termination_type.clone())
                    .or_insert(0) += 1;
            }
            summary
        })
    }
}

/// Everything needed to reproduce and report one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationRun {
    pub pipeline_version: u32,
    pub pipeline_fingerprint: String,
    pub max_iterations_per_node: usize,
    pub started_at: DateTime<Utc>,
    pub cancelled: bool,
    pub results: Vec<ValidationResult>,
    pub summary: RunSummary,
}

impl ValidationRun {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Classifies batches of images against a path set.
#[derive(Debug, Default)]
pub struct BatchRunner {
    config: ParallelConfig,
    cancel: CancelHandle,
}

impl BatchRunner {
    pub fn new(config: ParallelConfig) -> Self {
        Self {
            config,
            cancel: CancelHandle::default(),
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn config(&self) -> &ParallelConfig {
        &self.config
    }

    pub fn run(&self, images: &[SpecificImage], path_set: &PathSet) -> Result<ValidationRun> {
        let _phase = set_phase(ValidationPhase::Classification);
        let _version = set_pipeline_version(path_set.pipeline_version);
        let started_at = Utc::now();
        let classifier = Classifier::new(&path_set.paths);
        let progress = RunProgress::new(images.len());

        let (results, cancelled) = if self.config.needs_dedicated_pool() {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.effective_concurrency())
                .build()
                .map_err(|e| Error::Concurrency(format!("Failed to build worker pool: {e}")))?;
            pool.install(|| self.classify_all(images, &classifier, &progress))
        } else {
            self.classify_all(images, &classifier, &progress)
        };

        let summary = RunSummary::from_results(&results);
        if cancelled {
            log::warn!(
                "[{}] Validation cancelled after {} of {} image(s)",
                get_current_context(),
                results.len(),
                images.len()
            );
        }
        log::info!(
            "Validated {} image(s) against pipeline v{}: {} consistent, {} with warnings, {} partial, {} inconsistent",
            summary.total_images,
            path_set.pipeline_version,
            summary.consistent,
            summary.consistent_with_warning,
            summary.partial,
            summary.inconsistent
        );

        Ok(ValidationRun {
            pipeline_version: path_set.pipeline_version,
            pipeline_fingerprint: path_set.fingerprint.clone(),
            max_iterations_per_node: path_set.max_iterations_per_node,
            started_at,
            cancelled,
            results,
            summary,
        })
    }

    fn classify_all(
        &self,
        images: &[SpecificImage],
        classifier: &Classifier<'_>,
        progress: &RunProgress,
    ) -> (Vec<ValidationResult>, bool) {
        let mut results = Vec::with_capacity(images.len());

        for chunk in images.chunks(self.config.effective_batch_size()) {
            if self.cancel.is_cancelled() {
                return (results, true);
            }

            let classify_one = |image: &SpecificImage| {
                let result = classifier.classify(image);
                progress.increment_processed();
                result
            };
            if self.config.enabled {
                results.par_extend(chunk.par_iter().map(classify_one));
            } else {
                results.extend(chunk.iter().map(classify_one));
            }

            let (processed, total) = progress.get();
            log::debug!("Classified {processed}/{total} image(s)");
        }

        (results, false)
    }
}
