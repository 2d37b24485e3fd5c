//! How a batch of images is spread over worker threads.
//!
//! Images are handed to the workers in chunks. A chunk is the unit of
//! cancellation: once a chunk is submitted it runs to completion, and the
//! cancel flag is only consulted before the next one. Smaller chunks stop
//! sooner after a cancel; larger ones keep the pool busier.

use serde::{Deserialize, Serialize};

/// Images per chunk when nothing is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 256;

fn parallel_by_default() -> bool {
    true
}

fn default_chunk_size() -> Option<usize> {
    Some(DEFAULT_CHUNK_SIZE)
}

/// `[parallel]` section of the validator configuration.
///
/// ```rust
/// use pipeline_check::config::ParallelConfig;
///
/// let config = ParallelConfig {
///     enabled: true,
///     max_concurrency: Some(4),
///     batch_size: Some(64),
/// };
/// assert!(config.needs_dedicated_pool());
/// assert_eq!(config.effective_batch_size(), 64);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParallelConfig {
    /// `false` classifies every image on the calling thread
    #[serde(default = "parallel_by_default")]
    pub enabled: bool,

    /// Size of a pool built for this run; `None` shares rayon's global pool
    #[serde(default)]
    pub max_concurrency: Option<usize>,

    /// Chunk size; see the module docs for how it bounds cancel latency
    #[serde(default = "default_chunk_size")]
    pub batch_size: Option<usize>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: parallel_by_default(),
            max_concurrency: None,
            batch_size: default_chunk_size(),
        }
    }
}

impl ParallelConfig {
    /// Classify on the calling thread, still in chunks so a cancel is seen.
    pub fn sequential() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Thread count for a dedicated pool.
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, |n| n.get())
        })
    }

    /// Chunk size, never 0 so that every chunk makes progress.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_CHUNK_SIZE).max(1)
    }

    /// A run builds its own pool only for an explicit, non-zero thread count.
    pub fn needs_dedicated_pool(&self) -> bool {
        self.enabled && self.max_concurrency.is_some_and(|n| n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_share_global_pool() {
        let config = ParallelConfig::default();
        assert!(config.enabled);
        assert_eq!(config.batch_size, Some(DEFAULT_CHUNK_SIZE));
        assert!(!config.needs_dedicated_pool());
        assert!(config.effective_concurrency() >= 1);
    }

    #[test]
    fn test_sequential_never_builds_pool() {
        let config = ParallelConfig {
            max_concurrency: Some(4),
            ..ParallelConfig::sequential()
        };
        assert!(!config.enabled);
        assert!(!config.needs_dedicated_pool());
    }

    #[test]
    fn test_explicit_thread_count_builds_pool() {
        let four = ParallelConfig {
            max_concurrency: Some(4),
            ..ParallelConfig::default()
        };
        assert_eq!(four.effective_concurrency(), 4);
        assert!(four.needs_dedicated_pool());

        let zero = ParallelConfig {
            max_concurrency: Some(0),
            ..ParallelConfig::default()
        };
        assert!(!zero.needs_dedicated_pool());
    }

    #[test]
    fn test_chunk_size_fallbacks() {
        let zero = ParallelConfig {
            batch_size: Some(0),
            ..ParallelConfig::default()
        };
        assert_eq!(zero.effective_batch_size(), 1);

        let unset = ParallelConfig {
            batch_size: None,
            ..ParallelConfig::default()
        };
        assert_eq!(unset.effective_batch_size(), DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_empty_section_uses_defaults() {
        let parsed: ParallelConfig = toml::from_str("").unwrap();
        assert_eq!(parsed, ParallelConfig::default());

        let parsed: ParallelConfig = toml::from_str("enabled = false\nbatch_size = 32\n").unwrap();
        assert_eq!(parsed, ParallelConfig { batch_size: Some(32), ..ParallelConfig::sequential() });
    }
}
