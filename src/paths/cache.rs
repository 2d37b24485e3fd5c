//! Memoized path sets.
//!
//! Enumeration runs once per pipeline definition; the resulting path set is
//! shared read-only by every classification against that definition. Entries
//! are keyed by the store's version number, the SHA-256 fingerprint of the
//! node list (so an edited definition that kept its version number is not
//! served stale paths), and the iteration cap.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::enumerator::PathEnumerator;
use super::path::PipelinePath;
use crate::validation::ValidatedPipeline;

/// Every path of one pipeline definition, plus what produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathSet {
    pub pipeline_version: u32,
    pub fingerprint: String,
    pub max_iterations_per_node: usize,
    pub paths: Vec<PipelinePath>,
}

impl PathSet {
    /// Enumerate `pipeline` without caching.
    pub fn enumerate(pipeline: &ValidatedPipeline, max_iterations_per_node: usize) -> Self {
        let enumerator = PathEnumerator::new(max_iterations_per_node);
        Self {
            pipeline_version: pipeline.version(),
            fingerprint: pipeline.graph().fingerprint(),
            max_iterations_per_node: enumerator.max_iterations_per_node(),
            paths: enumerator.enumerate(pipeline),
        }
    }

    pub fn complete_paths(&self) -> impl Iterator<Item = &PipelinePath> {
        self.paths.iter().filter(|path| !path.truncated())
    }

    pub fn truncated_paths(&self) -> impl Iterator<Item = &PipelinePath> {
        self.paths.iter().filter(|path| path.truncated())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    version: u32,
    fingerprint: String,
    max_iterations_per_node: usize,
}

/// Cache hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

/// Path sets by definition version, fingerprint and iteration cap.
#[derive(Debug, Default)]
pub struct PathCache {
    entries: HashMap<CacheKey, Arc<PathSet>>,
    hits: usize,
    misses: usize,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached path set, enumerating on a miss.
    pub fn get_or_enumerate(
        &mut self,
        pipeline: &ValidatedPipeline,
        max_iterations_per_node: usize,
    ) -> Arc<PathSet> {
        let key = CacheKey {
            version: pipeline.version(),
            fingerprint: pipeline.graph().fingerprint(),
            max_iterations_per_node: PathEnumerator::new(max_iterations_per_node)
                .max_iterations_per_node(),
        };

        if let Some(cached) = self.entries.get(&key) {
            self.hits += 1;
            log::debug!("Path cache hit for pipeline v{}", key.version);
            return Arc::clone(cached);
        }

        self.misses += 1;
        log::debug!(
            "Path cache miss for pipeline v{} ({})",
            key.version,
            &key.fingerprint[..12.min(key.fingerprint.len())]
        );
        let path_set = Arc::new(PathSet::enumerate(pipeline, max_iterations_per_node));
        self.entries.insert(key, Arc::clone(&path_set));
        path_set
    }

    /// Drop every entry for a definition version.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_version(&mut self, version: u32) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.version != version);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Node, PipelineGraph};
    use crate::validation::ValidationRules;

    fn pipeline(version: u32, extension: &str) -> ValidatedPipeline {
        let graph = PipelineGraph::new(
            version,
            vec![
                Node::capture("capture", "Camera").with_outputs(["raw"]),
                Node::file("raw", "Raw", extension).with_outputs(["done"]),
                Node::termination("done", "Done", "Black Box Archive"),
            ],
        )
        .unwrap();
        ValidatedPipeline::new(graph, &ValidationRules::new([".cr3", ".nef"], Vec::<String>::new()))
            .unwrap()
    }

    #[test]
    fn test_second_lookup_hits() {
        let mut cache = PathCache::new();
        let p = pipeline(1, ".CR3");
        let first = cache.get_or_enumerate(&p, 5);
        let second = cache.get_or_enumerate(&p, 5);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                entries: 1
            }
        );
    }

    #[test]
    fn test_key_includes_cap_and_fingerprint() {
        let mut cache = PathCache::new();
        cache.get_or_enumerate(&pipeline(1, ".CR3"), 5);
        cache.get_or_enumerate(&pipeline(1, ".CR3"), 2);
        // Same version, edited content
        cache.get_or_enumerate(&pipeline(1, ".NEF"), 5);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_invalidate_version() {
        let mut cache = PathCache::new();
        cache.get_or_enumerate(&pipeline(1, ".CR3"), 5);
        cache.get_or_enumerate(&pipeline(1, ".CR3"), 3);
        cache.get_or_enumerate(&pipeline(2, ".CR3"), 5);

        assert_eq!(cache.invalidate_version(1), 2);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_path_set_records_effective_cap() {
        let set = PathSet::enumerate(&pipeline(4, ".CR3"), 0);
        assert_eq!(set.max_iterations_per_node, 1);
        assert_eq!(set.pipeline_version, 4);
        assert_eq!(set.complete_paths().count(), 1);
        assert_eq!(set.truncated_paths().count(), 0);
    }
}
