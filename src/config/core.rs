use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::parallel::ParallelConfig;

/// Default loop budget per node on a single path
pub const DEFAULT_MAX_ITERATIONS_PER_NODE: usize = 5;

fn default_max_iterations_per_node() -> usize {
    DEFAULT_MAX_ITERATIONS_PER_NODE
}

/// Root configuration for pipeline validation.
///
/// The field names match the photo-admin `config.yaml`, so that file can be
/// loaded directly; unrelated sections (camera mappings, the pipeline itself)
/// are ignored here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidatorConfig {
    /// Extensions accepted for photo File nodes, e.g. `.cr3`, `.dng`
    #[serde(default)]
    pub photo_extensions: Vec<String>,

    /// Extensions accepted for sidecar File nodes, e.g. `.xmp`
    #[serde(default)]
    pub metadata_extensions: Vec<String>,

    /// Processing-method registry: method id to human-readable description
    #[serde(default)]
    pub processing_methods: BTreeMap<String, String>,

    /// Visits allowed per node on one path before the path is truncated
    #[serde(default = "default_max_iterations_per_node")]
    pub max_iterations_per_node: usize,

    /// Batch classification parallelism
    #[serde(default)]
    pub parallel: ParallelConfig,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            photo_extensions: Vec::new(),
            metadata_extensions: Vec::new(),
            processing_methods: BTreeMap::new(),
            max_iterations_per_node: DEFAULT_MAX_ITERATIONS_PER_NODE,
            parallel: ParallelConfig::default(),
        }
    }
}

impl ValidatorConfig {
    /// Photo and metadata extensions, lowercased.
    pub fn allowed_extensions(&self) -> BTreeSet<String> {
        self.photo_extensions
            .iter()
            .chain(&self.metadata_extensions)
            .map(|ext| ext.to_lowercase())
            .collect()
    }

    /// Registered method ids.
    pub fn allowed_method_ids(&self) -> BTreeSet<String> {
        self.processing_methods.keys().cloned().collect()
    }

    /// Check value constraints, returning every violation.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        if self.max_iterations_per_node == 0 {
            problems.push("max_iterations_per_node must be at least 1".to_string());
        }

        for ext in self.photo_extensions.iter().chain(&self.metadata_extensions) {
            if ext.is_empty() {
                problems.push("extensions must not be empty".to_string());
            } else if !ext.starts_with('.') {
                problems.push(format!("extension '{ext}' must start with '.'"));
            }
        }

        if self.processing_methods.contains_key("") {
            problems.push("processing method ids must not be empty".to_string());
        }

        if self.parallel.batch_size == Some(0) {
            problems.push("parallel.batch_size must be at least 1".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo_admin() -> ValidatorConfig {
        ValidatorConfig {
            photo_extensions: vec![".CR3".into(), ".dng".into()],
            metadata_extensions: vec![".xmp".into()],
            processing_methods: BTreeMap::from([(
                "DxO_DeepPRIME_XD2s".to_string(),
                "DNG Conversion with DeepPRIME".to_string(),
            )]),
            ..Default::default()
        }
    }

    #[test]
    fn test_allowed_extensions_lowercased_and_merged() {
        let allowed = photo_admin().allowed_extensions();
        assert_eq!(
            allowed.into_iter().collect::<Vec<_>>(),
            vec![".cr3", ".dng", ".xmp"]
        );
    }

    #[test]
    fn test_default_iteration_cap() {
        assert_eq!(ValidatorConfig::default().max_iterations_per_node, 5);
        let parsed: ValidatorConfig = serde_yaml::from_str("photo_extensions: ['.cr3']\n").unwrap();
        assert_eq!(parsed.max_iterations_per_node, 5);
        assert!(parsed.parallel.enabled);
    }

    #[test]
    fn test_validate_reports_all_problems() {
        let config = ValidatorConfig {
            photo_extensions: vec!["cr3".into(), String::new()],
            max_iterations_per_node: 0,
            ..photo_admin()
        };
        let problems = config.validate().unwrap_err();
        assert_eq!(problems.len(), 3);
        assert!(photo_admin().validate().is_ok());
    }
}
