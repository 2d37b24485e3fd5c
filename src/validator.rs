//! One-stop entry point tying configuration, validation, the path cache and
//! the batch runner together.

use std::path::Path;
use std::sync::Arc;

use crate::batch::{BatchRunner, CancelHandle, ValidationRun};
use crate::classify::{Classifier, ValidationResult};
use crate::config::{load_config, read_text_file, ValidatorConfig};
use crate::errors::{DefinitionError, Error, Result};
use crate::images::{flatten_image_groups, ImageGroup, SpecificImage};
use crate::observability::{set_phase, ValidationPhase};
use crate::paths::{CacheStats, PathCache, PathSet};
use crate::pipeline::PipelineDefinition;
use crate::validation::{validate, ValidatedPipeline, ValidationRules};

/// Validates pipeline definitions and classifies images against them.
///
/// Path sets are cached per definition, so repeated runs against the same
/// definition enumerate once.
#[derive(Debug)]
pub struct PipelineValidator {
    config: ValidatorConfig,
    rules: ValidationRules,
    cache: PathCache,
    runner: BatchRunner,
}

impl PipelineValidator {
    /// Fails when `config` does not pass [`ValidatorConfig::validate`].
    pub fn new(config: ValidatorConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|problems| Error::configuration(problems.join("; ")))?;
        Ok(Self {
            rules: ValidationRules::from_config(&config),
            runner: BatchRunner::new(config.parallel.clone()),
            cache: PathCache::new(),
            config,
        })
    }

    pub fn from_config_file(path: &Path) -> Result<Self> {
        Self::new(load_config(path)?)
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Read a definition from a JSON file, a standalone YAML file, or a
    /// photo-admin `config.yaml` carrying a `processing_pipelines` section.
    pub fn load_definition(&self, path: &Path) -> Result<PipelineDefinition> {
        let contents = read_text_file(path)
            .map_err(|e| Error::file_system("Failed to read pipeline definition", path, e))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            return PipelineDefinition::from_json_str(&contents);
        }

        let document: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        if document.get("processing_pipelines").is_some() {
            PipelineDefinition::from_config_yaml(&contents)
        } else {
            PipelineDefinition::from_yaml_str(&contents)
        }
    }

    /// Every problem with `definition`; empty when it can be enumerated.
    pub fn check(&self, definition: &PipelineDefinition) -> Vec<DefinitionError> {
        let _phase = set_phase(ValidationPhase::DefinitionParsing);
        match definition.to_graph() {
            Ok(graph) => validate(&graph, &self.rules),
            Err(errors) => errors.into_inner(),
        }
    }

    /// Build and validate the graph for `definition`.
    pub fn prepare(&self, definition: &PipelineDefinition) -> Result<ValidatedPipeline> {
        let _phase = set_phase(ValidationPhase::DefinitionParsing);
        let graph = definition.to_graph()?;
        let pipeline = ValidatedPipeline::new(graph, &self.rules)?;
        log::debug!(
            "Pipeline v{} validated: {} node(s)",
            pipeline.version(),
            pipeline.graph().len()
        );
        Ok(pipeline)
    }

    /// The cached path set for `pipeline`.
    pub fn paths(&mut self, pipeline: &ValidatedPipeline) -> Arc<PathSet> {
        self.cache
            .get_or_enumerate(pipeline, self.config.max_iterations_per_node)
    }

    pub fn classify_image(
        &mut self,
        pipeline: &ValidatedPipeline,
        image: &SpecificImage,
    ) -> ValidationResult {
        let path_set = self.paths(pipeline);
        Classifier::new(&path_set.paths).classify(image)
    }

    /// Classify every image of `groups` against `pipeline`.
    pub fn run(
        &mut self,
        pipeline: &ValidatedPipeline,
        groups: &[ImageGroup],
    ) -> Result<ValidationRun> {
        let images = flatten_image_groups(groups);
        self.run_images(pipeline, &images)
    }

    pub fn run_images(
        &mut self,
        pipeline: &ValidatedPipeline,
        images: &[SpecificImage],
    ) -> Result<ValidationRun> {
        let path_set = self.paths(pipeline);
        self.runner.run(images, &path_set)
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.runner.cancel_handle()
    }

    /// Forget cached paths for a definition version that has changed.
    pub fn invalidate(&mut self, version: u32) -> usize {
        self.cache.invalidate_version(version)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn config() -> ValidatorConfig {
        serde_yaml::from_str(indoc! {"
            photo_extensions: ['.cr3', '.dng']
            metadata_extensions: ['.xmp']
            processing_methods:
              DxO_DeepPRIME_XD2s: DNG conversion
        "})
        .unwrap()
    }

    const DEFINITION: &str = indoc! {"
        version: 2
        nodes:
          - {id: capture, type: Capture, name: Camera, outputs: [raw]}
          - {id: raw, type: File, name: Raw, extension: .CR3, outputs: [conv]}
          - {id: conv, type: Process, name: DNG, method_ids: [DxO_DeepPRIME_XD2s], outputs: [dng]}
          - {id: dng, type: File, name: DNG, extension: .DNG, outputs: [done]}
          - {id: done, type: Termination, name: Done, termination_type: Black Box Archive}
    "};

    #[test]
    fn test_prepare_and_cache() {
        let mut validator = PipelineValidator::new(config()).unwrap();
        let definition = PipelineDefinition::from_yaml_str(DEFINITION).unwrap();
        assert!(validator.check(&definition).is_empty());

        let pipeline = validator.prepare(&definition).unwrap();
        let image = SpecificImage::new(
            "AB3D",
            "0001",
            "",
            ["AB3D0001.CR3", "AB3D0001-DxO_DeepPRIME_XD2s.DNG"],
        );
        assert!(validator.classify_image(&pipeline, &image).is_archival_ready());
        validator.run_images(&pipeline, &[image]).unwrap();

        assert_eq!(validator.cache_stats().misses, 1);
        assert_eq!(validator.cache_stats().hits, 1);
        assert_eq!(validator.invalidate(2), 1);
    }

    #[test]
    fn test_prepare_rejects_bad_extension() {
        let validator = PipelineValidator::new(config()).unwrap();
        let definition =
            PipelineDefinition::from_yaml_str(&DEFINITION.replace(".DNG", ".HEIC")).unwrap();

        assert_eq!(validator.check(&definition).len(), 1);
        let err = validator.prepare(&definition).unwrap_err();
        let problems = err.definition_errors().unwrap();
        assert!(matches!(
            problems.iter().next(),
            Some(DefinitionError::InvalidExtension { .. })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut bad = config();
        bad.max_iterations_per_node = 0;
        assert!(matches!(
            PipelineValidator::new(bad),
            Err(Error::Configuration(_))
        ));
    }
}
