//! Expected-file derivation and per-image classification.

pub mod classifier;
pub mod expected;

pub use classifier::{
    classify, Classifier, TerminationMatchResult, ValidationResult, ValidationStatus,
};
pub use expected::{expected_files, file_templates, required_files, FileTemplate, TemplateBuilder};
