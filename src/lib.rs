//! Photo processing pipeline validation.
//!
//! A pipeline is a typed, possibly cyclic graph describing how a captured
//! photo becomes archived derivatives. This crate validates pipeline
//! definitions, enumerates every Capture-to-Termination path with a bounded
//! loop budget, derives the filenames each path implies, and classifies
//! images by comparing their actual files against those paths.
//!
//! ```rust
//! use pipeline_check::{
//!     classify, enumerate, Node, PipelineGraph, SpecificImage, ValidatedPipeline,
//!     ValidationRules, ValidationStatus,
//! };
//!
//! let graph = PipelineGraph::new(1, vec![
//!     Node::capture("capture", "Camera").with_outputs(["raw"]),
//!     Node::file("raw", "Raw", ".CR3").with_outputs(["done"]),
//!     Node::termination("done", "Archive", "Black Box Archive"),
//! ]).unwrap();
//! let rules = ValidationRules::new([".cr3"], Vec::<String>::new());
//! let pipeline = ValidatedPipeline::new(graph, &rules).unwrap();
//!
//! let paths = enumerate(&pipeline, 5);
//! let image = SpecificImage::new("AB3D", "0001", "", ["AB3D0001.CR3"]);
//! assert_eq!(classify(&image, &paths).overall_status, ValidationStatus::Consistent);
//! ```

pub mod batch;
pub mod classify;
pub mod config;
pub mod errors;
pub mod images;
pub mod observability;
pub mod paths;
pub mod pipeline;
pub mod validation;
pub mod validator;

pub use crate::batch::{BatchRunner, CancelHandle, RunSummary, ValidationRun};
pub use crate::classify::{
    classify, expected_files, Classifier, FileTemplate, TerminationMatchResult, ValidationResult,
    ValidationStatus,
};
pub use crate::config::{discover_config, load_config, ParallelConfig, ValidatorConfig};
pub use crate::errors::{DefinitionError, DefinitionErrors, Error, Result};
pub use crate::images::{
    flatten_image_groups, load_image_groups, ImageGroup, SeparateImage, SpecificImage,
};
pub use crate::paths::{
    enumerate, EnumerationDiagnostic, PathCache, PathEnumerator, PathSet, PipelinePath,
};
pub use crate::pipeline::{Node, NodeKind, NodeRecord, PipelineDefinition, PipelineGraph};
pub use crate::validation::{validate, ValidatedPipeline, ValidationRules};
pub use crate::validator::PipelineValidator;
