//! Error types for pipeline definition handling and validation runs.
//!
//! Two layers are kept apart:
//!
//! - [`DefinitionError`]: a single structural problem with a pipeline
//!   definition. These are always collected into [`DefinitionErrors`] so that
//!   callers see every problem at once instead of fixing them one by one.
//! - [`Error`]: the crate-level error for I/O, parsing, configuration and
//!   thread-pool failures. Definition problems surface through
//!   [`Error::Definition`].
//!
//! Enumeration and classification never fail. Loop truncation and dead ends
//! are attached to paths as diagnostics, and malformed images degrade to an
//! `INCONSISTENT` verdict.
//!
//! # Example
//!
//! ```rust
//! use pipeline_check::errors::{DefinitionError, DefinitionErrors};
//!
//! let errors = DefinitionErrors::from(vec![
//!     DefinitionError::MissingTermination,
//!     DefinitionError::OrphanedNode { node_id: "xmp".into() },
//! ]);
//! assert_eq!(errors.len(), 2);
//! assert!(errors.to_string().contains("orphaned"));
//! ```

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A structural problem with a pipeline definition.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DefinitionError {
    /// A node record lacks a field required for its type
    #[error("node at index {index} ({}) is missing required field '{field}'", node_label(.node_id))]
    MissingField {
        index: usize,
        node_id: Option<String>,
        field: &'static str,
    },

    /// A node record declares a type outside the six known kinds
    #[error("unknown node type '{node_type}' (node: {node_id})")]
    UnknownNodeType { node_id: String, node_type: String },

    /// Two or more nodes share the same id
    #[error("duplicate node id '{node_id}' ({count} occurrences)")]
    DuplicateNodeId { node_id: String, count: usize },

    /// The graph does not have exactly one Capture node
    #[error("pipeline must have exactly one Capture node (found {}{})", .capture_ids.len(), id_list(.capture_ids))]
    CaptureCount { capture_ids: Vec<String> },

    /// The graph has no Termination node
    #[error("pipeline must have at least one Termination node")]
    MissingTermination,

    /// Every File node is optional, so no image could ever be incomplete
    #[error("pipeline must have at least one non-optional File node")]
    MissingRequiredFile,

    /// An `outputs` entry names a node that does not exist
    #[error("node '{node_id}' references non-existent output node '{target}'")]
    DanglingReference { node_id: String, target: String },

    /// A node cannot be reached from the Capture node
    #[error("node '{node_id}' is orphaned (unreachable from Capture)")]
    OrphanedNode { node_id: String },

    /// A File node's extension is not in the allowed extension set
    #[error("File node '{node_id}' has invalid extension '{extension}'. Must be one of: {}", .allowed.join(", "))]
    InvalidExtension {
        node_id: String,
        extension: String,
        allowed: Vec<String>,
    },

    /// A Process node references a method missing from the registry
    #[error("Process node '{node_id}' references undefined processing method '{method_id}'. Available methods: {}", available_methods(.available))]
    UnknownMethod {
        node_id: String,
        method_id: String,
        available: Vec<String>,
    },

    /// The Capture node has nowhere to go
    #[error("Capture node '{node_id}' must have at least one output")]
    CaptureWithoutOutputs { node_id: String },

    /// A Termination node continues to other nodes
    #[error("Termination node '{node_id}' must not have outputs (found {})", .outputs.join(", "))]
    TerminationWithOutputs {
        node_id: String,
        outputs: Vec<String>,
    },
}

impl DefinitionError {
    /// Id of the node the problem is attached to, when there is one.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::MissingField { node_id, .. } => node_id.as_deref(),
            Self::UnknownNodeType { node_id, .. }
            | Self::DuplicateNodeId { node_id, .. }
            | Self::DanglingReference { node_id, .. }
            | Self::OrphanedNode { node_id }
            | Self::InvalidExtension { node_id, .. }
            | Self::UnknownMethod { node_id, .. }
            | Self::CaptureWithoutOutputs { node_id }
            | Self::TerminationWithOutputs { node_id, .. } => Some(node_id),
            Self::CaptureCount { .. } | Self::MissingTermination | Self::MissingRequiredFile => None,
        }
    }
}

fn node_label(node_id: &Option<String>) -> String {
    match node_id {
        Some(id) => format!("id '{id}'"),
        None => "no id".to_string(),
    }
}

fn id_list(ids: &[String]) -> String {
    if ids.is_empty() {
        String::new()
    } else {
        format!(": {}", ids.join(", "))
    }
}

fn available_methods(available: &[String]) -> String {
    if available.is_empty() {
        "(none defined)".to_string()
    } else {
        available.join(", ")
    }
}

/// Every structural problem found in one pipeline definition.
///
/// Never empty when returned as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DefinitionErrors(Vec<DefinitionError>);

impl DefinitionErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DefinitionError> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<DefinitionError> {
        self.0
    }

    /// `Ok(())` when no problems were collected.
    pub fn into_result(self) -> std::result::Result<(), Self> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<Vec<DefinitionError>> for DefinitionErrors {
    fn from(errors: Vec<DefinitionError>) -> Self {
        Self(errors)
    }
}

impl IntoIterator for DefinitionErrors {
    type Item = DefinitionError;
    type IntoIter = std::vec::IntoIter<DefinitionError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for DefinitionErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} problem(s) in pipeline definition", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DefinitionErrors {}

/// Main error type for pipeline-check operations
#[derive(Debug, Error)]
pub enum Error {
    /// File system related errors
    #[error("File system error: {message}")]
    FileSystem {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Input that could not be parsed into the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The pipeline definition is structurally invalid
    #[error(transparent)]
    Definition(#[from] DefinitionErrors),

    /// Worker pool construction errors
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// TOML errors
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a file system error with path context
    pub fn file_system(
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            message: message.into(),
            path: Some(path.into()),
            source: Some(source),
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Structural problems, when this error carries them.
    pub fn definition_errors(&self) -> Option<&DefinitionErrors> {
        match self {
            Self::Definition(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_count_message_names_ids() {
        let err = DefinitionError::CaptureCount {
            capture_ids: vec!["cap_a".into(), "cap_b".into()],
        };
        assert_eq!(
            err.to_string(),
            "pipeline must have exactly one Capture node (found 2: cap_a, cap_b)"
        );

        let none = DefinitionError::CaptureCount {
            capture_ids: Vec::new(),
        };
        assert_eq!(
            none.to_string(),
            "pipeline must have exactly one Capture node (found 0)"
        );
    }

    #[test]
    fn test_unknown_method_without_registry() {
        let err = DefinitionError::UnknownMethod {
            node_id: "dng".into(),
            method_id: "Sharpen".into(),
            available: Vec::new(),
        };
        assert!(err.to_string().ends_with("Available methods: (none defined)"));
        assert_eq!(err.node_id(), Some("dng"));
    }

    #[test]
    fn test_missing_field_without_id() {
        let err = DefinitionError::MissingField {
            index: 3,
            node_id: None,
            field: "id",
        };
        assert_eq!(
            err.to_string(),
            "node at index 3 (no id) is missing required field 'id'"
        );
        assert_eq!(err.node_id(), None);
    }

    #[test]
    fn test_definition_errors_display_lists_all() {
        let errors = DefinitionErrors::from(vec![
            DefinitionError::MissingTermination,
            DefinitionError::DanglingReference {
                node_id: "capture".into(),
                target: "ghost".into(),
            },
        ]);
        let rendered = errors.to_string();
        assert!(rendered.starts_with("2 problem(s)"));
        assert!(rendered.contains("Termination"));
        assert!(rendered.contains("'ghost'"));
    }

    #[test]
    fn test_into_result() {
        assert!(DefinitionErrors::default().into_result().is_ok());
        let err = DefinitionErrors::from(vec![DefinitionError::MissingTermination])
            .into_result()
            .unwrap_err();
        assert_eq!(err.len(), 1);
    }

    #[test]
    fn test_definition_error_serializes_with_kind() {
        let json = serde_json::to_value(DefinitionError::OrphanedNode {
            node_id: "xmp".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "orphaned_node");
        assert_eq!(json["node_id"], "xmp");
    }

    #[test]
    fn test_crate_error_exposes_definition_errors() {
        let err: Error = DefinitionErrors::from(vec![DefinitionError::MissingTermination]).into();
        assert_eq!(err.definition_errors().map(|e| e.len()), Some(1));
        assert!(Error::parse("bad").definition_errors().is_none());
    }
}
