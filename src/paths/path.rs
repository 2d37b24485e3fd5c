use serde::Serialize;
use std::fmt;

use crate::classify::FileTemplate;

/// Why a path stopped before reaching a Termination node.
///
/// Non-fatal: the diagnostic travels with the affected path instead of
/// aborting enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnumerationDiagnostic {
    /// The path tried to enter a node it had already visited
    /// `max_iterations` times
    LoopLimit {
        node_id: String,
        max_iterations: usize,
    },
    /// A non-Termination node with no outputs
    DeadEnd { node_id: String, node_type: String },
    /// An output id that does not resolve; only possible for graphs that
    /// bypassed validation
    UnresolvedNode { node_id: String },
}

impl fmt::Display for EnumerationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoopLimit {
                node_id,
                max_iterations,
            } => write!(
                f,
                "loop truncated at node '{node_id}': visited {max_iterations} time(s) on this path (max_iterations_per_node = {max_iterations})"
            ),
            Self::DeadEnd { node_id, node_type } => write!(
                f,
                "dead end at {node_type} node '{node_id}': no outputs and not a Termination"
            ),
            Self::UnresolvedNode { node_id } => {
                write!(f, "path references unknown node '{node_id}'")
            }
        }
    }
}

/// Termination reached by a complete path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminationRef {
    pub id: String,
    pub termination_type: String,
}

/// One walk from the Capture node to a Termination or a truncation point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelinePath {
    /// Node ids in walk order; a loop-truncated path ends with the node it
    /// was refused re-entry to
    pub node_ids: Vec<String>,
    /// Set only for complete paths
    pub termination: Option<TerminationRef>,
    /// Concatenated suffix fragments of every Process node walked
    pub process_suffix: String,
    /// Expected-file templates, one per File node walked
    pub files: Vec<FileTemplate>,
    pub truncation: Option<EnumerationDiagnostic>,
    /// For loop-truncated paths: Termination ids still reachable from the
    /// truncation point, in definition order
    pub reachable_terminations: Vec<String>,
}

impl PipelinePath {
    pub fn len(&self) -> usize {
        self.node_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }

    pub fn truncated(&self) -> bool {
        self.truncation.is_some()
    }

    pub fn truncation_note(&self) -> Option<String> {
        self.truncation.as_ref().map(ToString::to_string)
    }

    pub fn termination_id(&self) -> Option<&str> {
        self.termination.as_ref().map(|t| t.id.as_str())
    }

    /// How many times `node_id` occurs on this path.
    pub fn visits(&self, node_id: &str) -> usize {
        self.node_ids.iter().filter(|id| *id == node_id).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_limit_note_names_node_and_cap() {
        let note = EnumerationDiagnostic::LoopLimit {
            node_id: "edit_process".into(),
            max_iterations: 5,
        }
        .to_string();
        assert!(note.contains("'edit_process'"));
        assert!(note.contains("max_iterations_per_node = 5"));
    }

    #[test]
    fn test_truncation_accessors() {
        let path = PipelinePath {
            node_ids: vec!["capture".into(), "xmp".into()],
            termination: None,
            process_suffix: String::new(),
            files: Vec::new(),
            truncation: Some(EnumerationDiagnostic::DeadEnd {
                node_id: "xmp".into(),
                node_type: "File".into(),
            }),
            reachable_terminations: Vec::new(),
        };
        assert!(path.truncated());
        assert_eq!(
            path.truncation_note().as_deref(),
            Some("dead end at File node 'xmp': no outputs and not a Termination")
        );
        assert_eq!(path.termination_id(), None);
        assert_eq!(path.visits("xmp"), 1);
    }
}
