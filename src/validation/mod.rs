//! Structural validation of pipeline graphs.
//!
//! Every check runs independently and all findings are returned together;
//! validation never stops at the first problem. Cycles are a supported graph
//! shape and are not reported.
//!
//! ```rust
//! use pipeline_check::pipeline::{Node, PipelineGraph};
//! use pipeline_check::validation::{validate, ValidationRules};
//!
//! let graph = PipelineGraph::new(1, vec![
//!     Node::capture("capture", "Camera").with_outputs(["raw"]),
//!     Node::file("raw", "Raw", ".CR3").with_outputs(["done"]),
//!     Node::termination("done", "Archive", "Black Box Archive"),
//! ]).unwrap();
//! let rules = ValidationRules::new([".cr3"], Vec::<String>::new());
//! assert!(validate(&graph, &rules).is_empty());
//! ```

use std::collections::BTreeSet;

use crate::config::ValidatorConfig;
use crate::errors::{DefinitionError, DefinitionErrors};
use crate::observability::{set_phase, ValidationPhase};
use crate::pipeline::{NodeKind, PipelineGraph};

/// Allow-lists a graph is checked against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationRules {
    /// Lowercased extensions, leading dot included
    allowed_extensions: BTreeSet<String>,
    allowed_method_ids: BTreeSet<String>,
}

impl ValidationRules {
    pub fn new<E, M, S, T>(allowed_extensions: E, allowed_method_ids: M) -> Self
    where
        E: IntoIterator<Item = S>,
        M: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: Into<String>,
    {
        Self {
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|ext| ext.as_ref().to_lowercase())
                .collect(),
            allowed_method_ids: allowed_method_ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self {
            allowed_extensions: config.allowed_extensions(),
            allowed_method_ids: config.allowed_method_ids(),
        }
    }

    pub fn allows_extension(&self, extension: &str) -> bool {
        self.allowed_extensions.contains(&extension.to_lowercase())
    }

    /// The empty id is always allowed; it means "no suffix".
    pub fn allows_method(&self, method_id: &str) -> bool {
        method_id.is_empty() || self.allowed_method_ids.contains(method_id)
    }
}

/// Run every structural check against `graph`.
///
/// An empty result means the graph is valid.
pub fn validate(graph: &PipelineGraph, rules: &ValidationRules) -> Vec<DefinitionError> {
    let _phase = set_phase(ValidationPhase::StructuralValidation);

    let mut issues = Vec::new();
    check_capture(graph, &mut issues);
    check_terminations(graph, &mut issues);
    check_required_file(graph, &mut issues);
    check_references(graph, &mut issues);
    check_reachability(graph, &mut issues);
    check_extensions(graph, rules, &mut issues);
    check_methods(graph, rules, &mut issues);

    if issues.is_empty() {
        log::debug!(
            "Pipeline v{} passed structural validation ({} nodes)",
            graph.version(),
            graph.len()
        );
    } else {
        log::debug!(
            "Pipeline v{} has {} structural issue(s)",
            graph.version(),
            issues.len()
        );
    }
    issues
}

fn check_capture(graph: &PipelineGraph, issues: &mut Vec<DefinitionError>) {
    let captures: Vec<_> = graph.nodes().filter(|node| node.is_capture()).collect();
    if captures.len() != 1 {
        issues.push(DefinitionError::CaptureCount {
            capture_ids: captures.iter().map(|node| node.id.clone()).collect(),
        });
    }
    issues.extend(
        captures
            .iter()
            .filter(|node| node.outputs.is_empty())
            .map(|node| DefinitionError::CaptureWithoutOutputs {
                node_id: node.id.clone(),
            }),
    );
}

fn check_terminations(graph: &PipelineGraph, issues: &mut Vec<DefinitionError>) {
    let mut found = false;
    for node in graph.terminations() {
        found = true;
        if !node.outputs.is_empty() {
            issues.push(DefinitionError::TerminationWithOutputs {
                node_id: node.id.clone(),
                outputs: node.outputs.clone(),
            });
        }
    }
    if !found {
        issues.push(DefinitionError::MissingTermination);
    }
}

fn check_required_file(graph: &PipelineGraph, issues: &mut Vec<DefinitionError>) {
    if !graph.nodes().any(|node| node.is_required_file()) {
        issues.push(DefinitionError::MissingRequiredFile);
    }
}

fn check_references(graph: &PipelineGraph, issues: &mut Vec<DefinitionError>) {
    for node in graph.nodes() {
        for target in node.outputs.iter().filter(|target| !graph.contains(target)) {
            issues.push(DefinitionError::DanglingReference {
                node_id: node.id.clone(),
                target: target.clone(),
            });
        }
    }
}

fn check_reachability(graph: &PipelineGraph, issues: &mut Vec<DefinitionError>) {
    // Without a unique entry point reachability is meaningless
    let Some(capture_id) = graph.capture_id() else {
        return;
    };
    let reachable = graph.reachable_from(capture_id);
    let orphaned: BTreeSet<&str> = graph
        .nodes()
        .map(|node| node.id.as_str())
        .filter(|id| !reachable.contains(id))
        .collect();
    issues.extend(
        orphaned
            .into_iter()
            .map(|node_id| DefinitionError::OrphanedNode {
                node_id: node_id.to_string(),
            }),
    );
}

fn check_extensions(graph: &PipelineGraph, rules: &ValidationRules, issues: &mut Vec<DefinitionError>) {
    for node in graph.nodes() {
        if let NodeKind::File { extension, .. } = &node.kind {
            if !rules.allows_extension(extension) {
                issues.push(DefinitionError::InvalidExtension {
                    node_id: node.id.clone(),
                    extension: extension.clone(),
                    allowed: rules.allowed_extensions.iter().cloned().collect(),
                });
            }
        }
    }
}

fn check_methods(graph: &PipelineGraph, rules: &ValidationRules, issues: &mut Vec<DefinitionError>) {
    for node in graph.nodes() {
        if let NodeKind::Process { method_ids } = &node.kind {
            for method_id in method_ids.iter().filter(|id| !rules.allows_method(id)) {
                issues.push(DefinitionError::UnknownMethod {
                    node_id: node.id.clone(),
                    method_id: method_id.clone(),
                    available: rules.allowed_method_ids.iter().cloned().collect(),
                });
            }
        }
    }
}

/// A graph that passed every structural check.
///
/// This is the only input the path enumerator accepts, so a definition with
/// any [`DefinitionError`] can never be enumerated or classified.
#[derive(Debug, Clone)]
pub struct ValidatedPipeline {
    graph: PipelineGraph,
    capture_id: String,
}

impl ValidatedPipeline {
    pub fn new(graph: PipelineGraph, rules: &ValidationRules) -> Result<Self, DefinitionErrors> {
        DefinitionErrors::from(validate(&graph, rules)).into_result()?;
        let capture_id = graph
            .capture_id()
            .map(str::to_string)
            .ok_or_else(|| {
                DefinitionErrors::from(vec![DefinitionError::CaptureCount {
                    capture_ids: graph.capture_ids().into_iter().map(String::from).collect(),
                }])
            })?;
        Ok(Self { graph, capture_id })
    }

    pub fn graph(&self) -> &PipelineGraph {
        &self.graph
    }

    pub fn capture_id(&self) -> &str {
        &self.capture_id
    }

    pub fn version(&self) -> u32 {
        self.graph.version()
    }

    pub fn into_graph(self) -> PipelineGraph {
        self.graph
    }
}
