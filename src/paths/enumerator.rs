//! Bounded depth-first path enumeration.
//!
//! Pipelines may loop (a Branching node can lead back into an earlier
//! Process node), so a plain acyclic DFS would either miss paths or never
//! finish. The walk carries a visit counter per node that is local to the
//! current path: entering a node that has already been visited
//! `max_iterations_per_node` times on this path ends the branch with a
//! truncated path. Every path therefore has length at most
//! `nodes * max_iterations_per_node + 1`, and enumeration terminates for any
//! graph shape.
//!
//! Output order follows the declared order of each node's `outputs`, so
//! repeated enumeration of the same graph is identical.

use std::collections::HashMap;

use super::path::{EnumerationDiagnostic, PipelinePath, TerminationRef};
use crate::classify::TemplateBuilder;
use crate::config::DEFAULT_MAX_ITERATIONS_PER_NODE;
use crate::observability::{get_current_context, set_phase, set_pipeline_version, ValidationPhase};
use crate::pipeline::{Node, NodeKind, PipelineGraph};
use crate::validation::ValidatedPipeline;

/// Enumerates every Capture-to-Termination path of a validated pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathEnumerator {
    max_iterations_per_node: usize,
}

impl Default for PathEnumerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS_PER_NODE)
    }
}

impl PathEnumerator {
    /// A cap of 0 is treated as 1; every node can be entered at least once.
    pub fn new(max_iterations_per_node: usize) -> Self {
        Self {
            max_iterations_per_node: max_iterations_per_node.max(1),
        }
    }

    pub fn max_iterations_per_node(&self) -> usize {
        self.max_iterations_per_node
    }

    pub fn enumerate(&self, pipeline: &ValidatedPipeline) -> Vec<PipelinePath> {
        let _phase = set_phase(ValidationPhase::PathEnumeration);
        let _version = set_pipeline_version(pipeline.version());

        let mut walk = Walk::new(pipeline.graph(), self.max_iterations_per_node);
        walk.run(pipeline.capture_id());
        let paths = walk.paths;

        let truncated = paths.iter().filter(|p| p.truncated()).count();
        log::debug!(
            "Enumerated {} path(s) for pipeline v{} ({} truncated, max {} iteration(s) per node)",
            paths.len(),
            pipeline.version(),
            truncated,
            self.max_iterations_per_node
        );
        if truncated > 0 {
            log::warn!(
                "[{}] {truncated} path(s) were truncated by loops or dead ends",
                get_current_context()
            );
        }
        paths
    }
}

/// Convenience wrapper around [`PathEnumerator::enumerate`].
pub fn enumerate(pipeline: &ValidatedPipeline, max_iterations_per_node: usize) -> Vec<PipelinePath> {
    PathEnumerator::new(max_iterations_per_node).enumerate(pipeline)
}

/// One node on the current path and the next output to explore from it.
struct Frame<'g> {
    node: &'g Node,
    next_output: usize,
    /// Length of the accumulated suffix before this node's fragment
    suffix_len: usize,
}

/// Mutable state of one depth-first walk.
///
/// The walk keeps its own frame stack, so path length is bounded by the
/// visit cap rather than by the thread's call stack.
struct Walk<'g> {
    graph: &'g PipelineGraph,
    templates: TemplateBuilder<'g>,
    max_iterations: usize,
    frames: Vec<Frame<'g>>,
    path: Vec<&'g str>,
    visits: HashMap<&'g str, usize>,
    suffix: String,
    paths: Vec<PipelinePath>,
    reachable_terminations: HashMap<&'g str, Vec<String>>,
}

impl<'g> Walk<'g> {
    fn new(graph: &'g PipelineGraph, max_iterations: usize) -> Self {
        Self {
            graph,
            templates: TemplateBuilder::new(graph),
            max_iterations,
            frames: Vec::new(),
            path: Vec::new(),
            visits: HashMap::new(),
            suffix: String::new(),
            paths: Vec::new(),
            reachable_terminations: HashMap::new(),
        }
    }

    fn run(&mut self, start: &'g str) {
        self.enter(start);
        while let Some(frame) = self.frames.last_mut() {
            let node = frame.node;
            match node.outputs.get(frame.next_output) {
                Some(output) => {
                    frame.next_output += 1;
                    self.enter(output);
                }
                None => self.leave(),
            }
        }
    }

    /// Step onto `node_id`. Pushes a frame unless the branch ends right here.
    fn enter(&mut self, node_id: &'g str) {
        let graph = self.graph;
        let Some(node) = graph.get(node_id) else {
            self.path.push(node_id);
            self.emit_truncated(EnumerationDiagnostic::UnresolvedNode {
                node_id: node_id.to_string(),
            });
            self.path.pop();
            return;
        };
        let node_id = node.id.as_str();

        let seen = self.visits.get(node_id).copied().unwrap_or(0);
        if seen >= self.max_iterations {
            let reachable = self.terminations_reachable_from(node_id);
            self.path.push(node_id);
            self.emit_truncated(EnumerationDiagnostic::LoopLimit {
                node_id: node_id.to_string(),
                max_iterations: self.max_iterations,
            });
            if let Some(path) = self.paths.last_mut() {
                path.reachable_terminations = reachable;
            }
            self.path.pop();
            return;
        }

        self.path.push(node_id);
        *self.visits.entry(node_id).or_insert(0) += 1;
        let suffix_len = self.suffix.len();
        self.suffix.push_str(&node.kind.suffix_fragment());

        let mut next_output = 0;
        match &node.kind {
            NodeKind::Termination { termination_type } => {
                self.emit_complete(TerminationRef {
                    id: node.id.clone(),
                    termination_type: termination_type.clone(),
                });
                next_output = node.outputs.len();
            }
            _ if node.outputs.is_empty() => {
                self.emit_truncated(EnumerationDiagnostic::DeadEnd {
                    node_id: node.id.clone(),
                    node_type: node.kind.type_name().to_string(),
                });
            }
            _ => {}
        }

        self.frames.push(Frame {
            node,
            next_output,
            suffix_len,
        });
    }

    fn leave(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        self.suffix.truncate(frame.suffix_len);
        if let Some(count) = self.visits.get_mut(frame.node.id.as_str()) {
            *count -= 1;
        }
        self.path.pop();
    }

    fn emit_complete(&mut self, termination: TerminationRef) {
        self.paths.push(PipelinePath {
            node_ids: self.path.iter().map(|id| id.to_string()).collect(),
            termination: Some(termination),
            process_suffix: self.suffix.clone(),
            files: self.templates.templates(self.path.as_slice()),
            truncation: None,
            reachable_terminations: Vec::new(),
        });
    }

    /// Emit the current path as a truncated path.
    ///
    /// For loop truncation the refused node is already on the path but was
    /// not walked, so it contributes no expected file.
    fn emit_truncated(&mut self, diagnostic: EnumerationDiagnostic) {
        let walked = match diagnostic {
            EnumerationDiagnostic::DeadEnd { .. } => &self.path[..],
            EnumerationDiagnostic::LoopLimit { .. } | EnumerationDiagnostic::UnresolvedNode { .. } => {
                &self.path[..self.path.len().saturating_sub(1)]
            }
        };
        log::debug!("Truncated path: {diagnostic}");
        self.paths.push(PipelinePath {
            node_ids: self.path.iter().map(|id| id.to_string()).collect(),
            termination: None,
            process_suffix: self.suffix.clone(),
            files: self.templates.templates(walked),
            truncation: Some(diagnostic),
            reachable_terminations: Vec::new(),
        });
    }

    fn terminations_reachable_from(&mut self, node_id: &'g str) -> Vec<String> {
        let graph = self.graph;
        self.reachable_terminations
            .entry(node_id)
            .or_insert_with(|| {
                let reachable = graph.reachable_from(node_id);
                graph
                    .terminations()
                    .filter(|t| reachable.contains(t.id.as_str()))
                    .map(|t| t.id.clone())
                    .collect()
            })
            .clone()
    }
}
