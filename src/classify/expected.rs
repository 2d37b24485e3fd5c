//! Expected filenames implied by a path.
//!
//! A filename is `unique_id + suffix + extension`, where the suffix is the
//! concatenation of the Process fragments seen *before* the File node on the
//! same path. Two File nodes on one path can therefore carry different
//! suffixes, e.g. `AB3D0001.CR3` before a conversion step and
//! `AB3D0001-DxO_DeepPRIME_XD2s.DNG` after it.
//!
//! Only Branching outputs are alternatives. Every other node produces all
//! of its outputs, so a side branch that never reaches a Termination (the
//! `.XMP` sidecar written next to the raw file) is expected on every path
//! passing its fork point.
//!
//! The walk over the graph happens once per path ([`TemplateBuilder`]); the
//! per-image work is only string concatenation ([`expected_files`]).

use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::images::SpecificImage;
use crate::paths::PipelinePath;
use crate::pipeline::{Node, NodeKind, PipelineGraph};

/// One File node on a path, with the suffix in effect at that point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FileTemplate {
    pub node_id: String,
    pub suffix: String,
    pub extension: String,
    /// Absence never makes the image incomplete
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl FileTemplate {
    /// Render the filename for an image's base identity.
    pub fn filename(&self, unique_id: &str) -> String {
        format!("{unique_id}{}{}", self.suffix, self.extension)
    }

    fn with_prefix(&self, prefix: &str) -> Self {
        Self {
            suffix: format!("{prefix}{}", self.suffix),
            ..self.clone()
        }
    }
}

fn template(node: &Node, suffix: &str) -> Option<FileTemplate> {
    match &node.kind {
        NodeKind::File {
            extension,
            optional,
        } => Some(FileTemplate {
            node_id: node.id.clone(),
            suffix: suffix.to_string(),
            extension: extension.clone(),
            optional: *optional,
        }),
        _ => None,
    }
}

/// Builds the File templates of node id sequences for one graph.
///
/// Side branches are resolved once at construction; [`Self::templates`] is
/// then a single pass over the ids.
#[derive(Debug)]
pub struct TemplateBuilder<'g> {
    graph: &'g PipelineGraph,
    /// Fork node id to the side-branch templates hanging off it, suffixes
    /// relative to the fork
    side_branches: HashMap<&'g str, Vec<FileTemplate>>,
}

impl<'g> TemplateBuilder<'g> {
    pub fn new(graph: &'g PipelineGraph) -> Self {
        let productive = nodes_reaching_termination(graph);
        let mut side_branches = HashMap::new();

        for node in graph.nodes().filter(|node| produces_all_outputs(node)) {
            let templates: Vec<FileTemplate> = node
                .outputs
                .iter()
                .filter_map(|output| graph.get(output))
                .filter(|output| !productive.contains(output.id.as_str()))
                .flat_map(|output| side_branch_templates(graph, output))
                .collect();
            if !templates.is_empty() {
                side_branches.insert(node.id.as_str(), templates);
            }
        }

        Self {
            graph,
            side_branches,
        }
    }

    /// Walk `node_ids` in order and record a template for every File node
    /// on the path and on the side branches it forks past.
    ///
    /// Ids that do not resolve are skipped; identical templates collapse.
    pub fn templates<S: AsRef<str>>(&self, node_ids: &[S]) -> Vec<FileTemplate> {
        let mut suffix = String::new();
        let mut templates: Vec<FileTemplate> = Vec::new();
        let mut push = |t: FileTemplate| {
            if !templates.contains(&t) {
                templates.push(t);
            }
        };

        for node in node_ids.iter().filter_map(|id| self.graph.get(id.as_ref())) {
            suffix.push_str(&node.kind.suffix_fragment());
            if let Some(t) = template(node, &suffix) {
                push(t);
            }
            if let Some(side) = self.side_branches.get(node.id.as_str()) {
                for t in side {
                    push(t.with_prefix(&suffix));
                }
            }
        }
        templates
    }
}

/// Non-Branching, non-Termination nodes produce every output.
fn produces_all_outputs(node: &Node) -> bool {
    !matches!(
        node.kind,
        NodeKind::Branching { .. } | NodeKind::Termination { .. }
    )
}

/// Ids of nodes from which some Termination is reachable.
fn nodes_reaching_termination(graph: &PipelineGraph) -> HashSet<&str> {
    let mut parents: HashMap<&str, Vec<&str>> = HashMap::new();
    for node in graph.nodes() {
        for output in &node.outputs {
            parents
                .entry(output.as_str())
                .or_default()
                .push(node.id.as_str());
        }
    }

    let mut reached: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = graph.terminations().map(|t| t.id.as_str()).collect();
    while let Some(id) = stack.pop() {
        if reached.insert(id) {
            stack.extend(parents.get(id).into_iter().flatten().copied());
        }
    }
    reached
}

/// File templates on a side branch starting at `start`.
///
/// Process fragments accumulate along the branch. A Branching node inside
/// the branch is not expanded, since its outputs are alternatives.
fn side_branch_templates(graph: &PipelineGraph, start: &Node) -> Vec<FileTemplate> {
    let mut templates = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut stack = vec![(start, start.kind.suffix_fragment())];

    while let Some((node, suffix)) = stack.pop() {
        if !seen.insert(node.id.as_str()) {
            continue;
        }
        templates.extend(template(node, &suffix));
        if !produces_all_outputs(node) {
            continue;
        }
        for next in node.outputs.iter().rev().filter_map(|id| graph.get(id)) {
            stack.push((next, format!("{suffix}{}", next.kind.suffix_fragment())));
        }
    }
    templates
}

/// One-off form of [`TemplateBuilder::templates`].
pub fn file_templates<S: AsRef<str>>(graph: &PipelineGraph, node_ids: &[S]) -> Vec<FileTemplate> {
    TemplateBuilder::new(graph).templates(node_ids)
}

/// The set of filenames `path` expects for `image`; duplicates collapse.
pub fn expected_files(path: &PipelinePath, image: &SpecificImage) -> BTreeSet<String> {
    path.files
        .iter()
        .map(|template| template.filename(&image.unique_id))
        .collect()
}

/// The subset of [`expected_files`] whose absence counts as missing.
///
/// A filename expected by both a required and an optional node is required.
pub fn required_files(path: &PipelinePath, image: &SpecificImage) -> BTreeSet<String> {
    path.files
        .iter()
        .filter(|template| !template.optional)
        .map(|template| template.filename(&image.unique_id))
        .collect()
}
