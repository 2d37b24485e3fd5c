use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};

use super::node::Node;
use crate::errors::{DefinitionError, DefinitionErrors};

/// Arena-backed pipeline graph.
///
/// Nodes are kept in definition order and edges are node ids, so traversal
/// bookkeeping is plain integer counting and never mutates the graph. A graph
/// is immutable once built.
#[derive(Debug, Clone)]
pub struct PipelineGraph {
    version: u32,
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

impl PipelineGraph {
    /// Build a graph, rejecting every id that occurs more than once.
    pub fn new(version: u32, nodes: Vec<Node>) -> Result<Self, DefinitionErrors> {
        let mut index = HashMap::with_capacity(nodes.len());
        let mut occurrences: Vec<(String, usize)> = Vec::new();

        for (position, node) in nodes.iter().enumerate() {
            if index.contains_key(&node.id) {
                match occurrences.iter_mut().find(|(id, _)| *id == node.id) {
                    Some((_, count)) => *count += 1,
                    None => occurrences.push((node.id.clone(), 2)),
                }
            } else {
                index.insert(node.id.clone(), position);
            }
        }

        DefinitionErrors::from(
            occurrences
                .into_iter()
                .map(|(node_id, count)| DefinitionError::DuplicateNodeId { node_id, count })
                .collect::<Vec<_>>(),
        )
        .into_result()?;

        Ok(Self {
            version,
            nodes,
            index,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&position| &self.nodes[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All nodes in definition order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn capture_ids(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|node| node.is_capture())
            .map(|node| node.id.as_str())
            .collect()
    }

    /// The Capture node id, when there is exactly one.
    pub fn capture_id(&self) -> Option<&str> {
        let ids = self.capture_ids();
        match ids.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn terminations(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| node.is_termination())
    }

    /// Every node id reachable from `start`, `start` included.
    ///
    /// Uses a global visited set, so cycles are walked once. Output ids that
    /// do not resolve are skipped.
    pub fn reachable_from(&self, start: &str) -> HashSet<&str> {
        let mut visited: HashSet<&str> = HashSet::new();
        let Some(root) = self.get(start) else {
            return visited;
        };

        let mut stack = vec![root];
        visited.insert(root.id.as_str());
        while let Some(node) = stack.pop() {
            for output in &node.outputs {
                if let Some(next) = self.get(output) {
                    if visited.insert(next.id.as_str()) {
                        stack.push(next);
                    }
                }
            }
        }
        visited
    }

    /// SHA-256 over the canonical JSON form of the node list.
    ///
    /// Node order is part of the fingerprint because it fixes the
    /// enumeration order.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for node in &self.nodes {
            // Serializing plain strings and integers cannot fail
            if let Ok(encoded) = serde_json::to_vec(node) {
                hasher.update(&encoded);
            }
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }
}
