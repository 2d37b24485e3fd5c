//! Pipeline definition input.
//!
//! A definition arrives as an ordered list of loosely-typed node records, as
//! exported by the pipeline store or embedded in the `processing_pipelines:`
//! section of a photo-admin `config.yaml`. Records are converted into typed
//! [`Node`]s here; anything that cannot become a node (missing fields, unknown
//! type) is rejected before structural validation runs.

use serde::{Deserialize, Serialize};

use super::graph::PipelineGraph;
use super::node::{Node, NodeKind};
use crate::errors::{DefinitionError, DefinitionErrors, Error, Result};

/// A node as written in a definition file.
///
/// Every field is optional at this level so that a broken record produces a
/// precise [`DefinitionError::MissingField`] instead of a generic
/// deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub node_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "output")]
    pub outputs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    /// File nodes only
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairing_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_type: Option<String>,
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        let mut record = NodeRecord {
            id: Some(node.id.clone()),
            node_type: Some(node.kind.type_name().to_string()),
            name: Some(node.name.clone()),
            outputs: node.outputs.clone(),
            ..Default::default()
        };
        match &node.kind {
            NodeKind::Capture => {}
            NodeKind::File {
                extension,
                optional,
            } => {
                record.extension = Some(extension.clone());
                record.optional = *optional;
            }
            NodeKind::Process { method_ids } => record.method_ids = Some(method_ids.clone()),
            NodeKind::Pairing {
                pairing_type,
                input_count,
            } => {
                record.pairing_type = Some(pairing_type.clone());
                record.input_count = Some(*input_count);
            }
            NodeKind::Branching {
                condition_description,
            } => record.condition_description = Some(condition_description.clone()),
            NodeKind::Termination { termination_type } => {
                record.termination_type = Some(termination_type.clone())
            }
        }
        record
    }
}

/// Treat a missing or blank string the same way.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl NodeRecord {
    /// Convert into a typed node, reporting every missing field.
    ///
    /// `index` is the record's position in the definition and only feeds
    /// error messages.
    pub fn into_node(self, index: usize) -> std::result::Result<Node, Vec<DefinitionError>> {
        let missing = |field: &'static str| DefinitionError::MissingField {
            index,
            node_id: present(&self.id).map(str::to_string),
            field,
        };

        let mut errors: Vec<DefinitionError> = [
            ("id", present(&self.id)),
            ("type", present(&self.node_type)),
            ("name", present(&self.name)),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(field, _)| missing(field))
        .collect();

        let (Some(id), Some(node_type), Some(name)) = (
            present(&self.id),
            present(&self.node_type),
            present(&self.name),
        ) else {
            return Err(errors);
        };

        let kind = match node_type {
            "Capture" => Some(NodeKind::Capture),
            "File" => match present(&self.extension) {
                Some(extension) => Some(NodeKind::File {
                    extension: extension.to_string(),
                    optional: self.optional,
                }),
                None => {
                    errors.push(missing("extension"));
                    None
                }
            },
            "Process" => match &self.method_ids {
                Some(method_ids) => Some(NodeKind::Process {
                    method_ids: method_ids.clone(),
                }),
                None => {
                    errors.push(missing("method_ids"));
                    None
                }
            },
            "Pairing" => {
                if present(&self.pairing_type).is_none() {
                    errors.push(missing("pairing_type"));
                }
                if self.input_count.is_none() {
                    errors.push(missing("input_count"));
                }
                match (present(&self.pairing_type), self.input_count) {
                    (Some(pairing_type), Some(input_count)) => Some(NodeKind::Pairing {
                        pairing_type: pairing_type.to_string(),
                        input_count,
                    }),
                    _ => None,
                }
            }
            "Branching" => match present(&self.condition_description) {
                Some(condition) => Some(NodeKind::Branching {
                    condition_description: condition.to_string(),
                }),
                None => {
                    errors.push(missing("condition_description"));
                    None
                }
            },
            "Termination" => match present(&self.termination_type) {
                Some(termination_type) => Some(NodeKind::Termination {
                    termination_type: termination_type.to_string(),
                }),
                None => {
                    errors.push(missing("termination_type"));
                    None
                }
            },
            other => {
                errors.push(DefinitionError::UnknownNodeType {
                    node_id: id.to_string(),
                    node_type: other.to_string(),
                });
                None
            }
        };

        match kind {
            Some(kind) if errors.is_empty() => Ok(Node {
                id: id.to_string(),
                name: name.to_string(),
                outputs: self.outputs,
                kind,
            }),
            _ => Err(errors),
        }
    }
}

/// An ordered list of node records plus the store's version number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// Version assigned by the pipeline store; 0 when unversioned
    #[serde(default)]
    pub version: u32,
    pub nodes: Vec<NodeRecord>,
}

/// The `processing_pipelines:` section of a photo-admin configuration file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFileSections {
    processing_pipelines: Option<PipelineDefinition>,
}

impl PipelineDefinition {
    pub fn new(version: u32, nodes: Vec<NodeRecord>) -> Self {
        Self { version, nodes }
    }

    /// Parse a standalone YAML definition (`version:` + `nodes:`).
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let definition: Self = serde_yaml::from_str(contents)?;
        definition.ensure_nodes()
    }

    /// Parse a standalone JSON definition.
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let definition: Self = serde_json::from_str(contents)?;
        definition.ensure_nodes()
    }

    /// Extract the definition from a photo-admin `config.yaml`.
    pub fn from_config_yaml(contents: &str) -> Result<Self> {
        let sections: ConfigFileSections = serde_yaml::from_str(contents)?;
        sections
            .processing_pipelines
            .ok_or_else(|| {
                Error::parse("Missing 'processing_pipelines' section in configuration file")
            })?
            .ensure_nodes()
    }

    fn ensure_nodes(self) -> Result<Self> {
        if self.nodes.is_empty() {
            return Err(Error::parse("Pipeline definition has an empty 'nodes' list"));
        }
        Ok(self)
    }

    /// Convert every record, collecting all record-level problems.
    pub fn to_nodes(&self) -> std::result::Result<Vec<Node>, DefinitionErrors> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        let mut errors = Vec::new();
        for (index, record) in self.nodes.iter().cloned().enumerate() {
            match record.into_node(index) {
                Ok(node) => nodes.push(node),
                Err(record_errors) => errors.extend(record_errors),
            }
        }
        DefinitionErrors::from(errors).into_result()?;
        Ok(nodes)
    }

    /// Build the graph; fails on record problems or duplicate ids.
    pub fn to_graph(&self) -> std::result::Result<PipelineGraph, DefinitionErrors> {
        PipelineGraph::new(self.version, self.to_nodes()?)
    }

    /// Round-trip a graph back into a definition.
    pub fn from_graph(graph: &PipelineGraph) -> Self {
        Self {
            version: graph.version(),
            nodes: graph.nodes().map(NodeRecord::from).collect(),
        }
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = indoc! {"
        version: 3
        nodes:
          - id: capture
            type: Capture
            name: Camera Capture
            output: [raw_image]
          - id: raw_image
            type: File
            extension: .CR3
            name: Canon Raw File
            output: [done]
          - id: done
            type: Termination
            termination_type: Black Box Archive
            name: Archive Ready
            output: []
    "};

    #[test]
    fn test_parse_yaml_accepts_legacy_output_key() {
        let definition = PipelineDefinition::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(definition.version, 3);
        assert_eq!(definition.nodes.len(), 3);
        assert_eq!(definition.nodes[0].outputs, vec!["raw_image".to_string()]);

        let nodes = definition.to_nodes().unwrap();
        assert_eq!(
            nodes[1].kind,
            NodeKind::File {
                extension: ".CR3".into(),
                optional: false,
            }
        );
    }

    #[test]
    fn test_optional_flag_survives_round_trip() {
        let yaml = indoc! {"
            nodes:
              - id: xmp
                type: File
                extension: .XMP
                name: XMP Metadata
                optional: true
        "};
        let definition = PipelineDefinition::from_yaml_str(yaml).unwrap();
        let nodes = definition.to_nodes().unwrap();
        assert!(!nodes[0].is_required_file());

        let exported = NodeRecord::from(&nodes[0]);
        assert!(exported.optional);
        assert!(!NodeRecord::from(&Node::file("raw", "Raw", ".CR3")).optional);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let record = NodeRecord {
            id: Some("mystery".into()),
            node_type: Some("Teleport".into()),
            name: Some("Mystery".into()),
            ..Default::default()
        };
        let errors = record.into_node(0).unwrap_err();
        assert_eq!(
            errors,
            vec![DefinitionError::UnknownNodeType {
                node_id: "mystery".into(),
                node_type: "Teleport".into(),
            }]
        );
    }

    #[test]
    fn test_missing_common_fields_all_reported() {
        let errors = NodeRecord::default().into_node(4).unwrap_err();
        let fields: Vec<_> = errors
            .iter()
            .map(|e| match e {
                DefinitionError::MissingField { field, index, .. } => {
                    assert_eq!(*index, 4);
                    *field
                }
                other => panic!("unexpected error {other:?}"),
            })
            .collect();
        assert_eq!(fields, vec!["id", "type", "name"]);
    }

    #[test]
    fn test_pairing_requires_both_fields() {
        let record = NodeRecord {
            id: Some("hdr".into()),
            node_type: Some("Pairing".into()),
            name: Some("HDR Merge".into()),
            ..Default::default()
        };
        let errors = record.into_node(2).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.node_id() == Some("hdr")));
    }

    #[test]
    fn test_process_allows_empty_method_list_but_not_missing() {
        let mut record = NodeRecord {
            id: Some("select".into()),
            node_type: Some("Process".into()),
            name: Some("Selection".into()),
            ..Default::default()
        };
        assert!(record.clone().into_node(0).is_err());

        record.method_ids = Some(vec![String::new()]);
        let node = record.into_node(0).unwrap();
        assert_eq!(node.kind.suffix_fragment(), "");
    }

    #[test]
    fn test_blank_extension_counts_as_missing() {
        let record = NodeRecord {
            id: Some("raw".into()),
            node_type: Some("File".into()),
            name: Some("Raw".into()),
            extension: Some("  ".into()),
            ..Default::default()
        };
        let errors = record.into_node(1).unwrap_err();
        assert!(matches!(
            errors[0],
            DefinitionError::MissingField {
                field: "extension",
                ..
            }
        ));
    }

    #[test]
    fn test_to_nodes_collects_errors_across_records() {
        let definition = PipelineDefinition::new(
            1,
            vec![
                NodeRecord {
                    id: Some("a".into()),
                    node_type: Some("File".into()),
                    name: Some("A".into()),
                    ..Default::default()
                },
                NodeRecord {
                    id: Some("b".into()),
                    node_type: Some("Termination".into()),
                    name: Some("B".into()),
                    ..Default::default()
                },
            ],
        );
        let errors = definition.to_nodes().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_from_config_yaml_requires_section() {
        let err = PipelineDefinition::from_config_yaml("photo_extensions: ['.cr3']\n").unwrap_err();
        assert!(err.to_string().contains("processing_pipelines"));
    }

    #[test]
    fn test_empty_nodes_rejected() {
        assert!(PipelineDefinition::from_yaml_str("nodes: []\n").is_err());
        assert!(PipelineDefinition::from_json_str(r#"{"nodes": []}"#).is_err());
    }

    #[test]
    fn test_graph_round_trip_preserves_nodes() {
        let definition = PipelineDefinition::from_yaml_str(SAMPLE).unwrap();
        let graph = definition.to_graph().unwrap();
        let exported = PipelineDefinition::from_graph(&graph);
        assert_eq!(exported.to_nodes().unwrap(), definition.to_nodes().unwrap());
        assert!(exported.to_yaml_string().unwrap().contains("Black Box Archive"));
    }
}
