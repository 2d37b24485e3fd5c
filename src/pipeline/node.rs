use serde::Serialize;
use std::fmt;

/// One node of a processing pipeline.
///
/// The fields shared by every kind live here; kind-specific data lives in
/// [`NodeKind`]. Edges are stored as node ids in `outputs`, in declaration
/// order, which is also the order the enumerator walks them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub outputs: Vec<String>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

/// The six node kinds a pipeline is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    /// Camera capture, the single entry point of a pipeline
    Capture,
    /// An expected file, e.g. `.CR3`, `.DNG` or an `.XMP` sidecar.
    /// Optional files never count as missing.
    File {
        extension: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        optional: bool,
    },
    /// An editing or conversion step; each non-empty method id adds `-<id>`
    /// to filenames produced after it
    Process { method_ids: Vec<String> },
    /// Multi-image merge (HDR, panorama, focus stack)
    Pairing {
        pairing_type: String,
        input_count: u32,
    },
    /// Decision point; every output is explored
    Branching { condition_description: String },
    /// Archival-ready end state
    Termination { termination_type: String },
}

impl NodeKind {
    /// Type name as written in pipeline definitions.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Capture => "Capture",
            Self::File { .. } => "File",
            Self::Process { .. } => "Process",
            Self::Pairing { .. } => "Pairing",
            Self::Branching { .. } => "Branching",
            Self::Termination { .. } => "Termination",
        }
    }

    /// Filename suffix this node contributes on a single pass.
    ///
    /// Only Process nodes contribute; empty method ids are pure selection
    /// steps and add nothing.
    pub fn suffix_fragment(&self) -> String {
        match self {
            Self::Process { method_ids } => method_ids
                .iter()
                .filter(|id| !id.is_empty())
                .map(|id| format!("-{id}"))
                .collect(),
            Self::Capture
            | Self::File { .. }
            | Self::Pairing { .. }
            | Self::Branching { .. }
            | Self::Termination { .. } => String::new(),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl Node {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            outputs: Vec::new(),
            kind,
        }
    }

    /// Builder-style setter for the output edges.
    pub fn with_outputs<I, S>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs = outputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn capture(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, NodeKind::Capture)
    }

    pub fn file(id: impl Into<String>, name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self::new(
            id,
            name,
            NodeKind::File {
                extension: extension.into(),
                optional: false,
            },
        )
    }

    /// A File node whose absence does not make an image incomplete.
    pub fn optional_file(
        id: impl Into<String>,
        name: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self::new(
            id,
            name,
            NodeKind::File {
                extension: extension.into(),
                optional: true,
            },
        )
    }

    pub fn process<I, S>(id: impl Into<String>, name: impl Into<String>, method_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            id,
            name,
            NodeKind::Process {
                method_ids: method_ids.into_iter().map(Into::into).collect(),
            },
        )
    }

    pub fn pairing(
        id: impl Into<String>,
        name: impl Into<String>,
        pairing_type: impl Into<String>,
        input_count: u32,
    ) -> Self {
        Self::new(
            id,
            name,
            NodeKind::Pairing {
                pairing_type: pairing_type.into(),
                input_count,
            },
        )
    }

    pub fn branching(
        id: impl Into<String>,
        name: impl Into<String>,
        condition_description: impl Into<String>,
    ) -> Self {
        Self::new(
            id,
            name,
            NodeKind::Branching {
                condition_description: condition_description.into(),
            },
        )
    }

    pub fn termination(
        id: impl Into<String>,
        name: impl Into<String>,
        termination_type: impl Into<String>,
    ) -> Self {
        Self::new(
            id,
            name,
            NodeKind::Termination {
                termination_type: termination_type.into(),
            },
        )
    }

    pub fn is_capture(&self) -> bool {
        matches!(self.kind, NodeKind::Capture)
    }

    pub fn is_termination(&self) -> bool {
        matches!(self.kind, NodeKind::Termination { .. })
    }

    /// True for File nodes that must be present.
    pub fn is_required_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { optional: false, .. })
    }

    pub fn termination_type(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Termination { termination_type } => Some(termination_type),
            _ => None,
        }
    }
}
