//! Per-image classification against an enumerated path set.
//!
//! For each Termination the classifier picks the path whose expected files
//! best match the image's actual files and reports a status for it. The best
//! status across all Terminations is the image's overall verdict, and every
//! Termination at CONSISTENT or CONSISTENT-WITH-WARNING counts toward
//! archival readiness.
//!
//! Classification is total: an image is always classified, and a path set
//! with no complete path yields INCONSISTENT plus diagnostics rather than an
//! error.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use super::expected::{expected_files, required_files};
use crate::images::SpecificImage;
use crate::observability::{get_current_context, set_current_image, set_phase, ValidationPhase};
use crate::paths::PipelinePath;

/// Archival-readiness verdict, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationStatus {
    /// Every expected file present, nothing else
    #[serde(rename = "CONSISTENT")]
    Consistent,
    /// Every expected file present, plus untracked files
    #[serde(rename = "CONSISTENT-WITH-WARNING")]
    ConsistentWithWarning,
    /// Some but not all expected files present
    #[serde(rename = "PARTIAL")]
    Partial,
    /// No expected file present
    #[serde(rename = "INCONSISTENT")]
    Inconsistent,
}

impl ValidationStatus {
    /// Lower is more archival-ready.
    pub fn rank(self) -> u8 {
        match self {
            Self::Consistent => 0,
            Self::ConsistentWithWarning => 1,
            Self::Partial => 2,
            Self::Inconsistent => 3,
        }
    }

    pub fn is_archival_ready(self) -> bool {
        matches!(self, Self::Consistent | Self::ConsistentWithWarning)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Consistent => "CONSISTENT",
            Self::ConsistentWithWarning => "CONSISTENT-WITH-WARNING",
            Self::Partial => "PARTIAL",
            Self::Inconsistent => "INCONSISTENT",
        }
    }

    fn from_match(missing: usize, extra: usize, present: usize) -> Self {
        match (missing, extra) {
            (0, 0) => Self::Consistent,
            (0, _) => Self::ConsistentWithWarning,
            _ if present > 0 => Self::Partial,
            _ => Self::Inconsistent,
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one image against one Termination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminationMatchResult {
    pub termination_id: String,
    pub termination_type: String,
    pub status: ValidationStatus,
    /// 0 to 100
    pub completion_percentage: f64,
    pub missing_files: Vec<String>,
    pub extra_files: Vec<String>,
    /// A loop cut happened at a point from which this Termination is still
    /// reachable, so longer variants were not enumerated
    pub truncated: bool,
    pub truncation_note: Option<String>,
    /// Node ids of the representative path
    pub path_node_ids: Vec<String>,
}

/// Outcome of one image against a whole pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub unique_id: String,
    pub group_id: String,
    pub camera_id: String,
    pub counter: String,
    pub suffix: String,
    pub actual_files: BTreeSet<String>,
    pub termination_matches: Vec<TerminationMatchResult>,
    pub overall_status: ValidationStatus,
    /// Termination types at CONSISTENT or CONSISTENT-WITH-WARNING
    pub archival_ready_for: Vec<String>,
    pub diagnostics: Vec<String>,
}

impl ValidationResult {
    fn for_image(image: &SpecificImage) -> Self {
        Self {
            unique_id: image.unique_id.clone(),
            group_id: image.group_id.clone(),
            camera_id: image.camera_id.clone(),
            counter: image.counter.clone(),
            suffix: image.suffix.clone(),
            actual_files: image.actual_files.clone(),
            termination_matches: Vec::new(),
            overall_status: ValidationStatus::Inconsistent,
            archival_ready_for: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn is_archival_ready(&self) -> bool {
        self.overall_status.is_archival_ready()
    }

    /// The match for a Termination id, if that Termination was reached.
    pub fn termination(&self, termination_id: &str) -> Option<&TerminationMatchResult> {
        self.termination_matches
            .iter()
            .find(|m| m.termination_id == termination_id)
    }
}

/// Complete paths to one Termination.
#[derive(Debug)]
struct TerminationGroup<'p> {
    id: &'p str,
    termination_type: &'p str,
    paths: Vec<&'p PipelinePath>,
    truncation_note: Option<String>,
}

/// Path set grouped by Termination; build once per batch.
#[derive(Debug)]
pub struct Classifier<'p> {
    groups: Vec<TerminationGroup<'p>>,
    diagnostics: Vec<String>,
}

/// One candidate path scored against an image.
struct Candidate<'p> {
    path: &'p PipelinePath,
    order: usize,
    missing: Vec<String>,
    extra: Vec<String>,
    present: usize,
    completion: f64,
}

impl Candidate<'_> {
    /// Best first: completion, fewer missing, fewer extra, shorter path,
    /// enumeration order.
    fn compare(&self, other: &Self) -> Ordering {
        other
            .completion
            .total_cmp(&self.completion)
            .then_with(|| self.missing.len().cmp(&other.missing.len()))
            .then_with(|| self.extra.len().cmp(&other.extra.len()))
            .then_with(|| self.path.len().cmp(&other.path.len()))
            .then_with(|| self.order.cmp(&other.order))
    }
}

impl<'p> Classifier<'p> {
    pub fn new(paths: &'p [PipelinePath]) -> Self {
        let mut groups: Vec<TerminationGroup<'p>> = Vec::new();

        for path in paths.iter().filter(|p| !p.truncated()) {
            let Some(termination) = &path.termination else {
                continue;
            };
            match groups.iter_mut().find(|g| g.id == termination.id) {
                Some(group) => group.paths.push(path),
                None => groups.push(TerminationGroup {
                    id: &termination.id,
                    termination_type: &termination.termination_type,
                    paths: vec![path],
                    truncation_note: None,
                }),
            }
        }

        for path in paths.iter().filter(|p| p.truncated()) {
            for termination_id in &path.reachable_terminations {
                if let Some(group) = groups.iter_mut().find(|g| g.id == termination_id.as_str()) {
                    if group.truncation_note.is_none() {
                        group.truncation_note = path.truncation_note();
                    }
                }
            }
        }

        let diagnostics = if groups.is_empty() {
            let mut notes = vec![format!(
                "no path reaches a Termination node ({} path(s) enumerated)",
                paths.len()
            )];
            notes.extend(paths.iter().filter_map(PipelinePath::truncation_note));
            notes
        } else {
            Vec::new()
        };

        Self {
            groups,
            diagnostics,
        }
    }

    /// Number of distinct Terminations reached by a complete path.
    pub fn termination_count(&self) -> usize {
        self.groups.len()
    }

    pub fn classify(&self, image: &SpecificImage) -> ValidationResult {
        let _phase = set_phase(ValidationPhase::Classification);
        let _image = set_current_image(image.unique_id.as_str());

        let mut result = ValidationResult::for_image(image);
        if self.groups.is_empty() {
            result.diagnostics = self.diagnostics.clone();
            log::debug!("[{}] INCONSISTENT, no reachable Termination", get_current_context());
            return result;
        }

        result.termination_matches = self
            .groups
            .iter()
            .filter_map(|group| Self::match_termination(group, image))
            .collect();

        result.overall_status = result
            .termination_matches
            .iter()
            .map(|m| m.status)
            .min_by_key(|status| status.rank())
            .unwrap_or(ValidationStatus::Inconsistent);

        for m in &result.termination_matches {
            if m.status.is_archival_ready() && !result.archival_ready_for.contains(&m.termination_type)
            {
                result.archival_ready_for.push(m.termination_type.clone());
            }
        }

        log::debug!("[{}] {}", get_current_context(), result.overall_status);
        result
    }

    fn match_termination(
        group: &TerminationGroup<'_>,
        image: &SpecificImage,
    ) -> Option<TerminationMatchResult> {
        let best = group
            .paths
            .iter()
            .enumerate()
            .map(|(order, path)| score(path, order, image))
            .min_by(Candidate::compare)?;

        Some(TerminationMatchResult {
            termination_id: group.id.to_string(),
            termination_type: group.termination_type.to_string(),
            status: ValidationStatus::from_match(best.missing.len(), best.extra.len(), best.present),
            completion_percentage: best.completion,
            missing_files: best.missing,
            extra_files: best.extra,
            truncated: group.truncation_note.is_some(),
            truncation_note: group.truncation_note.clone(),
            path_node_ids: best.path.node_ids.clone(),
        })
    }
}

/// Optional files are accepted when present but never missing, and only
/// required files feed the completion percentage and the status.
fn score<'p>(path: &'p PipelinePath, order: usize, image: &SpecificImage) -> Candidate<'p> {
    let expected = expected_files(path, image);
    let required = required_files(path, image);
    let present = required.intersection(&image.actual_files).count();
    let missing: Vec<String> = required.difference(&image.actual_files).cloned().collect();
    let extra: Vec<String> = image.actual_files.difference(&expected).cloned().collect();
    let completion = if required.is_empty() {
        100.0
    } else {
        100.0 * present as f64 / required.len() as f64
    };

    Candidate {
        path,
        order,
        missing,
        extra,
        present,
        completion,
    }
}

/// Classify one image against `paths`; see [`Classifier`] for batches.
pub fn classify(image: &SpecificImage, paths: &[PipelinePath]) -> ValidationResult {
    Classifier::new(paths).classify(image)
}
