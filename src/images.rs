//! Image input from the pairing collaborator.
//!
//! The pairing step groups a folder listing by camera id and counter; each
//! group holds one or more separate images keyed by suffix (`""` for the
//! base capture, `"2"`, `"HDR"`, ...). Classification works on the flattened
//! form, one [`SpecificImage`] per (group, suffix).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::config::read_text_file;
use crate::errors::{Error, Result};

/// File name of the pairing collaborator's cache inside a photo folder.
pub const PAIRING_CACHE_FILE: &str = ".photo_pairing_imagegroups";

/// Files of one suffix variant within a group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeparateImage {
    #[serde(default)]
    pub files: Vec<String>,
    /// Pairing properties (HDR, panorama, ...); carried through untouched
    #[serde(default)]
    pub properties: Vec<serde_json::Value>,
}

/// One camera capture and its suffix variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageGroup {
    pub group_id: String,
    pub camera_id: String,
    pub counter: String,
    #[serde(default)]
    pub separate_images: BTreeMap<String, SeparateImage>,
}

/// One logical photo with its actual files on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecificImage {
    /// Base filename: camera id + counter, plus `-suffix` for variants
    pub unique_id: String,
    pub group_id: String,
    pub camera_id: String,
    pub counter: String,
    pub suffix: String,
    pub actual_files: BTreeSet<String>,
}

impl SpecificImage {
    pub fn new<I, S>(
        camera_id: impl Into<String>,
        counter: impl Into<String>,
        suffix: impl Into<String>,
        actual_files: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let camera_id = camera_id.into();
        let counter = counter.into();
        let suffix = suffix.into();
        let group_id = format!("{camera_id}{counter}");
        Self {
            unique_id: unique_id(&group_id, &suffix),
            group_id,
            camera_id,
            counter,
            suffix,
            actual_files: actual_files.into_iter().map(Into::into).collect(),
        }
    }
}

fn unique_id(base: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        base.to_string()
    } else {
        format!("{base}-{suffix}")
    }
}

/// One `SpecificImage` per (group, suffix): groups in input order, suffixes
/// sorted.
pub fn flatten_image_groups(groups: &[ImageGroup]) -> Vec<SpecificImage> {
    groups
        .iter()
        .flat_map(|group| {
            let base = format!("{}{}", group.camera_id, group.counter);
            group
                .separate_images
                .iter()
                .map(move |(suffix, image)| SpecificImage {
                    unique_id: unique_id(&base, suffix),
                    group_id: group.group_id.clone(),
                    camera_id: group.camera_id.clone(),
                    counter: group.counter.clone(),
                    suffix: suffix.clone(),
                    actual_files: image.files.iter().cloned().collect(),
                })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct PairingCache {
    #[serde(default)]
    imagegroups: Option<Vec<ImageGroup>>,
}

/// Parse the pairing cache JSON. The `imagegroups` field must be present and
/// non-empty.
pub fn parse_image_groups(contents: &str) -> Result<Vec<ImageGroup>> {
    let cache: PairingCache = serde_json::from_str(contents)
        .map_err(|e| Error::parse(format!("Invalid photo pairing cache file: {e}")))?;
    match cache.imagegroups {
        Some(groups) if !groups.is_empty() => Ok(groups),
        _ => Err(Error::parse("Cache file missing 'imagegroups' field")),
    }
}

/// Load image groups from a pairing cache file.
///
/// `path` may name the cache file itself or the photo folder containing it.
pub fn load_image_groups(path: &Path) -> Result<Vec<ImageGroup>> {
    let file = if path.is_dir() {
        path.join(PAIRING_CACHE_FILE)
    } else {
        path.to_path_buf()
    };
    let contents = read_text_file(&file)
        .map_err(|e| Error::file_system("Failed to read photo pairing cache", &file, e))?;
    let groups = parse_image_groups(&contents)?;
    log::debug!("Loaded {} image group(s) from {}", groups.len(), file.display());
    Ok(groups)
}
