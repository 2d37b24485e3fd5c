use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::core::ValidatorConfig;
use crate::errors::{Error, Result};

/// Config file names searched for, in priority order, in each directory.
pub const CONFIG_FILE_NAMES: [&str; 2] = [".pipeline-check.toml", "config/config.yaml"];

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Syntax of a config file, chosen from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// TOML for `.toml`, YAML for everything else.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }
}

/// Read a whole text file
pub(crate) fn read_text_file(path: &Path) -> std::result::Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Pure function to parse and validate config contents
pub fn parse_and_validate_config(contents: &str, format: ConfigFormat) -> Result<ValidatorConfig> {
    let config: ValidatorConfig = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(contents)?,
        ConfigFormat::Toml => toml::from_str(contents)?,
    };

    config
        .validate()
        .map_err(|problems| Error::configuration(problems.join("; ")))?;

    Ok(config)
}

/// Load and validate the config file at `path`.
pub fn load_config(path: &Path) -> Result<ValidatorConfig> {
    let contents = read_text_file(path)
        .map_err(|e| Error::file_system("Failed to read config file", path, e))?;
    let config = parse_and_validate_config(&contents, ConfigFormat::from_path(path))?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Pure function to try loading config from a specific path
pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<ValidatorConfig> {
    match load_config(config_path) {
        Ok(config) => Some(config),
        Err(Error::FileSystem {
            source: Some(ref e),
            ..
        }) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            log::warn!("Ignoring config file {}: {}", config_path.display(), e);
            None
        }
    }
}

/// Pure function to generate directory ancestors up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Search `start` and its ancestors for a config file.
///
/// Falls back to the default config when nothing usable is found.
pub fn discover_config(start: &Path) -> ValidatorConfig {
    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .flat_map(|dir| CONFIG_FILE_NAMES.map(|name| dir.join(name)))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            log::debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            ValidatorConfig::default()
        })
}
