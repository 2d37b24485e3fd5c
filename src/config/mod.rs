//! Validator configuration.
//!
//! The allow-lists (photo and metadata extensions, processing-method
//! registry) and the loop budget are consumed here, not owned: they come from
//! the photo-admin `config.yaml` or a `.pipeline-check.toml`.

mod core;
mod loader;
mod parallel;

pub use self::core::{ValidatorConfig, DEFAULT_MAX_ITERATIONS_PER_NODE};
pub use loader::{
    directory_ancestors, discover_config, load_config, parse_and_validate_config, ConfigFormat,
    CONFIG_FILE_NAMES,
};
pub(crate) use loader::read_text_file;
pub use parallel::{ParallelConfig, DEFAULT_CHUNK_SIZE};
