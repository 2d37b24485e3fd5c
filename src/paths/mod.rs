//! Path enumeration over pipeline graphs and the per-definition path cache.

pub mod cache;
pub mod enumerator;
pub mod path;

pub use cache::{CacheStats, PathCache, PathSet};
pub use enumerator::{enumerate, PathEnumerator};
pub use path::{EnumerationDiagnostic, PipelinePath, TerminationRef};
