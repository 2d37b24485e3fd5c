//! Diagnostic context for validation runs.
//!
//! Tracks, per thread, which phase of a run is executing and which pipeline
//! version and image it concerns. Warnings and the crash report include this
//! context without threading it through every call.
//!
//! ```ignore
//! use pipeline_check::observability::{set_phase, ValidationPhase};
//!
//! let _phase = set_phase(ValidationPhase::PathEnumeration);
//! // ... enumerate ...
//! // previous phase restored when _phase drops
//! ```

pub mod context;
pub mod panic_hook;
pub mod progress;

pub use context::{
    get_current_context, reset_context, set_current_image, set_phase, set_pipeline_version,
    ContextGuard, ValidationContext, ValidationPhase,
};
pub use panic_hook::{crash_report, install_panic_hook};
pub use progress::RunProgress;
