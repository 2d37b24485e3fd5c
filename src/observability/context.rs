//! Thread-local context tracking for diagnostics.
//!
//! Records which validation phase a thread is in, which pipeline version it
//! is working on, and which image it is classifying. Each rayon worker has
//! its own context, so no synchronization is involved. Guards restore the
//! previous context on drop, which keeps nested scopes correct.

use std::cell::RefCell;
use std::fmt;

thread_local! {
    static CURRENT_CONTEXT: RefCell<ValidationContext> = const { RefCell::new(ValidationContext::new()) };
}

/// Snapshot of what the current thread is doing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationContext {
    pub phase: Option<ValidationPhase>,
    pub pipeline_version: Option<u32>,
    pub current_image: Option<String>,
}

impl ValidationContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: None,
            pipeline_version: None,
            current_image: None,
        }
    }
}

impl fmt::Display for ValidationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.phase {
            Some(phase) => write!(f, "phase={phase}")?,
            None => write!(f, "phase=idle")?,
        }
        if let Some(version) = self.pipeline_version {
            write!(f, " pipeline=v{version}")?;
        }
        if let Some(image) = &self.current_image {
            write!(f, " image={image}")?;
        }
        Ok(())
    }
}

/// Major stages of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPhase {
    /// Converting node records into a graph
    DefinitionParsing,
    /// Running structural checks
    StructuralValidation,
    /// Enumerating Capture-to-Termination paths
    PathEnumeration,
    /// Comparing image files against paths
    Classification,
}

impl fmt::Display for ValidationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefinitionParsing => write!(f, "definition_parsing"),
            Self::StructuralValidation => write!(f, "structural_validation"),
            Self::PathEnumeration => write!(f, "path_enumeration"),
            Self::Classification => write!(f, "classification"),
        }
    }
}

/// RAII guard restoring the previous context on drop.
pub struct ContextGuard {
    previous: ValidationContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = std::mem::take(&mut self.previous);
        CURRENT_CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = previous;
        });
    }
}

fn update(apply: impl FnOnce(&mut ValidationContext)) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        apply(&mut *ctx.borrow_mut());
        ContextGuard { previous }
    })
}

/// Set the current phase until the guard drops.
#[must_use]
pub fn set_phase(phase: ValidationPhase) -> ContextGuard {
    update(|ctx| ctx.phase = Some(phase))
}

/// Set the pipeline version being worked on until the guard drops.
#[must_use]
pub fn set_pipeline_version(version: u32) -> ContextGuard {
    update(|ctx| ctx.pipeline_version = Some(version))
}

/// Set the image being classified until the guard drops.
///
/// ```ignore
/// for image in images {
///     let _image = set_current_image(&image.unique_id);
///     classifier.classify(image);
/// }
/// ```
#[must_use]
pub fn set_current_image(unique_id: impl Into<String>) -> ContextGuard {
    update(|ctx| ctx.current_image = Some(unique_id.into()))
}

#[must_use]
pub fn get_current_context() -> ValidationContext {
    CURRENT_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// Reset the current thread's context to empty.
pub fn reset_context() {
    CURRENT_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = ValidationContext::new();
    });
}
