//! Crash reports that say what the validator was doing.
//!
//! A panic inside a rayon worker otherwise only reports a source location.
//! The hook adds the thread's [`ValidationContext`]: the phase, the pipeline
//! version and the image being classified when the panic happened.

use super::context::{get_current_context, ValidationContext};
use std::panic::PanicHookInfo;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Replace the process panic hook with one that prints a crash report.
///
/// Meant for binaries embedding the validator; call it once at startup.
///
/// ```ignore
/// pipeline_check::observability::install_panic_hook();
/// ```
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("{}", report_for(info));
    }));
}

fn report_for(info: &PanicHookInfo<'_>) -> String {
    let location = info
        .location()
        .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
    crash_report(
        &panic_message(info.payload()),
        location.as_deref(),
        &get_current_context(),
    )
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Render the crash report text.
pub fn crash_report(message: &str, location: Option<&str>, context: &ValidationContext) -> String {
    let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    let mut lines = vec![
        "=== pipeline-check crash report ===".to_string(),
        format!("version:  {VERSION} ({})", std::env::consts::OS),
        format!("time:     {timestamp}"),
        format!("panic:    {message}"),
    ];
    if let Some(location) = location {
        lines.push(format!("location: {location}"));
    }

    match context.phase {
        Some(phase) => lines.push(format!("phase:    {phase}")),
        None => lines.push("phase:    (not set, crash happened outside a validation run)".to_string()),
    }
    if let Some(version) = context.pipeline_version {
        lines.push(format!("pipeline: v{version}"));
    }
    if let Some(image) = &context.current_image {
        lines.push(format!("image:    {image}"));
    }

    if std::env::var_os("RUST_BACKTRACE").is_some() {
        lines.push(std::backtrace::Backtrace::capture().to_string());
    } else {
        lines.push("Run with RUST_BACKTRACE=1 for a stack trace".to_string());
    }
    lines.join("\n")
}
