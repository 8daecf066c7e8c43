use std::collections::HashMap;
use tracing::error;

use crate::error::ErrorDescriptor;

/// How a caller wants fetch failures surfaced. Presentation stays with
/// the caller; the client never renders anything itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorDisplayMode {
    /// Log through the tracing pipeline.
    #[default]
    Console,
    /// Stored on the handle only; the caller renders it.
    Inline,
}

pub fn display_error(descriptor: &ErrorDescriptor, mode: ErrorDisplayMode) {
    match mode {
        ErrorDisplayMode::Console => {
            error!("{} (status {})", descriptor.message, descriptor.status);
        }
        ErrorDisplayMode::Inline => {}
    }
}

/// Flattens a backend validation map into one line per field, sorted
/// for stable output.
pub fn format_validation_errors(errors: &HashMap<String, Vec<String>>) -> String {
    let mut lines: Vec<String> = errors
        .iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
        .collect();
    lines.sort();
    lines.join("\n")
}
