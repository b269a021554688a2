//! Tracing and logging setup shared by every ERS service binary.

/// Tracing configuration (filters, formats).
pub mod tracing;

pub use crate::tracing::{LogFormat, LogSettings};

/// Initialize process-wide tracing for `service`.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init(service: &str, settings: &LogSettings) {
    crate::tracing::init(service, settings);
}
