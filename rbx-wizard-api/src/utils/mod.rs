//! Utility modules.

/// Log helpers that keep source files and long bodies out of log lines.
pub mod log_sanitizer;
