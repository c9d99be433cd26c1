//! Process exit codes.
//!
//! These let CI systems tell style violations apart from a broken setup.

/// No violations, or violations reported under `force`.
pub const SUCCESS: i32 = 0;

/// One or more code blocks violate the configured style.
pub const VIOLATIONS_FOUND: i32 = 1;

/// Configuration error, unreadable file, linter crash or failed output.
pub const TOOL_ERROR: i32 = 2;
