//! codeblock-jscs library
//!
//! This library lints the JavaScript code blocks embedded in Markdown files
//! with a JSCS-style checker. The primary interface is the codeblock-jscs
//! binary, but the library can be used programmatically for testing or
//! custom integrations.
//!
//! ## Public API
//!
//! The main public interface is [`CodeblockJscsTask`], configured with
//! [`Options`] and run over a list of files.
//!
//! Additional utilities:
//! - [`jscs`] - The checker itself, its rules and presets
//! - [`ConfigFile`] - The TOML configuration file
//! - [`Reporter`] - Human-readable report rendering
//! - [`exit_codes`] - Process exit codes used by the binary

mod aggregator;
mod checker;
mod config;
mod error;
pub mod exit_codes;
mod extractor;
pub mod jscs;
mod loader;
mod reporting;
mod task;

pub use aggregator::{FileLintResult, LintStats};
pub use checker::build_checker;
pub use config::{
    locate_config_file, read_jscsrc, ConfigFile, LangFilter, Options, DEFAULT_CONFIG_FILE,
};
pub use error::TaskError;
pub use extractor::{tokenize_file, CodeToken, CodeTokens, FileTokenSet};
pub use loader::{load, FileRecord};
pub use reporting::{format_summary, group_by_file, report_fatal_error, Reporter};
pub use task::{CodeblockJscsTask, CompletionEvent, Status, TaskOutcome, EVENT_NAME};
