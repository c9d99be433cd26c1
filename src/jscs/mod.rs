//! A JSCS-style JavaScript code style checker.
//!
//! The checker mirrors the shape of the JSCS API so callers configure it the
//! same way:
//!
//! ```
//! use codeblock_jscs::jscs::Checker;
//! use serde_json::json;
//!
//! let mut checker = Checker::new();
//! checker.register_default_rules();
//! checker
//!     .configure(json!({ "preset": "jquery" }).as_object().unwrap())
//!     .unwrap();
//!
//! let results = checker.check_string("var x = 'single';\n").unwrap();
//! assert_eq!(results.error_list()[0].rule, "validateQuoteMarks");
//! ```
//!
//! Only a focused subset of the JSCS rules is implemented, see
//! [`rules::default_rules`]. Presets live in [`presets`].

pub mod presets;
pub mod rules;
mod syntax;

pub use syntax::ParseError;

use colored::Colorize;
use rules::{Errors, Rule, RuleFactory, SourceFile};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Rule configuration, keyed by rule name, as found in a `.jscsrc` file.
pub type RuleConfig = serde_json::Map<String, Value>;

/// The file name JSCS reports for strings checked with `check_string`.
pub const INPUT_FILENAME: &str = "input";

/// Lines of source shown on each side of the offending line by `explain_error`.
const CONTEXT_LINES: usize = 2;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unsupported rule: {0}")]
    UnsupportedRule(String),

    #[error("Preset \"{0}\" does not exist")]
    UnknownPreset(String),

    #[error("Invalid value for {rule}: {reason}")]
    InvalidValue { rule: String, reason: String },
}

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintError {
    pub rule: String,
    pub message: String,
    /// 1-based
    pub line: usize,
    /// 0-based
    pub column: usize,
}

/// The violations found in one checked string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCollection {
    filename: String,
    lines: Vec<String>,
    errors: Vec<LintError>,
}

impl ErrorCollection {
    fn new(source: &str, errors: Vec<LintError>) -> Self {
        Self {
            filename: INPUT_FILENAME.to_string(),
            lines: split_lines(source).into_iter().map(str::to_string).collect(),
            errors,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Violations ordered by position.
    pub fn error_list(&self) -> &[LintError] {
        &self.errors
    }

    /// Formats a violation with a short excerpt of the offending source.
    ///
    /// The first line reads `rule: message at <filename> :`, followed by up to
    /// two lines of context on each side and a `---^` pointer under the column.
    pub fn explain_error(&self, error: &LintError, colorize: bool) -> String {
        let headline = format!("{}: {}", error.rule, error.message);
        let mut out = if colorize {
            format!("{} at {} :", headline.bold(), self.filename.green())
        } else {
            format!("{} at {} :", headline, self.filename)
        };

        if error.line == 0 || error.line > self.lines.len() {
            return out;
        }

        let first = error.line.saturating_sub(CONTEXT_LINES).max(1);
        let last = (error.line + CONTEXT_LINES).min(self.lines.len());
        for number in first..=last {
            let gutter = format!("{:>6} |", number);
            out.push('\n');
            out.push_str(&gutter);
            out.push_str(&self.lines[number - 1]);
            if number == error.line {
                let pointer = format!("{}^", "-".repeat(gutter.len() + error.column));
                out.push('\n');
                if colorize {
                    out.push_str(&pointer.red().to_string());
                } else {
                    out.push_str(&pointer);
                }
            }
        }
        out
    }
}

/// A configurable style checker.
pub struct Checker {
    registry: BTreeMap<&'static str, RuleFactory>,
    active: BTreeMap<&'static str, Box<dyn Rule>>,
    max_errors: Option<usize>,
}

impl Checker {
    pub fn new() -> Self {
        Self {
            registry: BTreeMap::new(),
            active: BTreeMap::new(),
            max_errors: None,
        }
    }

    /// Makes every built-in rule available to `configure`. No rule is enabled yet.
    pub fn register_default_rules(&mut self) {
        for (name, factory) in rules::default_rules() {
            self.registry.insert(name, factory);
        }
    }

    /// Applies a rule configuration on top of the current one.
    ///
    /// A `preset` key is expanded first and the remaining keys override it.
    /// `null` or `false` disables a rule. Unknown rules, unknown presets and
    /// malformed values are rejected.
    pub fn configure(&mut self, config: &RuleConfig) -> Result<(), ConfigError> {
        let mut merged = RuleConfig::new();
        if let Some(preset) = config.get("preset") {
            let name = preset.as_str().ok_or_else(|| ConfigError::InvalidValue {
                rule: "preset".to_string(),
                reason: "preset name must be a string".to_string(),
            })?;
            let rules =
                presets::load(name).ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))?;
            merged.extend(rules);
        }
        for (key, value) in config.iter().filter(|(key, _)| *key != "preset") {
            merged.insert(key.clone(), value.clone());
        }

        for (key, value) in &merged {
            if key == "maxErrors" {
                self.max_errors = parse_max_errors(value)?;
                continue;
            }
            let (&name, factory) = self
                .registry
                .get_key_value(key.as_str())
                .ok_or_else(|| ConfigError::UnsupportedRule(key.clone()))?;
            if matches!(value, Value::Null | Value::Bool(false)) {
                self.active.remove(name);
                continue;
            }
            let rule = factory(value).map_err(|reason| ConfigError::InvalidValue {
                rule: key.clone(),
                reason,
            })?;
            self.active.insert(name, rule);
        }
        Ok(())
    }

    /// Names of the currently enabled rules, sorted.
    pub fn active_rules(&self) -> Vec<&'static str> {
        self.active.keys().copied().collect()
    }

    /// Checks a snippet of JavaScript.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when the snippet cannot be parsed. That is
    /// not a style violation, the input simply is not valid JavaScript.
    pub fn check_string(&self, source: &str) -> Result<ErrorCollection, ParseError> {
        let file = SourceFile::parse(source)?;
        let mut errors = Errors::default();
        for rule in self.active.values() {
            log::trace!("Running rule {}", rule.name());
            rule.check(&file, &mut errors);
        }

        let mut errors = errors.into_vec();
        errors.sort_by_key(|e| (e.line, e.column));
        if let Some(max) = self.max_errors {
            errors.truncate(max);
        }
        Ok(ErrorCollection::new(source, errors))
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_max_errors(value: &Value) -> Result<Option<usize>, ConfigError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => match n.as_u64() {
            Some(max) => Ok(Some(max as usize)),
            None => Err(ConfigError::InvalidValue {
                rule: "maxErrors".to_string(),
                reason: "must be a non-negative integer".to_string(),
            }),
        },
        _ => Err(ConfigError::InvalidValue {
            rule: "maxErrors".to_string(),
            reason: "must be a number or null".to_string(),
        }),
    }
}

/// Splits on `\n`, `\r\n` and `\r`. A trailing line break does not produce an empty last line.
pub(crate) fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while let Some(at) = rest.find(['\n', '\r']) {
        lines.push(&rest[..at]);
        let skip = if rest[at..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[at + skip..];
    }
    if !rest.is_empty() {
        lines.push(rest);
    }
    lines
}
