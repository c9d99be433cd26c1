use crate::jscs::RuleConfig;
use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "codeblock-jscs.toml";

/// Which fenced code blocks get linted, by their language tag.
#[derive(Debug, Clone)]
pub enum LangFilter {
    /// Every code block, including indented blocks which carry no tag.
    Any,
    /// Tags equal to this string.
    Exact(String),
    /// Tags matching this pattern.
    Pattern(Regex),
}

impl LangFilter {
    pub fn matches(&self, lang: &str) -> bool {
        match self {
            LangFilter::Any => true,
            LangFilter::Exact(tag) => tag == lang,
            LangFilter::Pattern(pattern) => pattern.is_match(lang),
        }
    }

    pub fn pattern(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .with_context(|| format!("Invalid language pattern '{}'", pattern))?;
        Ok(LangFilter::Pattern(regex))
    }
}

impl Default for LangFilter {
    fn default() -> Self {
        LangFilter::Pattern(Regex::new("^(js|javascript)$").expect("default pattern is valid"))
    }
}

/// Options for one lint run.
///
/// At least one of `preset` or `jscs_options` must be set for the checker to
/// be built; when both are set `jscs_options` wins.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub lang: LangFilter,
    /// Report violations but still pass.
    pub force: bool,
    pub preset: Option<String>,
    pub jscs_options: Option<RuleConfig>,
}

impl Options {
    pub fn with_preset(preset: impl Into<String>) -> Self {
        Self {
            preset: Some(preset.into()),
            ..Self::default()
        }
    }

    pub fn with_jscs_options(jscs_options: RuleConfig) -> Self {
        Self {
            jscs_options: Some(jscs_options),
            ..Self::default()
        }
    }
}

/// `lang` as written in the config file: `lang = "js"` or `lang = { pattern = "^js" }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LangSetting {
    Exact(String),
    Pattern { pattern: String },
}

/// The TOML config file.
///
/// # Example
///
/// ```toml
/// lang = { pattern = "^(js|javascript)$" }
/// force = false
///
/// [jscs-options]
/// preset = "jquery"
/// validateQuoteMarks = false
/// ```
///
/// TOML has no `null`, so rules are disabled with `false`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    pub lang: Option<LangSetting>,
    pub force: Option<bool>,
    pub preset: Option<String>,
    /// Path to a JSON `.jscsrc` (supports ${VAR} environment variable expansion)
    pub jscsrc: Option<String>,
    pub jscs_options: Option<toml::Table>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Resolves the file into run options. Relative paths are taken from `base_dir`.
    pub fn into_options(self, base_dir: &Path) -> Result<Options> {
        let lang = match self.lang {
            None => LangFilter::default(),
            Some(LangSetting::Exact(tag)) => LangFilter::Exact(tag),
            Some(LangSetting::Pattern { pattern }) => LangFilter::pattern(&pattern)?,
        };

        let mut jscs_options = match self.jscsrc {
            Some(path) => {
                let path = base_dir.join(expand_env_vars(&path));
                Some(read_jscsrc(&path)?)
            }
            None => None,
        };

        if let Some(table) = self.jscs_options {
            let value = serde_json::to_value(table).context("Invalid [jscs-options] table")?;
            let inline = value.as_object().cloned().unwrap_or_default();
            // Inline rules refine whatever the .jscsrc set.
            jscs_options.get_or_insert_with(RuleConfig::new).extend(inline);
        }

        Ok(Options {
            lang,
            force: self.force.unwrap_or(false),
            preset: self.preset,
            jscs_options,
        })
    }
}

/// Reads a JSON rule configuration in the `.jscsrc` format.
pub fn read_jscsrc(path: &Path) -> Result<RuleConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    match value {
        serde_json::Value::Object(rules) => Ok(rules),
        _ => anyhow::bail!("{} must contain a JSON object", path.display()),
    }
}

/// Finds the config file to use: the explicit one, or the default name if it exists.
pub fn locate_config_file(explicit: Option<&Path>, working_dir: &Path) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = working_dir.join(DEFAULT_CONFIG_FILE);
            default.is_file().then_some(default)
        }
    }
}

/// Expand environment variables in a string
/// Supports ${VAR_NAME} syntax
/// This function processes the string in a single pass to avoid re-processing expanded values
fn expand_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_name = String::new();
            let mut found_close = false;

            for ch in chars.by_ref() {
                if ch == '}' {
                    found_close = true;
                    break;
                }
                var_name.push(ch);
            }

            if found_close {
                match env::var(&var_name) {
                    Ok(value) => result.push_str(&value),
                    Err(_) => {
                        log::warn!(
                            "Environment variable '{}' not found, leaving unexpanded",
                            var_name
                        );
                        result.push_str("${");
                        result.push_str(&var_name);
                        result.push('}');
                    }
                }
            } else {
                // No closing brace found, treat as literal
                result.push_str("${");
                result.push_str(&var_name);
            }
        } else {
            result.push(ch);
        }
    }

    result
}
