//! Style rules and the factories that build them from configuration values.

use super::syntax::{self, ParseError, Syntax};
use super::{split_lines, LintError};
use serde_json::Value;
use std::collections::HashSet;

/// Builds a rule from its configuration value, or explains why the value is invalid.
///
/// Factories are only called for enabled rules; `null` and `false` are handled
/// by the checker before a factory is reached.
pub type RuleFactory = fn(&Value) -> Result<Box<dyn Rule>, String>;

pub trait Rule {
    fn name(&self) -> &'static str;
    fn check(&self, file: &SourceFile<'_>, errors: &mut Errors);
}

/// Every rule the checker knows about, by configuration key.
pub fn default_rules() -> Vec<(&'static str, RuleFactory)> {
    let rules: [(&'static str, RuleFactory); 14] = [
        (ValidateQuoteMarks::NAME, ValidateQuoteMarks::build),
        (RequireCamelCase::NAME, RequireCamelCase::build),
        (RequireLineFeedAtFileEnd::NAME, RequireLineFeedAtFileEnd::build),
        (DisallowTrailingWhitespace::NAME, DisallowTrailingWhitespace::build),
        (DisallowMixedSpacesAndTabs::NAME, DisallowMixedSpacesAndTabs::build),
        (MaximumLineLength::NAME, MaximumLineLength::build),
        (RequireCurlyBraces::NAME, RequireCurlyBraces::build),
        (RequireSpaceAfterKeywords::NAME, RequireSpaceAfterKeywords::build),
        (DisallowKeywords::NAME, DisallowKeywords::build),
        (DisallowMultipleLineBreaks::NAME, DisallowMultipleLineBreaks::build),
        (RequireSpacesInsideParentheses::NAME, RequireSpacesInsideParentheses::build),
        (DisallowSpacesInsideParentheses::NAME, DisallowSpacesInsideParentheses::build),
        (ValidateLineBreaks::NAME, ValidateLineBreaks::build),
        (DisallowMultipleVarDecl::NAME, DisallowMultipleVarDecl::build),
    ];
    rules.into()
}

/// A parsed snippet plus the per-line views rules need.
pub struct SourceFile<'a> {
    source: &'a str,
    lines: Vec<&'a str>,
    /// Byte offset where each line starts.
    line_starts: Vec<usize>,
    syntax: Syntax<'a>,
    comment_lines: HashSet<usize>,
}

impl<'a> SourceFile<'a> {
    pub fn parse(source: &'a str) -> Result<Self, ParseError> {
        let syntax = syntax::parse(source)?;
        let line_starts = line_starts(source);

        // Continuation lines of block comments, e.g. the ` * ` lines of a doc comment.
        let comment_lines = line_starts
            .iter()
            .enumerate()
            .filter(|&(_, &start)| {
                syntax
                    .comments
                    .iter()
                    .any(|c| c.block && c.range.start < start && start < c.range.end)
            })
            .map(|(index, _)| index + 1)
            .collect();

        Ok(Self {
            source,
            lines: split_lines(source),
            line_starts,
            syntax,
            comment_lines,
        })
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }

    pub(crate) fn syntax(&self) -> &Syntax<'a> {
        &self.syntax
    }

    /// Whether a 1-based line lies inside a block comment (excluding its first line).
    pub fn in_block_comment(&self, line: usize) -> bool {
        self.comment_lines.contains(&line)
    }

    /// Byte offset of the first character of a 1-based line.
    fn line_start(&self, line: usize) -> usize {
        self.line_starts[line - 1]
    }

    /// 1-based line and 0-based column of a byte offset.
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let index = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let start = self.line_starts[index];
        (index + 1, char_len(&self.source[start..offset]))
    }
}

fn line_starts(source: &str) -> Vec<usize> {
    let bytes = source.as_bytes();
    let mut starts = vec![0];
    for (at, &byte) in bytes.iter().enumerate() {
        let ends_line = byte == b'\n' || (byte == b'\r' && bytes.get(at + 1) != Some(&b'\n'));
        if ends_line {
            starts.push(at + 1);
        }
    }
    starts
}

#[derive(Default)]
pub struct Errors {
    list: Vec<LintError>,
}

impl Errors {
    pub fn add(&mut self, rule: &str, message: impl Into<String>, line: usize, column: usize) {
        self.list.push(LintError {
            rule: rule.to_string(),
            message: message.into(),
            line,
            column,
        });
    }

    /// Records a violation at a byte offset of the snippet.
    pub fn add_at(
        &mut self,
        file: &SourceFile<'_>,
        rule: &str,
        message: impl Into<String>,
        offset: usize,
    ) {
        let (line, column) = file.position(offset);
        self.add(rule, message, line, column);
    }

    pub fn into_vec(self) -> Vec<LintError> {
        self.list
    }
}

fn require_true(value: &Value) -> Result<(), String> {
    match value {
        Value::Bool(true) => Ok(()),
        _ => Err("accepted value is `true`".to_string()),
    }
}

fn string_list(value: &Value, all: &[&str]) -> Result<Vec<String>, String> {
    match value {
        Value::Bool(true) => Ok(all.iter().map(|s| s.to_string()).collect()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| "array items must be strings".to_string())
            })
            .collect(),
        _ => Err("value must be an array of strings or `true`".to_string()),
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

struct ValidateQuoteMarks {
    mark: Option<char>,
    escape: bool,
}

impl ValidateQuoteMarks {
    const NAME: &'static str = "validateQuoteMarks";

    fn parse_mark(value: &Value) -> Result<Option<char>, String> {
        match value {
            Value::Bool(true) => Ok(None),
            Value::String(mark) if mark == "\"" => Ok(Some('"')),
            Value::String(mark) if mark == "'" => Ok(Some('\'')),
            _ => Err("mark must be '\"', \"'\" or `true`".to_string()),
        }
    }

    fn build(value: &Value) -> Result<Box<dyn Rule>, String> {
        let (mark, escape) = match value {
            Value::Object(options) => {
                let mark = options
                    .get("mark")
                    .ok_or_else(|| "object value requires `mark`".to_string())?;
                let escape = options
                    .get("escape")
                    .map(|e| e.as_bool().ok_or("`escape` must be a boolean"))
                    .transpose()?
                    .unwrap_or(false);
                (Self::parse_mark(mark)?, escape)
            }
            other => (Self::parse_mark(other)?, false),
        };
        Ok(Box::new(Self { mark, escape }))
    }
}

impl Rule for ValidateQuoteMarks {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check(&self, file: &SourceFile<'_>, errors: &mut Errors) {
        let mut expected = self.mark;
        for range in &file.syntax().strings {
            let literal = &file.source()[range.clone()];
            let Some(quote) = literal.chars().next().filter(|&c| c == '"' || c == '\'') else {
                continue;
            };
            let mark = *expected.get_or_insert(quote);
            if quote == mark {
                continue;
            }
            let body = &literal[1..literal.len() - 1];
            if self.escape && body.contains(mark) {
                continue;
            }
            errors.add_at(file, Self::NAME, "Invalid quote mark found", range.start);
        }
    }
}

struct RequireCamelCase {
    ignore_properties: bool,
}

impl RequireCamelCase {
    const NAME: &'static str = "requireCamelCaseOrUpperCaseIdentifiers";

    fn build(value: &Value) -> Result<Box<dyn Rule>, String> {
        let ignore_properties = match value {
            Value::Bool(true) => false,
            Value::String(option) if option == "ignoreProperties" => true,
            _ => return Err("accepted values are `true` and \"ignoreProperties\"".to_string()),
        };
        Ok(Box::new(Self { ignore_properties }))
    }
}

impl Rule for RequireCamelCase {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check(&self, file: &SourceFile<'_>, errors: &mut Errors) {
        for identifier in &file.syntax().identifiers {
            let name = identifier.name.trim_matches(|c: char| c == '_' || c == '$');
            if !name.contains('_') || name.to_uppercase() == name {
                continue;
            }
            if self.ignore_properties && identifier.property {
                continue;
            }
            errors.add_at(
                file,
                Self::NAME,
                "All identifiers must be camelCase or UPPER_CASE",
                identifier.offset,
            );
        }
    }
}

struct RequireLineFeedAtFileEnd;

impl RequireLineFeedAtFileEnd {
    const NAME: &'static str = "requireLineFeedAtFileEnd";

    fn build(value: &Value) -> Result<Box<dyn Rule>, String> {
        require_true(value)?;
        Ok(Box::new(Self))
    }
}

impl Rule for RequireLineFeedAtFileEnd {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check(&self, file: &SourceFile<'_>, errors: &mut Errors) {
        let source = file.source();
        if source.is_empty() || source.ends_with('\n') || source.ends_with('\r') {
            return;
        }
        let lines = file.lines();
        let last = lines.last().copied().unwrap_or_default();
        errors.add(
            Self::NAME,
            "Missing line feed at file end",
            lines.len(),
            char_len(last),
        );
    }
}

struct DisallowTrailingWhitespace {
    ignore_empty_lines: bool,
}

impl DisallowTrailingWhitespace {
    const NAME: &'static str = "disallowTrailingWhitespace";

    fn build(value: &Value) -> Result<Box<dyn Rule>, String> {
        let ignore_empty_lines = match value {
            Value::Bool(true) => false,
            Value::String(option) if option == "ignoreEmptyLines" => true,
            _ => return Err("accepted values are `true` and \"ignoreEmptyLines\"".to_string()),
        };
        Ok(Box::new(Self { ignore_empty_lines }))
    }
}

impl Rule for DisallowTrailingWhitespace {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check(&self, file: &SourceFile<'_>, errors: &mut Errors) {
        for (index, line) in file.lines().iter().enumerate() {
            let trimmed = line.trim_end_matches([' ', '\t']);
            if trimmed.len() == line.len() {
                continue;
            }
            if self.ignore_empty_lines && trimmed.is_empty() {
                continue;
            }
            errors.add(
                Self::NAME,
                "Illegal trailing whitespace",
                index + 1,
                char_len(trimmed),
            );
        }
    }
}

struct DisallowMixedSpacesAndTabs {
    smart: bool,
}

impl DisallowMixedSpacesAndTabs {
    const NAME: &'static str = "disallowMixedSpacesAndTabs";

    fn build(value: &Value) -> Result<Box<dyn Rule>, String> {
        let smart = match value {
            Value::Bool(true) => false,
            Value::String(option) if option == "smart" => true,
            _ => return Err("accepted values are `true` and \"smart\"".to_string()),
        };
        Ok(Box::new(Self { smart }))
    }
}

impl Rule for DisallowMixedSpacesAndTabs {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check(&self, file: &SourceFile<'_>, errors: &mut Errors) {
        for (index, line) in file.lines().iter().enumerate() {
            if file.in_block_comment(index + 1) {
                continue;
            }
            let indent_len = line.len() - line.trim_start_matches([' ', '\t']).len();
            let indent = &line[..indent_len];
            // Smart tabs: tabs for indentation, then spaces for alignment.
            let mixed = if self.smart {
                indent.contains(" \t")
            } else {
                indent.contains(' ') && indent.contains('\t')
            };
            if mixed {
                errors.add(Self::NAME, "Mixed spaces and tabs found", index + 1, 0);
            }
        }
    }
}

struct MaximumLineLength {
    value: usize,
    allow_comments: bool,
    allow_url_comments: bool,
}

impl MaximumLineLength {
    const NAME: &'static str = "maximumLineLength";

    fn build(value: &Value) -> Result<Box<dyn Rule>, String> {
        let flag = |options: &serde_json::Map<String, Value>, key: &str| {
            options.get(key).and_then(Value::as_bool).unwrap_or(false)
        };
        let rule = match value {
            Value::Number(n) => Self {
                value: n.as_u64().ok_or("length must be a positive integer")? as usize,
                allow_comments: false,
                allow_url_comments: false,
            },
            Value::Object(options) => Self {
                value: options
                    .get("value")
                    .and_then(Value::as_u64)
                    .ok_or("object value requires a positive integer `value`")?
                    as usize,
                allow_comments: flag(options, "allowComments"),
                allow_url_comments: flag(options, "allowUrlComments"),
            },
            _ => return Err("value must be a number or an object".to_string()),
        };
        Ok(Box::new(rule))
    }

    fn is_comment_line(file: &SourceFile<'_>, number: usize, line: &str) -> bool {
        let indent = line.len() - line.trim_start().len();
        file.in_block_comment(number) || file.syntax().in_comment(file.line_start(number) + indent)
    }
}

impl Rule for MaximumLineLength {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check(&self, file: &SourceFile<'_>, errors: &mut Errors) {
        for (index, line) in file.lines().iter().enumerate() {
            if char_len(line) <= self.value {
                continue;
            }
            let comment = Self::is_comment_line(file, index + 1, line);
            if comment && self.allow_comments {
                continue;
            }
            if comment && self.allow_url_comments && line.contains("://") {
                continue;
            }
            errors.add(
                Self::NAME,
                format!("Line must be at most {} characters", self.value),
                index + 1,
                self.value,
            );
        }
    }
}

const CURLY_KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "do", "try", "catch", "finally", "with",
];

struct RequireCurlyBraces {
    keywords: Vec<String>,
}

impl RequireCurlyBraces {
    const NAME: &'static str = "requireCurlyBraces";

    fn build(value: &Value) -> Result<Box<dyn Rule>, String> {
        let keywords = string_list(value, CURLY_KEYWORDS)?;
        if let Some(unknown) = keywords.iter().find(|k| !CURLY_KEYWORDS.contains(&k.as_str())) {
            return Err(format!("unsupported keyword `{}`", unknown));
        }
        Ok(Box::new(Self { keywords }))
    }
}

impl Rule for RequireCurlyBraces {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check(&self, file: &SourceFile<'_>, errors: &mut Errors) {
        for body in &file.syntax().bodies {
            if body.braced || !self.keywords.iter().any(|k| k == body.keyword) {
                continue;
            }
            let mut statement = body.keyword.to_string();
            statement[..1].make_ascii_uppercase();
            errors.add_at(
                file,
                Self::NAME,
                format!("{} statement without curly braces", statement),
                body.offset,
            );
        }
    }
}

const SPACED_KEYWORDS: &[&str] = &[
    "do", "for", "if", "else", "switch", "case", "try", "catch", "void", "while", "with",
    "return", "typeof", "function",
];

struct RequireSpaceAfterKeywords {
    keywords: Vec<String>,
}

impl RequireSpaceAfterKeywords {
    const NAME: &'static str = "requireSpaceAfterKeywords";

    fn build(value: &Value) -> Result<Box<dyn Rule>, String> {
        Ok(Box::new(Self {
            keywords: string_list(value, SPACED_KEYWORDS)?,
        }))
    }
}

impl Rule for RequireSpaceAfterKeywords {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check(&self, file: &SourceFile<'_>, errors: &mut Errors) {
        for keyword in &file.syntax().keywords {
            if !self.keywords.iter().any(|k| k == keyword.keyword) {
                continue;
            }
            let end = keyword.offset + keyword.keyword.len();
            let spaced = match file.source()[end..].chars().next() {
                None | Some(';') => true,
                Some(next) => next.is_whitespace(),
            };
            if !spaced {
                errors.add_at(
                    file,
                    Self::NAME,
                    format!("Missing space after `{}` keyword", keyword.keyword),
                    end,
                );
            }
        }
    }
}

struct DisallowKeywords {
    keywords: Vec<String>,
}

impl DisallowKeywords {
    const NAME: &'static str = "disallowKeywords";

    fn build(value: &Value) -> Result<Box<dyn Rule>, String> {
        match value {
            Value::Array(_) => Ok(Box::new(Self {
                keywords: string_list(value, &[])?,
            })),
            _ => Err("value must be an array of strings".to_string()),
        }
    }
}

impl Rule for DisallowKeywords {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check(&self, file: &SourceFile<'_>, errors: &mut Errors) {
        for keyword in &file.syntax().keywords {
            if self.keywords.iter().any(|k| k == keyword.keyword) {
                errors.add_at(
                    file,
                    Self::NAME,
                    format!("Illegal keyword: {}", keyword.keyword),
                    keyword.offset,
                );
            }
        }
    }
}

struct DisallowMultipleLineBreaks;

impl DisallowMultipleLineBreaks {
    const NAME: &'static str = "disallowMultipleLineBreaks";

    fn build(value: &Value) -> Result<Box<dyn Rule>, String> {
        require_true(value)?;
        Ok(Box::new(Self))
    }
}

impl Rule for DisallowMultipleLineBreaks {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check(&self, file: &SourceFile<'_>, errors: &mut Errors) {
        let mut blank_run = 0;
        for (index, line) in file.lines().iter().enumerate() {
            if !line.trim().is_empty() {
                blank_run = 0;
                continue;
            }
            blank_run += 1;
            if blank_run == 2 {
                errors.add(Self::NAME, "Multiple line break", index + 1, 0);
            }
        }
    }
}

struct RequireSpacesInsideParentheses {
    all_but_nested: bool,
    except: Vec<String>,
}

impl RequireSpacesInsideParentheses {
    const NAME: &'static str = "requireSpacesInsideParentheses";

    fn build(value: &Value) -> Result<Box<dyn Rule>, String> {
        let rule = match value {
            Value::String(mode) if mode == "all" => Self {
                all_but_nested: false,
                except: Vec::new(),
            },
            Value::String(mode) if mode == "allButNested" => Self {
                all_but_nested: true,
                except: Vec::new(),
            },
            Value::Object(options) if options.get("all") == Some(&Value::Bool(true)) => Self {
                all_but_nested: false,
                except: match options.get("except") {
                    Some(except) => string_list(except, &[])?,
                    None => Vec::new(),
                },
            },
            _ => {
                return Err(concat!(
                    "accepted values are \"all\", \"allButNested\" ",
                    "or { \"all\": true, \"except\": [...] }"
                )
                .to_string())
            }
        };
        Ok(Box::new(rule))
    }

    fn exempt(&self, neighbour: &str, nested: &str) -> bool {
        self.except.iter().any(|e| e == neighbour) || (self.all_but_nested && neighbour == nested)
    }
}

/// The word or punctuator at the start of `text`.
fn leading_token(text: &str) -> &str {
    let word = text
        .find(|c: char| !is_word_char(c))
        .unwrap_or(text.len());
    match word {
        0 => text.chars().next().map_or("", |c| &text[..c.len_utf8()]),
        end => &text[..end],
    }
}

/// The word or punctuator at the end of `text`.
fn trailing_token(text: &str) -> &str {
    let word = text
        .rfind(|c: char| !is_word_char(c))
        .map_or(0, |at| at + text[at..].chars().next().map_or(1, char::len_utf8));
    match &text[word..] {
        "" => text.chars().last().map_or("", |c| &text[text.len() - c.len_utf8()..]),
        tail => tail,
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

impl Rule for RequireSpacesInsideParentheses {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check(&self, file: &SourceFile<'_>, errors: &mut Errors) {
        let source = file.source();
        for &(open, close) in &file.syntax().parens {
            let inside = &source[open + 1..close];
            if inside.trim().is_empty() {
                continue;
            }
            if !inside.starts_with(char::is_whitespace) && !self.exempt(leading_token(inside), "(")
            {
                errors.add_at(
                    file,
                    Self::NAME,
                    "Missing space after opening round bracket",
                    open + 1,
                );
            }
            if !inside.ends_with(char::is_whitespace) && !self.exempt(trailing_token(inside), ")") {
                errors.add_at(
                    file,
                    Self::NAME,
                    "Missing space before closing round bracket",
                    close,
                );
            }
        }
    }
}

struct DisallowSpacesInsideParentheses;

impl DisallowSpacesInsideParentheses {
    const NAME: &'static str = "disallowSpacesInsideParentheses";

    fn build(value: &Value) -> Result<Box<dyn Rule>, String> {
        require_true(value)?;
        Ok(Box::new(Self))
    }
}

impl Rule for DisallowSpacesInsideParentheses {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check(&self, file: &SourceFile<'_>, errors: &mut Errors) {
        let (source, syntax) = (file.source(), file.syntax());
        for &(open, close) in &syntax.parens {
            let inside = &source[open + 1..close];
            if inside.trim().is_empty() {
                continue;
            }
            // Only plain spaces on a single line count; comments and line breaks are left alone.
            let plain = |space: &str, next: usize| {
                !space.is_empty()
                    && space.chars().all(|c| c == ' ' || c == '\t')
                    && !syntax.in_comment(next)
            };
            let leading = &inside[..inside.len() - inside.trim_start().len()];
            if plain(leading, open + 1 + leading.len()) {
                errors.add_at(
                    file,
                    Self::NAME,
                    "Illegal space after opening round bracket",
                    open + 1,
                );
            }
            let trailing = &inside[inside.trim_end().len()..];
            let last = close - trailing.len();
            if plain(trailing, last.saturating_sub(1)) {
                errors.add_at(
                    file,
                    Self::NAME,
                    "Illegal space before closing round bracket",
                    close,
                );
            }
        }
    }
}

struct ValidateLineBreaks {
    expected: &'static str,
}

impl ValidateLineBreaks {
    const NAME: &'static str = "validateLineBreaks";

    fn build(value: &Value) -> Result<Box<dyn Rule>, String> {
        let expected = match value.as_str() {
            Some("LF") => "\n",
            Some("CRLF") => "\r\n",
            Some("CR") => "\r",
            _ => return Err("accepted values are \"LF\", \"CRLF\" and \"CR\"".to_string()),
        };
        Ok(Box::new(Self { expected }))
    }
}

impl Rule for ValidateLineBreaks {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check(&self, file: &SourceFile<'_>, errors: &mut Errors) {
        let mut rest = file.source();
        let mut line = 1;
        while let Some(at) = rest.find(['\n', '\r']) {
            let terminator = if rest[at..].starts_with("\r\n") {
                "\r\n"
            } else {
                &rest[at..at + 1]
            };
            if terminator != self.expected {
                errors.add(Self::NAME, "Invalid line break", line, char_len(&rest[..at]));
            }
            rest = &rest[at + terminator.len()..];
            line += 1;
        }
    }
}

struct DisallowMultipleVarDecl {
    strict: bool,
}

impl DisallowMultipleVarDecl {
    const NAME: &'static str = "disallowMultipleVarDecl";

    fn build(value: &Value) -> Result<Box<dyn Rule>, String> {
        let strict = match value {
            Value::Bool(true) => false,
            Value::String(option) if option == "strict" => true,
            _ => return Err("accepted values are `true` and \"strict\"".to_string()),
        };
        Ok(Box::new(Self { strict }))
    }
}

impl Rule for DisallowMultipleVarDecl {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check(&self, file: &SourceFile<'_>, errors: &mut Errors) {
        for declaration in &file.syntax().declarations {
            if !self.strict && declaration.in_for_header {
                continue;
            }
            if declaration.declarators > 1 {
                errors.add_at(file, Self::NAME, "Multiple var declaration", declaration.offset);
            }
        }
    }
}
