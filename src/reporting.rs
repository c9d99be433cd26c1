use crate::aggregator::{FileLintResult, LintStats};
use crate::jscs::{ErrorCollection, LintError};
use colored::Colorize;
use indexmap::IndexMap;
use std::fmt::Display;
use std::io::{self, Write};

const INDENT: &str = "  ";

/// Groups results by file, keeping files in the order they were first seen.
pub fn group_by_file(results: &[FileLintResult]) -> IndexMap<&str, Vec<&ErrorCollection>> {
    let mut grouped: IndexMap<&str, Vec<&ErrorCollection>> = IndexMap::new();
    for entry in results {
        grouped
            .entry(entry.file.as_str())
            .or_default()
            .push(&entry.result);
    }
    grouped
}

/// Human-readable report writer.
pub struct Reporter {
    use_colors: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self { use_colors: true }
    }
}

impl Reporter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    pub fn without_colors() -> Self {
        Self { use_colors: false }
    }

    /// Writes one section per file. Writes nothing when there are no results.
    pub fn render<W: Write>(
        &self,
        grouped: &IndexMap<&str, Vec<&ErrorCollection>>,
        out: &mut W,
    ) -> io::Result<()> {
        for (file, results) in grouped {
            writeln!(out, "{}", self.render_file_report(file, results))?;
        }
        Ok(())
    }

    /// A blank line, the file name, then every violation indented, separated by blank lines.
    pub fn render_file_report(&self, file: &str, results: &[&ErrorCollection]) -> String {
        let title = if self.use_colors {
            file.underline().to_string()
        } else {
            file.to_string()
        };

        let violations: Vec<String> = results
            .iter()
            .flat_map(|collection| {
                collection
                    .error_list()
                    .iter()
                    .map(|error| self.render_violation(collection, error))
            })
            .collect();

        format!("\n{}\n{}", title, violations.join("\n\n"))
    }

    /// The linter's explanation without its location suffix, indented.
    ///
    /// The location names the snippet buffer rather than the Markdown file, so it
    /// only adds noise.
    fn render_violation(&self, collection: &ErrorCollection, error: &LintError) -> String {
        let explained = collection.explain_error(error, self.use_colors);
        let (header, excerpt) = match explained.split_once('\n') {
            Some((header, excerpt)) => (header, Some(excerpt)),
            None => (explained.as_str(), None),
        };
        let header = header
            .rsplit_once(" at ")
            .filter(|(_, location)| location.contains(collection.filename()))
            .map_or(header, |(message, _)| message);

        std::iter::once(header)
            .chain(excerpt.into_iter().flat_map(str::lines))
            .map(|line| format!("{}{}", INDENT, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One line describing how much was checked and found.
pub fn format_summary(stats: &LintStats, results: &[FileLintResult]) -> String {
    let violations: usize = results.iter().map(|r| r.result.len()).sum();
    format!(
        "{} code block(s) checked in {} file(s): {} violation(s)",
        stats.blocks, stats.files, violations
    )
}

/// Formats an error message with a timestamp and the tool prefix.
fn format_error<'a>(
    timestamp: &chrono::format::DelayedFormat<chrono::format::StrftimeItems<'a>>,
    message: &str,
) -> String {
    format!("{} [ERROR] (codeblock_jscs): {}", timestamp, message)
}

/// Reports an error that aborted the run to stderr, one prefixed line per message line.
pub fn report_fatal_error(error: &dyn Display) {
    use chrono::Local;
    let now = Local::now();
    let timestamp = now.format("%Y-%m-%d %H:%M:%S");

    for line in error.to_string().lines() {
        eprintln!("{}", format_error(&timestamp, line));
    }
    eprintln!("{}", format_error(&timestamp, "Code block linting aborted"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::build_checker;
    use crate::config::Options;

    fn result(file: &str, snippet: &str) -> FileLintResult {
        let checker = build_checker(&Options::with_preset("jquery")).unwrap();
        FileLintResult {
            file: file.to_string(),
            result: checker.check_string(snippet).unwrap(),
        }
    }

    #[test]
    fn test_grouping_preserves_first_seen_order() {
        let results = vec![
            result("b.md", "var x = 'one';"),
            result("a.md", "var y = 'two';"),
            result("b.md", "var z = 'three';"),
        ];
        let grouped = group_by_file(&results);
        let files: Vec<_> = grouped.keys().copied().collect();
        assert_eq!(files, vec!["b.md", "a.md"]);
        assert_eq!(grouped["b.md"].len(), 2);

        let flattened: Vec<_> = grouped.values().flatten().copied().collect();
        assert_eq!(
            flattened,
            vec![&results[0].result, &results[2].result, &results[1].result]
        );
    }

    #[test]
    fn test_file_report_strips_location_and_indents() {
        let results = vec![result("slides.md", "var bad = 'quote';")];
        let grouped = group_by_file(&results);
        let report =
            Reporter::without_colors().render_file_report("slides.md", &grouped["slides.md"]);
        assert_eq!(
            report,
            [
                "",
                "slides.md",
                "  validateQuoteMarks: Invalid quote mark found",
                "       1 |var bad = 'quote';",
                "  ------------------^",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_violations_are_separated_by_blank_lines() {
        let results = vec![result("slides.md", "var a_b = 'x';")];
        let grouped = group_by_file(&results);
        let report =
            Reporter::without_colors().render_file_report("slides.md", &grouped["slides.md"]);
        let blocks: Vec<_> = report.trim_start().split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains("requireCamelCaseOrUpperCaseIdentifiers"));
        assert!(blocks[1].starts_with("  validateQuoteMarks"));
        assert!(!report.contains(" at input :"));
    }

    #[test]
    fn test_colored_report_strips_location() {
        let results = vec![result("slides.md", "var bad = 'quote';")];
        let grouped = group_by_file(&results);
        let report = Reporter::new(true).render_file_report("slides.md", &grouped["slides.md"]);
        assert!(report.contains("Invalid quote mark found"));
        assert!(!report.contains("input"));
    }

    #[test]
    fn test_render_nothing_for_no_results() {
        let mut out = Vec::new();
        Reporter::default()
            .render(&group_by_file(&[]), &mut out)
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_summary() {
        let results = vec![result("slides.md", "var a_b = 'x';")];
        let stats = LintStats { files: 1, blocks: 4 };
        assert_eq!(
            format_summary(&stats, &results),
            "4 code block(s) checked in 1 file(s): 2 violation(s)"
        );
    }
}
