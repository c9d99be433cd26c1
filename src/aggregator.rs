use crate::error::TaskError;
use crate::extractor::FileTokenSet;
use crate::jscs::{Checker, ErrorCollection};

/// The violations of one code block, tagged with the file it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLintResult {
    pub file: String,
    pub result: ErrorCollection,
}

/// Running totals for the end-of-run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LintStats {
    pub files: usize,
    pub blocks: usize,
}

/// Lints every code block of one file, appending non-empty results to `errors`.
///
/// Meant to be folded over the files of a run, so the output keeps file order
/// and, within a file, block order.
///
/// # Errors
///
/// A snippet the checker cannot parse aborts the whole run with
/// [`TaskError::LinterCrash`].
pub fn accumulate(
    checker: &Checker,
    mut errors: Vec<FileLintResult>,
    file_tokens: FileTokenSet<'_>,
    stats: &mut LintStats,
) -> Result<Vec<FileLintResult>, TaskError> {
    stats.files += 1;

    for (index, snippet) in file_tokens.tokens.enumerate() {
        stats.blocks += 1;
        log::debug!(
            "Checking {} block #{} in {}",
            snippet.lang,
            index,
            file_tokens.file
        );

        let result = checker
            .check_string(&snippet.text)
            .map_err(|e| TaskError::LinterCrash {
                file: file_tokens.file.to_string(),
                message: e.to_string(),
            })?;

        if !result.is_empty() {
            errors.push(FileLintResult {
                file: file_tokens.file.to_string(),
                result,
            });
        }
    }

    Ok(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::build_checker;
    use crate::config::Options;
    use crate::extractor::tokenize_file;
    use crate::loader::FileRecord;

    fn record(name: &str, contents: &str) -> FileRecord {
        FileRecord {
            name: name.to_string(),
            contents: contents.to_string(),
        }
    }

    #[test]
    fn test_collects_only_failing_blocks_in_order() {
        let options = Options::with_preset("jquery");
        let checker = build_checker(&options).unwrap();
        let first = record(
            "a.md",
            "```js\nvar ok = \"fine\";\n```\n\n```js\nvar bad = 'quote';\n```\n",
        );
        let second = record("b.md", "```js\nvar snake_case = \"x\";\n```\n");

        let mut stats = LintStats::default();
        let errors = [&first, &second]
            .into_iter()
            .map(|file| tokenize_file(&options, file))
            .try_fold(Vec::new(), |errors, set| {
                accumulate(&checker, errors, set, &mut stats)
            })
            .unwrap();

        let files: Vec<_> = errors.iter().map(|e| e.file.as_str()).collect();
        assert_eq!(files, vec!["a.md", "b.md"]);
        assert_eq!(
            errors[0].result.error_list()[0].rule,
            "validateQuoteMarks"
        );
        assert_eq!(stats, LintStats { files: 2, blocks: 3 });
    }

    #[test]
    fn test_unparsable_block_is_a_linter_crash() {
        let options = Options::with_preset("jquery");
        let checker = build_checker(&options).unwrap();
        let file = record("crash.md", "```js\nvar s = \"unterminated;\n```\n");

        let mut stats = LintStats::default();
        let err = accumulate(
            &checker,
            Vec::new(),
            tokenize_file(&options, &file),
            &mut stats,
        )
        .unwrap_err();

        match err {
            TaskError::LinterCrash { file, message } => {
                assert_eq!(file, "crash.md");
                assert!(message.contains("Unterminated string"), "{}", message);
            }
            other => panic!("expected a linter crash, got {:?}", other),
        }
    }
}
