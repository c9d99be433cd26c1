use crate::aggregator::{accumulate, FileLintResult, LintStats};
use crate::checker::build_checker;
use crate::config::Options;
use crate::error::TaskError;
use crate::extractor::tokenize_file;
use crate::loader::load;
use crate::reporting::{format_summary, group_by_file, Reporter};
use std::fmt;
use std::io::Write;
use std::path::Path;

/// Name carried by every completion notification.
pub const EVENT_NAME: &str = "codeblock-jscs";

/// Final verdict of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No violations.
    Success,
    /// Violations were found but `force` was set.
    Forced,
    /// Violations were found.
    Error,
}

impl Status {
    fn decide(no_errors: bool, force: bool) -> Self {
        match (no_errors, force) {
            (true, _) => Status::Success,
            (false, true) => Status::Forced,
            (false, false) => Status::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Forced => "forced",
            Status::Error => "error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivered once per run, after the report has been written.
#[derive(Debug)]
pub struct CompletionEvent<'a> {
    pub name: &'static str,
    pub status: Status,
    pub results: &'a [FileLintResult],
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct TaskOutcome {
    pub status: Status,
    pub results: Vec<FileLintResult>,
    pub stats: LintStats,
}

impl TaskOutcome {
    /// Whether the caller should carry on: no violations, or violations under `force`.
    pub fn passed(&self) -> bool {
        self.status != Status::Error
    }
}

/// Lints the JavaScript code blocks of a set of Markdown files.
///
/// # Overview
///
/// A run loads every file, extracts the code blocks whose language matches
/// [`Options::lang`], checks each block with a JSCS-style checker and writes a
/// report grouped by file. Everything happens sequentially; the first
/// configuration, I/O or parse failure aborts the run with no report.
///
/// # Example
///
/// ```no_run
/// use codeblock_jscs::{CodeblockJscsTask, Options};
///
/// let task = CodeblockJscsTask::new(Options::with_preset("jquery"));
/// let outcome = task
///     .run(&["slides.md"], &mut std::io::stdout(), |event| {
///         println!("{}: {}", event.name, event.status);
///     })
///     .unwrap();
/// std::process::exit(if outcome.passed() { 0 } else { 1 });
/// ```
pub struct CodeblockJscsTask {
    options: Options,
    reporter: Reporter,
}

impl CodeblockJscsTask {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            reporter: Reporter::default(),
        }
    }

    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Runs the whole pipeline over `paths`, writing the report to `out`.
    ///
    /// `on_complete` is called exactly once, after the report and before
    /// returning. It is not called when the run aborts.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Neither a preset nor JSCS options are configured, or the linter rejects them
    /// - A file cannot be read
    /// - A code block cannot be parsed by the linter
    /// - The report cannot be written
    pub fn run<P, W, F>(
        &self,
        paths: &[P],
        out: &mut W,
        on_complete: F,
    ) -> Result<TaskOutcome, TaskError>
    where
        P: AsRef<Path>,
        W: Write,
        F: FnOnce(&CompletionEvent<'_>),
    {
        let checker = build_checker(&self.options)?;

        log::debug!("Loading {} file(s)", paths.len());
        let files = paths
            .iter()
            .map(|path| load(path.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("Linting code blocks");
        let mut stats = LintStats::default();
        let results = files
            .iter()
            .map(|file| tokenize_file(&self.options, file))
            .try_fold(Vec::new(), |errors, file_tokens| {
                accumulate(&checker, errors, file_tokens, &mut stats)
            })?;

        log::debug!("Reporting {} result(s)", results.len());
        self.reporter.render(&group_by_file(&results), out)?;
        log::info!("{}", format_summary(&stats, &results));

        let status = Status::decide(results.is_empty(), self.options.force);
        on_complete(&CompletionEvent {
            name: EVENT_NAME,
            status,
            results: &results,
        });

        Ok(TaskOutcome {
            status,
            results,
            stats,
        })
    }
}
