//! Common test utilities for integration tests
//!
//! This module contains shared test fixtures and helper functions used across
//! integration tests. These utilities are not compiled into the library.

use anyhow::Result;
use codeblock_jscs::{CodeblockJscsTask, Options, Reporter, Status, TaskError, TaskOutcome};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated test fixture with automatic cleanup
///
/// Creates a temporary copy of the Markdown fixtures, allowing tests to run
/// in parallel without interfering with each other.
pub struct TestFixture {
    _dir: TempDir,
    path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture from the default input directory
    pub fn new() -> Result<Self> {
        Self::new_from("tests/fixtures/input")
    }

    /// Create a new test fixture from a specific source directory
    pub fn new_from(source: impl AsRef<Path>) -> Result<Self> {
        let dir = TempDir::new()?;

        // Copy fixture to temp location
        copy_dir_all(source.as_ref(), dir.path())?;

        Ok(Self {
            path: dir.path().to_path_buf(),
            _dir: dir,
        })
    }

    /// Path of a file inside the fixture
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

/// What one run produced, including the notifications it sent
///
/// The report and events are captured even when the run aborts, so tests can
/// check that nothing was written before the error.
pub struct RunRecord {
    pub result: Result<TaskOutcome, TaskError>,
    pub report: String,
    pub events: Vec<Status>,
}

impl RunRecord {
    /// The outcome of a run that is expected to complete
    pub fn outcome(&self) -> &TaskOutcome {
        match &self.result {
            Ok(outcome) => outcome,
            Err(e) => panic!("run aborted: {}", e),
        }
    }
}

/// Run the task over `files` with colors disabled, capturing the report
pub fn run_task(options: Options, files: &[PathBuf]) -> RunRecord {
    let task = CodeblockJscsTask::new(options).with_reporter(Reporter::without_colors());
    let mut out = Vec::new();
    let mut events = Vec::new();

    let result = task.run(files, &mut out, |event| events.push(event.status));

    RunRecord {
        result,
        report: String::from_utf8_lossy(&out).into_owned(),
        events,
    }
}

/// Recursively copy all files and directories from src to dst
fn copy_dir_all(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<()> {
    std::fs::create_dir_all(&dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let ty = entry.file_type()?;
        if ty.is_dir() {
            copy_dir_all(entry.path(), dst.as_ref().join(entry.file_name()))?;
        } else {
            std::fs::copy(entry.path(), dst.as_ref().join(entry.file_name()))?;
        }
    }
    Ok(())
}
