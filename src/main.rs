use anyhow::{Context, Result};
use clap::Parser;
use codeblock_jscs::exit_codes::{SUCCESS, TOOL_ERROR, VIOLATIONS_FOUND};
use codeblock_jscs::{
    locate_config_file, read_jscsrc, report_fatal_error, CodeblockJscsTask, ConfigFile,
    LangFilter, Options, Reporter,
};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Markdown files to lint
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Configuration file path (defaults to ./codeblock-jscs.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Named style preset (jquery, google)
    #[arg(short, long)]
    preset: Option<String>,

    /// JSON rule configuration in the .jscsrc format
    #[arg(long)]
    jscsrc: Option<PathBuf>,

    /// Only lint code blocks tagged exactly with this language
    #[arg(long, conflicts_with = "lang_pattern")]
    lang: Option<String>,

    /// Only lint code blocks whose language matches this regular expression
    #[arg(long)]
    lang_pattern: Option<String>,

    /// Report violations but exit successfully
    #[arg(short, long)]
    force: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

pub fn main() {
    init_logger();
    let cli = Cli::parse();

    match run(cli) {
        Ok(passed) => exit(exit_code(passed)),
        Err(e) => {
            report_fatal_error(&format!("{:#}", e));
            exit(TOOL_ERROR);
        }
    }
}

fn exit_code(passed: bool) -> i32 {
    if passed {
        SUCCESS
    } else {
        VIOLATIONS_FOUND
    }
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] ({}): {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

/// Returns whether the run passed.
fn run(cli: Cli) -> Result<bool> {
    let use_colors = !cli.no_color && io::stdout().is_terminal();
    colored::control::set_override(use_colors);

    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let options = resolve_options(&cli, &working_dir)?;
    let task = CodeblockJscsTask::new(options).with_reporter(Reporter::new(use_colors));

    let mut stdout = io::stdout().lock();
    let outcome = task.run(&cli.files, &mut stdout, |event| {
        log::debug!("{} finished with status {}", event.name, event.status);
    })?;
    stdout.flush()?;

    Ok(outcome.passed())
}

/// Config file first, then command line flags on top.
fn resolve_options(cli: &Cli, working_dir: &Path) -> Result<Options> {
    let mut options = match locate_config_file(cli.config.as_deref(), working_dir) {
        Some(path) => {
            log::debug!("Using config file {}", path.display());
            let base_dir = path.parent().unwrap_or(Path::new("."));
            ConfigFile::load(&path)?.into_options(base_dir)?
        }
        None => Options::default(),
    };

    if let Some(preset) = &cli.preset {
        options.preset = Some(preset.clone());
    }
    if let Some(path) = &cli.jscsrc {
        options.jscs_options = Some(read_jscsrc(path)?);
    }
    if let Some(lang) = &cli.lang {
        options.lang = LangFilter::Exact(lang.clone());
    }
    if let Some(pattern) = &cli.lang_pattern {
        options.lang = LangFilter::pattern(pattern)?;
    }
    options.force |= cli.force;

    Ok(options)
}
