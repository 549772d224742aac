use std::fs::{self, File};
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use syncdir::{
    ActionSink, ConsoleProgress, JsonLinesWriter, NoProgress, Planner, ProgressReporter,
    ShellScriptWriter,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "SYNCDIR_LOG";

/// How the plan is written
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Format {
    /// Shell commands with rationale comments
    #[default]
    Shell,
    /// One JSON object per action
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "syncdir")]
#[command(about = "Print the shell commands that would make RIGHT a mirror of LEFT")]
#[command(version)]
struct Cli {
    /// Directory to mirror from
    left: PathBuf,

    /// Directory to mirror onto
    right: PathBuf,

    /// Plan format
    #[arg(long, value_enum, default_value_t = Format::Shell)]
    format: Format,

    /// Write the plan to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Do not show the progress indicator
    #[arg(short, long)]
    quiet: bool,

    /// Log filter used when SYNCDIR_LOG is not set
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("syncdir: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so they never mix with the plan
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let planner = Planner::new(&cli.left, &cli.right)?;

    let out: Box<dyn Write> = match &cli.output {
        Some(path) => {
            ensure_outside_roots(path, &planner)?;
            let file = File::create(path)
                .with_context(|| format!("cannot create '{}'", path.display()))?;
            Box::new(file)
        }
        None => Box::new(io::stdout().lock()),
    };
    let out = BufWriter::new(out);

    let mut sink: Box<dyn ActionSink> = match cli.format {
        Format::Shell => Box::new(ShellScriptWriter::new(out)),
        Format::Json => Box::new(JsonLinesWriter::new(out)),
    };

    let mut progress: Box<dyn ProgressReporter> = if cli.quiet || !io::stderr().is_terminal() {
        Box::new(NoProgress)
    } else {
        Box::new(ConsoleProgress::new(io::stderr()))
    };

    let summary = planner.run(sink.as_mut(), progress.as_mut())?;
    debug!(
        copies = summary.copies,
        overwrites = summary.overwrites,
        removals = summary.removals,
        "plan written"
    );

    Ok(())
}

/// A plan file inside either tree would end up in its own plan
fn ensure_outside_roots(output: &Path, planner: &Planner) -> Result<()> {
    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let dir = fs::canonicalize(parent)
        .with_context(|| format!("cannot resolve '{}'", parent.display()))?;

    for (side, root) in [("left", planner.left_root()), ("right", planner.right_root())] {
        if dir.starts_with(root) {
            bail!(
                "output '{}' is inside the {} dir '{}'",
                output.display(),
                side,
                root.display()
            );
        }
    }
    Ok(())
}
