pub mod args;
pub mod ast;
pub mod cache;
pub mod color;
pub mod config;
pub mod conflict;
pub mod design_system;
pub mod diagnostics;
pub mod errors;
pub mod fuzzy;
pub mod lexer;
pub mod parser;
pub mod report;
pub mod resolver;
pub mod source;
pub mod theme;
pub mod token;

pub use args::{CheckArgs, Cli, Commands, PipeArgs};
pub use ast::{EmptyKind, EmptyNode, Node, ParseError, ParseResult, Selection};
pub use color::{extract_colors, ColorDesc, ColorDescriptor, ColorMatch};
pub use config::{AnalyzerConfig, DiagnosticOptions};
pub use conflict::{find_conflicts, Conflict, ConflictPolicy};
pub use design_system::{DesignSystem, DesignSystemData, RuleEntry, RuleSource, StaticDesignSystem, Vocabulary};
pub use diagnostics::{Analyzer, Diagnostic, DiagnosticKind, Hover, HoverTarget, Severity, Suggestion};
pub use errors::{AnalyzerError, Result};
pub use fuzzy::{Searcher, SuggestKind};
pub use parser::parse;
pub use report::{Report, ReportBuilder, ReportEntry};
pub use resolver::{Resolution, ResolutionExemption, Resolver};
pub use source::{find_expressions, Expression, ExpressionKind};
pub use theme::ThemeValue;
pub use token::{Token, TokenList};

use std::path::Path;
use std::time::Duration;

/// Result of a `check` run
#[derive(Debug)]
pub struct CheckResult {
    pub report: Report,
    pub files_checked: usize,
    pub duration: Duration,
}

/// Load the analyzer configuration, applying a policy override.
pub fn load_config(path: Option<&Path>, policy: Option<ConflictPolicy>) -> Result<AnalyzerConfig> {
    let mut config = match path {
        Some(path) => AnalyzerConfig::from_file(path)?,
        None => AnalyzerConfig::default(),
    };
    if let Some(policy) = policy {
        config.diagnostics.conflict = policy;
    }
    Ok(config)
}

/// Check every matching file against the design system
#[cfg(feature = "cli")]
pub async fn check(args: CheckArgs) -> Result<CheckResult> {
    use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
    use rayon::prelude::*;
    use std::sync::Arc;
    use std::time::Instant;
    use tracing::{debug, warn};

    let start_time = Instant::now();

    args.validate().map_err(AnalyzerError::InvalidInput)?;

    let config = load_config(args.config.as_deref(), args.policy)?;
    let design = StaticDesignSystem::from_file(&args.design_system)?;

    let files = collect_files(&args.input, &args.exclude)?;
    if files.is_empty() {
        return Err(AnalyzerError::NoFilesFound);
    }
    debug!(files = files.len(), policy = ?config.diagnostics.conflict, "Starting check");

    let progress_bar = if args.verbose {
        ProgressBar::with_draw_target(Some(files.len() as u64), ProgressDrawTarget::hidden())
    } else {
        ProgressBar::new(files.len() as u64)
    };
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({msg})")
    {
        progress_bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
    }
    progress_bar.set_message("Checking...");

    if let Some(jobs) = args.jobs {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(jobs).build_global() {
            warn!(jobs, error = %e, "Could not configure worker pool, using the existing one");
        }
    }

    // One analyzer per worker; the searcher is shared read-only.
    let searcher = Arc::new(Searcher::build(&design, config.fuzzy_threshold));
    let checked: Vec<(String, String, Vec<Diagnostic>)> = files
        .par_iter()
        .map_init(
            || Analyzer::with_searcher(&design, Arc::clone(&searcher), &config),
            |analyzer, path| {
                let outcome = match std::fs::read_to_string(path) {
                    Ok(source) => {
                        let diagnostics = analyzer.validate_source(&source);
                        Some((path.display().to_string(), source, diagnostics))
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping unreadable file");
                        None
                    }
                };
                progress_bar.inc(1);
                outcome
            },
        )
        .flatten()
        .collect();

    let files_checked = checked.len();
    let mut builder = ReportBuilder::new()
        .with_files_scanned(files_checked)
        .with_policy(config.diagnostics.conflict);
    for (path, source, diagnostics) in checked {
        builder = builder.with_file(path, &source, diagnostics);
    }
    let report = builder.build();

    progress_bar.finish_with_message(format!("✓ Checked {} files", files_checked));

    if !args.dry_run {
        if let Some(output) = &args.output {
            write_report(output, &report)?;
        }
    }

    Ok(CheckResult {
        report,
        files_checked,
        duration: start_time.elapsed(),
    })
}

/// Collect files matching the given patterns
#[cfg(feature = "cli")]
fn collect_files(patterns: &[String], exclude_patterns: &[String]) -> Result<Vec<std::path::PathBuf>> {
    let mut files = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for pattern in patterns {
        for entry in glob::glob(pattern)? {
            let path = entry?;

            if should_exclude(&path, exclude_patterns)? {
                continue;
            }
            if path.is_dir() {
                continue;
            }
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }

    Ok(files)
}

/// Check if a path should be excluded
#[cfg(feature = "cli")]
fn should_exclude(path: &Path, exclude_patterns: &[String]) -> Result<bool> {
    for pattern in exclude_patterns {
        let pattern = glob::Pattern::new(pattern)?;
        if pattern.matches_path(path) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Write the report as pretty JSON, atomically
pub fn write_report(path: &Path, report: &Report) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = report.to_pretty_json()?;
    write_atomic(path, &content).map_err(|e| AnalyzerError::OutputError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Write file atomically by writing to temp file then renaming
fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    use std::io::Write;

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let mut file = std::fs::File::create(&temp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    std::fs::rename(&temp_path, path)?;

    Ok(())
}

/// Handle pipe command - read source text from stdin, print diagnostics as JSON lines.
/// Returns the number of error-severity diagnostics.
#[cfg(feature = "cli")]
pub async fn handle_pipe_command(args: PipeArgs) -> Result<usize> {
    use tokio::io::{self, AsyncReadExt, AsyncWriteExt};

    let mut input = String::new();
    let mut stdin = io::stdin();
    stdin
        .read_to_string(&mut input)
        .await
        .map_err(|e| AnalyzerError::InputError(format!("Failed to read from stdin: {}", e)))?;

    if input.trim().is_empty() {
        return Ok(0);
    }

    let config = load_config(None, args.policy)?;
    let design = StaticDesignSystem::from_file(&args.design_system)?;
    let mut analyzer = Analyzer::new(&design, &config);

    let mut output = String::new();
    let mut errors = 0;
    for diagnostic in analyzer.validate_source(&input) {
        if diagnostic.is_error() {
            errors += 1;
        }
        let entry = ReportEntry::from_diagnostic(&input, diagnostic);
        output.push_str(&serde_json::to_string(&entry)?);
        output.push('\n');
    }

    let mut stdout = io::stdout();
    stdout
        .write_all(output.as_bytes())
        .await
        .map_err(|e| AnalyzerError::OutputError {
            path: "stdout".to_string(),
            message: e.to_string(),
        })?;
    stdout.flush().await.map_err(|e| AnalyzerError::OutputError {
        path: "stdout".to_string(),
        message: e.to_string(),
    })?;

    Ok(errors)
}
