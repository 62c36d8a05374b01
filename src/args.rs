use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::conflict::ConflictPolicy;

/// Tailwind Analyzer CLI - Checks twin class expressions against a design system
#[derive(Parser, Debug)]
#[command(name = "tailwind-analyzer-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check source files and write a diagnostic report
    Check(CheckArgs),
    /// Check source text from stdin and print diagnostics as JSON lines
    Pipe(PipeArgs),
}

/// Arguments for the check command
#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    /// Input file patterns (glob patterns supported)
    #[arg(
        short = 'i',
        long = "input",
        value_name = "PATTERN",
        required = true,
        num_args = 1..,
        help = "Input file patterns to scan for twin expressions"
    )]
    pub input: Vec<String>,

    /// Design system description (YAML or JSON)
    #[arg(
        short = 'd',
        long = "design-system",
        value_name = "PATH",
        env = "TAILWIND_ANALYZER_DESIGN_SYSTEM",
        required = true,
        help = "Path to the resolved design system (YAML or JSON)"
    )]
    pub design_system: PathBuf,

    /// Analyzer configuration file path
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        help = "Path to analyzer configuration file (YAML or JSON)"
    )]
    pub config: Option<PathBuf>,

    /// Report output path (JSON)
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        help = "Path where the JSON report will be written"
    )]
    pub output: Option<PathBuf>,

    /// Conflict policy override
    #[arg(
        long = "policy",
        value_enum,
        value_name = "POLICY",
        help = "Conflict policy, overriding the configuration file"
    )]
    pub policy: Option<ConflictPolicy>,

    /// Exclude patterns (glob patterns to exclude)
    #[arg(
        short = 'e',
        long = "exclude",
        value_name = "PATTERN",
        num_args = 0..,
        help = "Patterns to exclude from scanning"
    )]
    pub exclude: Vec<String>,

    /// Number of parallel threads to use
    #[arg(
        short = 'j',
        long = "jobs",
        value_name = "NUM",
        help = "Number of parallel threads to use (defaults to number of CPU cores)"
    )]
    pub jobs: Option<usize>,

    /// Dry run (don't write the report)
    #[arg(
        long = "dry-run",
        default_value_t = false,
        help = "Perform the check but don't write the report"
    )]
    pub dry_run: bool,

    /// Verbose output
    #[arg(
        short = 'v',
        long = "verbose",
        default_value_t = false,
        help = "Enable verbose output"
    )]
    pub verbose: bool,
}

/// Arguments for the pipe command
#[derive(Parser, Debug, Clone)]
pub struct PipeArgs {
    /// Design system description (YAML or JSON)
    #[arg(
        short = 'd',
        long = "design-system",
        value_name = "PATH",
        env = "TAILWIND_ANALYZER_DESIGN_SYSTEM",
        required = true,
        help = "Path to the resolved design system (YAML or JSON)"
    )]
    pub design_system: PathBuf,

    /// Conflict policy override
    #[arg(
        long = "policy",
        value_enum,
        value_name = "POLICY",
        help = "Conflict policy (defaults to strict)"
    )]
    pub policy: Option<ConflictPolicy>,
}

impl CheckArgs {
    /// Validate that the arguments are consistent
    pub fn validate(&self) -> Result<(), String> {
        if self.input.is_empty() {
            return Err("At least one input pattern must be provided".to_string());
        }

        if let Some(output) = &self.output {
            if Some(output) == self.config.as_ref() || output == &self.design_system {
                return Err("Report path must differ from the input configuration files".to_string());
            }
        }

        if let Some(jobs) = self.jobs {
            if jobs == 0 {
                return Err("Number of jobs must be at least 1".to_string());
            }
        }

        Ok(())
    }
}
