use anyhow::Context;
use clap::Parser;
use tailwind_analyzer::{check, handle_pipe_command, Cli, Commands};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check(args) => {
            init_tracing(args.verbose);
            let result = match check(args).await {
                Ok(result) => result,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };

            for (path, entry) in result.report.entries() {
                println!(
                    "{}:{}:{}: {:?}: {}",
                    path, entry.line, entry.column, entry.severity, entry.message
                );
            }
            let errors = result.report.error_count();
            let warnings = result.report.entries().count() - errors;
            println!(
                "Checked {} files in {:.2}s: {} errors, {} warnings",
                result.files_checked,
                result.duration.as_secs_f64(),
                errors,
                warnings
            );

            if errors > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Pipe(args) => {
            init_tracing(false);
            let errors = handle_pipe_command(args)
                .await
                .context("Failed to check stdin")?;
            if errors > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
