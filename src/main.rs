use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use nora3_batch::batch::BatchRunner;
use nora3_batch::config::Config;
use nora3_batch::tool::{DryRun, ExternalTool};
use nora3_batch::variables::Variable;

#[derive(Parser)]
#[command(name = "nora3-batch")]
#[command(about = "Run the NORA3 time-series extractor once per variable")]
#[command(version)]
struct Cli {
    /// JSON batch file; the built-in SUNPOINT batch is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print each extractor command instead of running it
    #[arg(long)]
    dry_run: bool,

    /// Print the parameter names the extractor accepts and exit
    #[arg(long)]
    list_variables: bool,
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Could not load batch file {}", path.display())),
        None => Config::sunpoint().context("Invalid built-in batch"),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    if cli.list_variables {
        for variable in Variable::ALL {
            let kind = if variable.is_surfex() {
                "surface, 3-hourly"
            } else if variable.is_accumulated() {
                "accumulated"
            } else {
                "instantaneous"
            };
            println!("{:<64} {}", variable.as_str(), kind);
        }
        return ExitCode::SUCCESS;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{:#}", e);
            return ExitCode::from(2);
        }
    };

    let runner = BatchRunner::new(config.clone());
    let report = if cli.dry_run {
        runner.run(&mut DryRun::new(config.tool().clone()))
    } else {
        runner.run(&mut ExternalTool::new(config.tool().clone()))
    };

    println!("{}", report);

    // Same status a shell script ending on the last extraction would return.
    ExitCode::from(report.process_exit_code())
}
