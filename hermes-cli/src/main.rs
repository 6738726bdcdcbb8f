use std::process;

use anyhow::Result;
use clap::Parser;
use hermes_cli::cli::Args;
use hermes_cli::command::ProgramTask;
use tracing::{Level, error, info};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let code = match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("Application error: {e:#}");
            eprintln!("Error: {e:#}");
            1
        }
    };
    process::exit(code);
}

async fn run(args: Args) -> Result<i32> {
    init_logging(args.verbose, args.quiet)?;

    let notifier = args.notifier();
    let task = ProgramTask::new(args.program(), args.program_args().iter().cloned());
    let label = args.subject_label();

    let code = match notifier.run(&label, || task.run()).await {
        Ok(()) => 0,
        Err(e) => e.exit_code(),
    };

    info!(program = task.program(), exit_code = code, "Finished");
    Ok(code)
}

fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()?;
    Ok(())
}
