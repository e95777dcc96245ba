mod commands;
mod output;

use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use commands::RunArgs;
use kfp_local::KfpError;

#[derive(Parser, Debug)]
#[command(name = "kfp-local", version, about = "Run Kubeflow Pipeline stages locally")]
struct Cli {
    #[command(flatten)]
    run: RunArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = if cli.run.dry_run {
        commands::plan::execute(&cli.run)
    } else {
        commands::run::execute(cli.run).await
    };

    if let Err(report) = outcome {
        output::fatal(&error_message(&report));
        std::process::exit(1);
    }

    Ok(())
}

/// Single-line message with a lower-case first letter
fn error_message(report: &color_eyre::Report) -> String {
    match report.downcast_ref::<KfpError>() {
        Some(error) => error.user_message(),
        None => kfp_local::user_message(&report.to_string()),
    }
}
