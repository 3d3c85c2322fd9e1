mod cli;
mod commands;
mod ingest;

use clap::Parser;

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries command output.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = cli::Cli::parse();
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = commands::run(cli, &mut stdout).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
