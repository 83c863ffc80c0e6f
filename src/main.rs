use std::process;

use clap::Parser;
use reportr::error::exit_code_for;
use reportr::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // RUST_LOG controls verbosity (default "warn"); logs go to stderr so
    // stdout carries only the rendered report.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = cli.execute().await {
        eprintln!("Error: {e}");

        let mut source = e.source();
        while let Some(err) = source {
            eprintln!("  Caused by: {err}");
            source = err.source();
        }

        process::exit(exit_code_for(&e));
    }
}
