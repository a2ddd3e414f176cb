use clap::Parser;
use esri_grid_processor::GridError;
use esri_grid_processor::cli::{args::Args, commands};
use esri_grid_processor::constants::EXIT_CODE_INTERRUPTED;
use std::process;
use tokio_util::sync::CancellationToken;

fn main() {
    let args = Args::parse();

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        // Cancellation stops the grid between rows; the run still closes its devices
        let cancellation_token = CancellationToken::new();

        let shutdown_token = cancellation_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nReceived CTRL+C, stopping after the current row...");
                shutdown_token.cancel();
            }
        });

        commands::run(args, cancellation_token).await
    });

    match result {
        Ok(_stats) => process::exit(0),
        Err(error) => {
            let grid_error = error.downcast_ref::<GridError>();
            match grid_error {
                Some(e) if e.is_cancelled() => {
                    eprintln!("Error: {:#}", error);
                    process::exit(EXIT_CODE_INTERRUPTED);
                }
                Some(e) => eprintln!("Error ({} stage): {:#}", e.stage(), error),
                None => eprintln!("Error: {:#}", error),
            }
            process::exit(1);
        }
    }
}
