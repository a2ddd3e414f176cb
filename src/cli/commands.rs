//! Command implementation for the ESRI grid processor
//!
//! Ties the argument surface to the library: logging, banner, a blocking
//! processor run under the caller's cancellation token, and the summary.

use crate::cli::args::{Args, OutputFormat};
use crate::models::RunStats;
use crate::processor::GridProcessor;
use anyhow::{Context, Result};
use colored::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Run one grid through the configured devices
///
/// The processor runs on a blocking task; cancelling `cancellation` stops it
/// before the next row, after which every opened device is still closed.
pub async fn run(args: Args, cancellation: CancellationToken) -> Result<RunStats> {
    setup_logging(&args)?;

    info!("Starting ESRI grid processor");
    debug!("Command line arguments: {:?}", args);

    if args.show_banner() {
        print_banner();
    }

    let config = args.to_config();
    let mut processor = GridProcessor::new(config)?.with_cancellation(cancellation);

    let stats = tokio::task::spawn_blocking(move || processor.process())
        .await
        .context("Processing task failed to complete")??;

    generate_final_report(&args, &stats)?;
    Ok(stats)
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("esri_grid_processor={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .context("Failed to initialize logging")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to initialize logging")?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

fn print_banner() {
    println!(
        "{} {}",
        "ESRI Grid Processor".bright_green().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_white()
    );
    println!();
}

/// Generate final processing report
fn generate_final_report(args: &Args, stats: &RunStats) -> Result<()> {
    match args.report {
        OutputFormat::Human => {
            if !args.quiet {
                generate_human_report(args, stats);
            }
            Ok(())
        }
        OutputFormat::Json => {
            let report = render_json_report(stats)?;
            if args.json_report_to_stderr() {
                eprintln!("{}", report);
            } else {
                println!("{}", report);
            }
            Ok(())
        }
    }
}

fn generate_human_report(args: &Args, stats: &RunStats) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!("  {} {}", "Input:".bright_cyan(), args.input_path.display());
    println!("  {} {}", "Region:".bright_cyan(), args.region_name);
    println!(
        "  {} {}",
        "Devices:".bright_cyan(),
        if stats.sinks.is_empty() {
            "none (validate only)".to_string()
        } else {
            stats.sinks.join(", ")
        }
    );
    println!(
        "  {} {}",
        "Rows processed:".bright_cyan(),
        stats.rows_processed.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Cells emitted:".bright_cyan(),
        stats.cells_emitted.to_string().bright_white().bold()
    );
    println!(
        "  {} {}{}",
        "NODATA cells:".bright_cyan(),
        stats.nodata_cells.to_string().bright_white(),
        if stats.has_nodata_value {
            ""
        } else {
            " (default nodata_value)"
        }
    );
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.elapsed.as_millis().to_string().bright_white()
    );
}

/// Render the run statistics as pretty-printed JSON
pub fn render_json_report(stats: &RunStats) -> Result<String> {
    serde_json::to_string_pretty(stats).context("Failed to serialize run summary")
}
