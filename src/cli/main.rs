/**
 * Report Sync Entry Point
 *
 * Opens the local report queue and runs one sync pass against the
 * configured server. Useful for recovering reports left queued by a
 * previous session.
 *
 * Configuration comes from the environment (and a `.env` file if present),
 * or from a TOML file given as the first argument.
 */

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use water_report_sync::config::Config;
    use water_report_sync::ReportQueue;

    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)?,
        None => Config::new(),
    };

    tracing::info!(
        "[STARTUP] Queue at {}, server {}",
        config.database_path().display(),
        config.server_url()
    );

    let queue = ReportQueue::open(&config, true).await?;
    let pending = queue.pending_count().await?;
    if pending == 0 {
        println!("No queued reports");
        return Ok(());
    }

    let summary = queue.run_sync_pass().await?;
    println!(
        "Synced {} of {} queued reports ({} still pending)",
        summary.succeeded, summary.attempted, summary.failed
    );

    if !summary.is_clean() {
        std::process::exit(2);
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("report-sync requires the 'cli' feature to be enabled.");
    eprintln!("Run with: cargo run --bin report-sync --features cli");
    std::process::exit(1);
}
