use anyhow::Result;
use tokio::signal;
use tokio::sync::broadcast;

use client_logic::{config, logger};
use lib_abacus::feeds::StandingsFeed;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load_config("standings_board.conf");
    let log_dir = config.log_dir();
    let log_level = config.log_level();
    logger::setup_logging(&logger::LogSetup {
        app_name: "standings_board",
        log_dir: &log_dir,
        level: &log_level,
        echo: logger::Echo::Stdout,
        server_log: false,
    })?;

    let feed_config = config.standings_feed_config();
    log::info!(
        "Writing standings from {} to {} ({:?} layout)",
        feed_config.url,
        feed_config.output.display(),
        feed_config.layout
    );

    let (shutdown_tx, _) = broadcast::channel(1);
    let mut feed = StandingsFeed::new(feed_config);
    let shutdown = shutdown_tx.subscribe();
    let feed_handle = tokio::spawn(async move { feed.run(shutdown).await });

    signal::ctrl_c().await?;
    log::info!("Ctrl-C received, initiating shutdown.");

    let _ = shutdown_tx.send(());
    let _ = feed_handle.await;

    log::info!("Shutdown complete.");
    Ok(())
}
