use anyhow::Result;
use colored::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::{broadcast, mpsc};

use client_logic::{config, console, logger};
use lib_abacus::feeds::ResourcesPoller;
use lib_abacus::{transport, UiSink};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load_config("abacus_client.conf");
    let log_dir = config.log_dir();
    let log_level = config.log_level();
    logger::setup_logging(&logger::LogSetup {
        app_name: "abacus_client",
        log_dir: &log_dir,
        level: &log_level,
        echo: logger::Echo::StderrWarnings,
        server_log: true,
    })?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let (ui, mut events) = UiSink::channel();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

    let session_handle = tokio::spawn(transport::run(
        config.session_config(),
        config.client_settings(),
        ui.clone(),
        cmd_rx,
        shutdown_tx.subscribe(),
    ));

    let resources_handle = config.resources_config().map(|resources| {
        let mut poller = ResourcesPoller::new(resources, ui.clone());
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move { poller.run(shutdown).await })
    });

    let printer_handle = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let Some(line) = console::render_event(&event) {
                println!("{}", line);
            }
        }
    });

    println!("{}", "Abacus client. Type 'help' for commands.".bright_white());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                log::info!("Ctrl-C received, initiating shutdown.");
                break;
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        log::info!("Console closed, initiating shutdown.");
                        break;
                    }
                    Err(e) => {
                        log::error!("Failed to read console: {}", e);
                        break;
                    }
                };
                if line.trim() == "quit" {
                    break;
                }
                match console::parse_command(&line) {
                    Ok(Some(command)) => {
                        if cmd_tx.send(command).is_err() {
                            log::error!("Session loop has stopped");
                            break;
                        }
                    }
                    Ok(None) => {
                        if line.trim() == "help" {
                            println!("{}", console::HELP);
                        }
                    }
                    Err(e) => println!("{} {}", "Error:".bright_red(), e),
                }
            }
        }
    }

    // Send shutdown signal to all components
    let _ = shutdown_tx.send(());

    match session_handle.await {
        Ok(Err(e)) => log::error!("Session loop failed: {}", e),
        Err(e) => log::error!("Session task panicked: {}", e),
        Ok(Ok(())) => {}
    }
    if let Some(handle) = resources_handle {
        let _ = handle.await;
    }
    // The printer ends once every UI sender is gone.
    drop(ui);
    let _ = printer_handle.await;

    log::info!("Shutdown complete.");
    Ok(())
}
