use anyhow::Result;
use tokio::io::BufReader;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod client;
mod config;
mod controller;
mod driver;
mod feedback;
mod input;
mod lifecycle;
mod reachability;

use crate::{
    client::HttpClient, config::KioskConfig, controller::ScanController, driver::KioskDriver,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout is the kiosk display
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = KioskConfig::load()?;
    info!(
        "Starting kiosk for session {} against {}",
        config.session_id, config.api_url
    );

    let client = HttpClient::new(
        &config.api_url,
        config.organization_id,
        config.session_id,
        config.request_timeout(),
    )?;

    let code_length = match config.code_length {
        Some(len) => Some(len),
        None => client.fetch_code_length().await.unwrap_or_else(|e| {
            warn!("Could not read the organization's code length: {}", e);
            None
        }),
    };

    let (online_tx, online_rx) = watch::channel(false);
    let mut scheduler =
        reachability::start_probe(client.clone(), &config.probe_schedule, online_tx).await?;

    let (input_tx, input_rx) = mpsc::channel(64);
    let (feedback_tx, mut feedback_rx) = mpsc::channel(64);

    tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        if let Err(e) = input::forward_lines(stdin, input_tx).await {
            error!("Failed to read scanner input: {}", e);
        }
    });

    let display = tokio::spawn(async move {
        while let Some(feedback) = feedback_rx.recv().await {
            println!("{}", feedback);
        }
    });

    println!(
        "Ready. Scan a code, or type {} to end the session.",
        input::END_SESSION_COMMAND
    );

    let driver = KioskDriver::new(
        client,
        ScanController::new(code_length),
        config.debounce(),
        feedback_tx,
    );

    tokio::select! {
        () = driver.run(input_rx, online_rx) => info!("Scanner input closed"),
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutting down kiosk");
        }
    }

    scheduler.shutdown().await?;
    display.await?;
    Ok(())
}
