use std::{process::ExitCode, sync::Arc};

use config::Config;
use eyre::WrapErr;
use constants::RECIPIENTS_FILE_PATH;
use logger::init_default_logger;
use sender::run_schedule;
use utils::{locate_beside_executable, read_recipients};
use wallet::WalletSession;

mod amount;
mod config;
mod constants;
mod logger;
mod sender;
mod utils;
mod wallet;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = Config::read_default().await;

    let rotation = config
        .as_ref()
        .map(|config| config.log_rotation)
        .unwrap_or_default();
    let _guard = match init_default_logger(rotation) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: failed to initialize logger: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: eyre::Result<Config>) -> eyre::Result<()> {
    let config = config?;
    for warning in &config.warnings {
        tracing::warn!("{warning}");
    }

    let recipients = read_recipients(locate_beside_executable(RECIPIENTS_FILE_PATH)).await?;

    tracing::info!("===== {} Multi-Address Auto Sender Started =====", config.token_symbol);
    tracing::info!("Total recipients: {}", recipients.len());
    tracing::info!(
        "Amount range: {} - {} {}",
        config.amount_range.min(),
        config.amount_range.max(),
        config.token_symbol
    );
    tracing::info!("Interval: {} minutes", config.interval_minutes);

    if recipients.is_empty() {
        tracing::warn!("{RECIPIENTS_FILE_PATH} has no addresses, passes will not send anything");
    }

    let session = WalletSession::connect(&config)
        .await
        .wrap_err("Error initializing wallet")?;

    tokio::select! {
        _ = run_schedule(Arc::new(session), Arc::new(config), recipients.into()) => {}
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Stopped by user.");
        }
    }

    Ok(())
}
