use std::{fmt, sync::Arc};

use alloy::primitives::{utils::format_ether, Address, TxHash, U256};
use eyre::WrapErr;

use crate::{
    amount::Amount,
    config::Config,
    constants::{NATIVE_TRANSFER_GAS_LIMIT, REQUIRED_CONFIRMATIONS},
    wallet::TransferClient,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferOutcome {
    Confirmed(TxHash),
    Reverted(TxHash),
    InsufficientFunds { required: U256 },
    Failed(String),
}

/// Result of one transfer to one recipient within a pass.
#[derive(Clone, Debug)]
pub struct TransferAttempt {
    pub recipient: String,
    pub amount: Amount,
    pub outcome: TransferOutcome,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub sent: Amount,
    pub confirmed: usize,
    pub reverted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl PassSummary {
    pub fn from_attempts(attempts: &[TransferAttempt]) -> Self {
        attempts
            .iter()
            .fold(Self::default(), |mut summary, attempt| {
                match attempt.outcome {
                    TransferOutcome::Confirmed(_) => {
                        summary.confirmed += 1;
                        summary.sent = Amount::from_micros(
                            summary.sent.micros() + attempt.amount.micros(),
                        );
                    }
                    TransferOutcome::Reverted(_) => summary.reverted += 1,
                    TransferOutcome::InsufficientFunds { .. } => summary.skipped += 1,
                    TransferOutcome::Failed(_) => summary.failed += 1,
                }
                summary
            })
    }
}

impl fmt::Display for PassSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} confirmed ({} sent), {} reverted, {} skipped, {} failed",
            self.confirmed, self.sent, self.reverted, self.skipped, self.failed
        )
    }
}

async fn try_send<C>(
    client: &C,
    config: &Config,
    recipient: &str,
    amount: Amount,
) -> eyre::Result<TransferOutcome>
where
    C: TransferClient + ?Sized,
{
    let to: Address = recipient.parse::<Address>().wrap_err("invalid address")?;
    let value = amount.to_wei();

    let balance = client.balance().await?;
    let gas_price = client.gas_price().await?;
    let gas_cost = U256::from(gas_price) * U256::from(NATIVE_TRANSFER_GAS_LIMIT);
    let total_cost = value + gas_cost;

    if balance < total_cost {
        return Ok(TransferOutcome::InsufficientFunds {
            required: total_cost,
        });
    }

    tracing::info!("Sending {amount} {} to {recipient}...", config.token_symbol);
    let tx_hash = client
        .send_native(to, value, gas_price, NATIVE_TRANSFER_GAS_LIMIT)
        .await?;
    tracing::info!("Tx sent! Hash: {tx_hash}");
    tracing::info!("Explorer: {}", config.tx_url(&tx_hash));

    let receipt = client
        .wait_for_confirmation(tx_hash, REQUIRED_CONFIRMATIONS)
        .await?;

    Ok(match receipt.success {
        true => TransferOutcome::Confirmed(receipt.tx_hash),
        false => TransferOutcome::Reverted(receipt.tx_hash),
    })
}

/// Sends a random amount to `recipient`. Errors are logged and folded into the outcome.
pub async fn send_to_recipient<C>(client: &C, config: &Config, recipient: &str) -> TransferAttempt
where
    C: TransferClient + ?Sized,
{
    let amount = Amount::random(&config.amount_range, &mut rand::thread_rng());
    let symbol = &config.token_symbol;

    let outcome = try_send(client, config, recipient, amount)
        .await
        .unwrap_or_else(|e| TransferOutcome::Failed(format!("{e:#}")));

    match &outcome {
        TransferOutcome::Confirmed(tx_hash) => {
            tracing::info!("Confirmed: Sent {amount} {symbol} to {recipient} (tx {tx_hash})")
        }
        TransferOutcome::Reverted(tx_hash) => {
            tracing::error!("Failed: {recipient} (tx {tx_hash})")
        }
        TransferOutcome::InsufficientFunds { required } => tracing::warn!(
            "Insufficient balance for {recipient}. Required (w/ gas): {} {symbol}",
            format_ether(*required)
        ),
        TransferOutcome::Failed(reason) => {
            tracing::error!("Error sending to {recipient}: {reason}")
        }
    }

    TransferAttempt {
        recipient: recipient.to_owned(),
        amount,
        outcome,
    }
}

/// Sends to every recipient in list order, one transfer at a time.
pub async fn run_pass<C>(client: &C, config: &Config, recipients: &[String]) -> Vec<TransferAttempt>
where
    C: TransferClient + ?Sized,
{
    let mut attempts = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        attempts.push(send_to_recipient(client, config, recipient).await);
    }

    attempts
}

/// Runs a pass immediately and then again `interval` after each pass completes.
///
/// Every pass runs in its own task; a panic there is logged and the schedule carries on.
pub async fn run_schedule<C>(client: Arc<C>, config: Arc<Config>, recipients: Arc<[String]>)
where
    C: TransferClient + 'static,
{
    let mut pass_number: u64 = 0;

    loop {
        pass_number += 1;
        tracing::info!(
            "Starting pass #{pass_number} from {} over {} recipients",
            client.address(),
            recipients.len()
        );

        let pass = tokio::spawn({
            let client = client.clone();
            let config = config.clone();
            let recipients = recipients.clone();
            async move { run_pass(client.as_ref(), &config, &recipients).await }
        });

        match pass.await {
            Ok(attempts) => {
                tracing::info!(
                    "Pass #{pass_number} finished: {}",
                    PassSummary::from_attempts(&attempts)
                );

                let unsent: Vec<&str> = attempts
                    .iter()
                    .filter(|a| !matches!(a.outcome, TransferOutcome::Confirmed(_)))
                    .map(|a| a.recipient.as_str())
                    .collect();
                if !unsent.is_empty() {
                    tracing::warn!("Not delivered this pass: {}", unsent.join(", "));
                }
            }
            Err(e) => tracing::error!("Unhandled error in pass #{pass_number}: {e}"),
        }

        tracing::info!("Next pass in {} minute(s)", config.interval_minutes);
        tokio::time::sleep(config.interval()).await;
    }
}
