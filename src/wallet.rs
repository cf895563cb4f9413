use std::{str::FromStr, time::Duration};

use alloy::{
    network::{EthereumWallet, TransactionBuilder},
    primitives::{utils::format_ether, Address, TxHash, U256},
    providers::{Provider, RootProvider},
    rpc::{client::ClientBuilder, types::TransactionRequest},
    signers::local::PrivateKeySigner,
    transports::{
        http::Http,
        layers::{RetryBackoffLayer, RetryBackoffService},
    },
};
use alloy_chains::Chain;
use async_trait::async_trait;
use eyre::WrapErr;

use crate::{
    config::Config,
    constants::{
        RECEIPT_POLL_INTERVAL_MS, RPC_COMPUTE_UNITS_PER_SECOND, RPC_INITIAL_BACKOFF_MS,
        RPC_MAX_RETRIES,
    },
};

type RpcTransport = RetryBackoffService<Http<reqwest::Client>>;

/// Final state of a mined transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferReceipt {
    pub tx_hash: TxHash,
    pub success: bool,
}

/// Account operations the sender loop needs from a connected wallet.
#[async_trait]
pub trait TransferClient: Send + Sync {
    fn address(&self) -> Address;

    async fn balance(&self) -> eyre::Result<U256>;

    async fn gas_price(&self) -> eyre::Result<u128>;

    /// Signs and submits a value-only transfer, returning the hash of the pending transaction.
    async fn send_native(
        &self,
        to: Address,
        value: U256,
        gas_price: u128,
        gas_limit: u64,
    ) -> eyre::Result<TxHash>;

    async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        confirmations: u64,
    ) -> eyre::Result<TransferReceipt>;
}

/// Connected account used for the lifetime of the process.
pub struct WalletSession {
    provider: RootProvider<RpcTransport>,
    wallet: EthereumWallet,
    address: Address,
    chain_id: u64,
}

impl WalletSession {
    pub async fn connect(config: &Config) -> eyre::Result<Self> {
        let signer = PrivateKeySigner::from_str(config.private_key.expose())
            .wrap_err("Invalid private key")?;
        let address = signer.address();
        let wallet = EthereumWallet::new(signer);

        let retry_layer = RetryBackoffLayer::new(
            RPC_MAX_RETRIES,
            RPC_INITIAL_BACKOFF_MS,
            RPC_COMPUTE_UNITS_PER_SECOND,
        );
        let client = ClientBuilder::default()
            .layer(retry_layer)
            .transport(Http::new(config.rpc_url.clone()), false);
        let provider = RootProvider::new(client);

        let chain_id = provider.get_chain_id().await?;
        let balance = provider.get_balance(address).await?;

        tracing::info!("Wallet initialized: {address}");
        tracing::info!("Chain: {}", Chain::from_id(chain_id));
        tracing::info!(
            "Wallet balance: {} {}",
            format_ether(balance),
            config.token_symbol
        );

        Ok(Self {
            provider,
            wallet,
            address,
            chain_id,
        })
    }
}

#[async_trait]
impl TransferClient for WalletSession {
    fn address(&self) -> Address {
        self.address
    }

    async fn balance(&self) -> eyre::Result<U256> {
        Ok(self.provider.get_balance(self.address).await?)
    }

    async fn gas_price(&self) -> eyre::Result<u128> {
        Ok(self.provider.get_gas_price().await?)
    }

    async fn send_native(
        &self,
        to: Address,
        value: U256,
        gas_price: u128,
        gas_limit: u64,
    ) -> eyre::Result<TxHash> {
        // Pending, so a broadcast transfer whose confirmation wait failed still takes its nonce.
        let nonce = self
            .provider
            .get_transaction_count(self.address)
            .pending()
            .await?;

        let tx_request = TransactionRequest::default()
            .with_from(self.address)
            .with_to(to)
            .with_value(value)
            .with_gas_price(gas_price)
            .with_gas_limit(gas_limit)
            .with_nonce(nonce)
            .with_chain_id(self.chain_id);

        let signed_transaction = tx_request.build(&self.wallet).await?;
        let pending_tx = self.provider.send_tx_envelope(signed_transaction).await?;

        Ok(*pending_tx.tx_hash())
    }

    async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        confirmations: u64,
    ) -> eyre::Result<TransferReceipt> {
        let mut poll = tokio::time::interval(Duration::from_millis(RECEIPT_POLL_INTERVAL_MS));

        loop {
            poll.tick().await;

            let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? else {
                continue;
            };
            let Some(mined_in) = receipt.block_number else {
                continue;
            };

            let head = self.provider.get_block_number().await?;
            if head.saturating_sub(mined_in) + 1 >= confirmations {
                return Ok(TransferReceipt {
                    tx_hash: receipt.transaction_hash,
                    success: receipt.status(),
                });
            }
        }
    }
}
