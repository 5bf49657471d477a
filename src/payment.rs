//! Native-currency transfers through a node-managed account.
//!
//! The node signs for `from` (`eth_sendTransaction`), which is what local
//! development nodes offer for their unlocked accounts.

use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;

use crate::chain::{parse_ether, parse_gwei, validate_address, ChainError, Receipt, RpcClient, TransactionRequest, Wei};
use crate::config::{PaymentSettings, Settings};

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("No receipt for transaction {tx_hash} after {waited_secs}s")]
    ReceiptTimeout { tx_hash: String, waited_secs: u64 },
}

impl PaymentError {
    /// True when the failure happened before anything was sent.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            PaymentError::MissingField(_)
                | PaymentError::Chain(ChainError::InvalidAddress { .. })
                | PaymentError::Chain(ChainError::InvalidAmount { .. })
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendPaymentOptions {
    pub rpc_url: String,
    pub from: String,
    pub to: String,
    /// Decimal ether amount, e.g. `0.01`.
    pub amount_eth: String,
    pub gas_limit: Option<u64>,
    pub max_fee_per_gas_gwei: Option<String>,
    pub max_priority_fee_per_gas_gwei: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPaymentResult {
    pub tx_hash: String,
    pub receipt: Receipt,
}

impl SendPaymentOptions {
    /// Validate every field and build the transaction. No network access.
    pub fn to_transaction(&self) -> Result<TransactionRequest, PaymentError> {
        for (name, value) in [
            ("rpcUrl", &self.rpc_url),
            ("from", &self.from),
            ("to", &self.to),
            ("amountEth", &self.amount_eth),
        ] {
            if value.trim().is_empty() {
                return Err(PaymentError::MissingField(name));
            }
        }
        validate_address(&self.from)?;
        validate_address(&self.to)?;
        let value = parse_ether(&self.amount_eth)?;

        let gwei = |amount: &Option<String>| -> Result<Option<String>, ChainError> {
            amount
                .as_deref()
                .map(|a| parse_gwei(a).map(Wei::to_hex))
                .transpose()
        };

        Ok(TransactionRequest {
            from: self.from.trim().to_string(),
            to: self.to.trim().to_string(),
            value: value.to_hex(),
            gas: self.gas_limit.map(|g| format!("{g:#x}")),
            max_fee_per_gas: gwei(&self.max_fee_per_gas_gwei)?,
            max_priority_fee_per_gas: gwei(&self.max_priority_fee_per_gas_gwei)?,
        })
    }
}

/// Validate, submit, and wait for the receipt.
pub async fn send_payment(
    options: &SendPaymentOptions,
    settings: &Settings,
) -> Result<SendPaymentResult, PaymentError> {
    let tx = options.to_transaction()?;
    let client = RpcClient::new(options.rpc_url.trim(), &settings.rpc)?;
    submit(&client, &tx, &settings.payment).await
}

pub async fn submit(
    client: &RpcClient,
    tx: &TransactionRequest,
    settings: &PaymentSettings,
) -> Result<SendPaymentResult, PaymentError> {
    let tx_hash = client.send_transaction(tx).await?;
    tracing::info!(tx_hash = %tx_hash, to = %tx.to, value = %tx.value, "Payment submitted");

    let receipt = wait_for_receipt(client, &tx_hash, settings).await?;
    if receipt.is_success() == Some(false) {
        tracing::warn!(tx_hash = %tx_hash, "Payment transaction reverted");
    }
    Ok(SendPaymentResult { tx_hash, receipt })
}

/// Poll until the receipt exists and has `settings.confirmations` blocks on top.
pub async fn wait_for_receipt(
    client: &RpcClient,
    tx_hash: &str,
    settings: &PaymentSettings,
) -> Result<Receipt, PaymentError> {
    let started = Instant::now();
    let deadline = started + settings.receipt_timeout();

    loop {
        if let Some(receipt) = client.transaction_receipt(tx_hash).await? {
            if confirmed(client, &receipt, settings.confirmations).await? {
                tracing::debug!(tx_hash = %tx_hash, elapsed_ms = started.elapsed().as_millis() as u64, "Receipt confirmed");
                return Ok(receipt);
            }
        }

        if Instant::now() + settings.poll_interval() > deadline {
            return Err(PaymentError::ReceiptTimeout {
                tx_hash: tx_hash.to_string(),
                waited_secs: started.elapsed().as_secs(),
            });
        }
        tokio::time::sleep(settings.poll_interval()).await;
    }
}

async fn confirmed(
    client: &RpcClient,
    receipt: &Receipt,
    confirmations: u32,
) -> Result<bool, ChainError> {
    if confirmations <= 1 {
        return Ok(true);
    }
    let Some(mined) = receipt.mined_in_block() else {
        return Ok(false);
    };
    let head = client.block_number().await?;
    Ok(head.saturating_sub(mined) + 1 >= u64::from(confirmations))
}
