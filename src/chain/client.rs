use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::chain::error::ChainError;
use crate::chain::units::{parse_quantity, Wei, ONE_GWEI};
use crate::config::RpcSettings;

/// Check that `address` is `0x` followed by 40 hex digits.
pub fn validate_address(address: &str) -> Result<(), ChainError> {
    let invalid = |reason: &str| ChainError::InvalidAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(invalid("address is empty"));
    }
    let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) else {
        return Err(invalid("address must start with 0x"));
    };
    if hex.len() != 40 {
        return Err(invalid("address must have 40 hex digits"));
    }
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("address contains non-hex characters"));
    }
    Ok(())
}

/// Current fee levels reported by the node.
///
/// EIP-1559 fields are `None` when the latest block has no base fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasFees {
    pub gas_price: Wei,
    pub base_fee_per_gas: Option<Wei>,
    pub max_priority_fee_per_gas: Option<Wei>,
    pub max_fee_per_gas: Option<Wei>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GasFeesView {
    gas_price: String,
    max_fee_per_gas: Option<String>,
    max_priority_fee_per_gas: Option<String>,
    base_fee_per_gas: Option<String>,
    raw: GasFeesRaw,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GasFeesRaw {
    gas_price: String,
    max_fee_per_gas: Option<String>,
    max_priority_fee_per_gas: Option<String>,
    base_fee_per_gas: Option<String>,
}

// Gwei strings for people, decimal wei strings under `raw`. Never JSON
// numbers, which lose precision above 2^53 in most consumers.
impl Serialize for GasFees {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let gwei = |w: Option<Wei>| w.map(Wei::to_gwei_string);
        let wei = |w: Option<Wei>| w.map(|w| w.to_string());
        GasFeesView {
            gas_price: self.gas_price.to_gwei_string(),
            max_fee_per_gas: gwei(self.max_fee_per_gas),
            max_priority_fee_per_gas: gwei(self.max_priority_fee_per_gas),
            base_fee_per_gas: gwei(self.base_fee_per_gas),
            raw: GasFeesRaw {
                gas_price: self.gas_price.to_string(),
                max_fee_per_gas: wei(self.max_fee_per_gas),
                max_priority_fee_per_gas: wei(self.max_priority_fee_per_gas),
                base_fee_per_gas: wei(self.base_fee_per_gas),
            },
        }
        .serialize(serializer)
    }
}

/// Parameters of `eth_sendTransaction`. Quantities are hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: String,
    pub to: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<String>,
}

/// Mined transaction receipt, quantities kept as the node sent them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_hash: String,
    #[serde(default)]
    pub block_hash: Option<String>,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub gas_used: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Receipt {
    pub fn mined_in_block(&self) -> Option<u64> {
        self.block_number
            .as_deref()
            .and_then(|b| parse_quantity(b).ok())
            .and_then(|b| u64::try_from(b).ok())
    }

    /// `Some(true)` for status `0x1`; `None` on pre-Byzantium receipts.
    pub fn is_success(&self) -> Option<bool> {
        self.status
            .as_deref()
            .and_then(|s| parse_quantity(s).ok())
            .map(|s| s == 1)
    }
}

/// JSON-RPC 2.0 client for one node.
pub struct RpcClient {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: impl Into<String>, settings: &RpcSettings) -> Result<Self, ChainError> {
        let url = url.into();
        let client = Client::builder()
            .timeout(settings.timeout())
            .connect_timeout(settings.connect_timeout())
            .build()
            .map_err(|e| ChainError::Transport {
                url: url.clone(),
                source: e,
            })?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue one call and return its `result`, which may be `null`.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });
        tracing::debug!(method = %method, id, url = %self.url, "JSON-RPC call");

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ChainError::Transport {
                url: self.url.clone(),
                source: e,
            })?;

        let status = response.status();
        let mut body: Value = response.json().await.map_err(|e| {
            ChainError::InvalidResponse(format!("{method}: HTTP {status}, body is not JSON: {e}"))
        })?;

        if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            tracing::debug!(method = %method, code, message = %message, "JSON-RPC error");
            return Err(ChainError::Rpc { code, message });
        }

        match body.get_mut("result") {
            Some(result) => Ok(result.take()),
            None => Err(ChainError::InvalidResponse(format!(
                "{method}: response has neither result nor error"
            ))),
        }
    }

    async fn quantity(&self, method: &str, params: Value) -> Result<u128, ChainError> {
        let result = self.request(method, params).await?;
        let hex = result.as_str().ok_or_else(|| {
            ChainError::InvalidResponse(format!("{method}: expected hex string, got {result}"))
        })?;
        parse_quantity(hex)
    }

    pub async fn block_number(&self) -> Result<u64, ChainError> {
        let n = self.quantity("eth_blockNumber", json!([])).await?;
        u64::try_from(n)
            .map_err(|_| ChainError::InvalidResponse(format!("block number {n} out of range")))
    }

    /// Balance at the latest block. The address is checked before any call.
    pub async fn balance(&self, address: &str) -> Result<Wei, ChainError> {
        validate_address(address)?;
        let wei = self
            .quantity("eth_getBalance", json!([address.trim(), "latest"]))
            .await?;
        Ok(Wei(wei))
    }

    pub async fn gas_fees(&self) -> Result<GasFees, ChainError> {
        let gas_price = Wei(self.quantity("eth_gasPrice", json!([])).await?);

        let block = self
            .request("eth_getBlockByNumber", json!(["latest", false]))
            .await?;
        let base_fee = block
            .get("baseFeePerGas")
            .and_then(Value::as_str)
            .map(parse_quantity)
            .transpose()?
            .map(Wei);

        let Some(base_fee) = base_fee else {
            return Ok(GasFees {
                gas_price,
                base_fee_per_gas: None,
                max_priority_fee_per_gas: None,
                max_fee_per_gas: None,
            });
        };

        let priority = match self.quantity("eth_maxPriorityFeePerGas", json!([])).await {
            Ok(wei) => Wei(wei),
            Err(e) if e.is_rpc() => {
                tracing::debug!(error = %e, "eth_maxPriorityFeePerGas unsupported, using 1 gwei");
                ONE_GWEI
            }
            Err(e) => return Err(e),
        };

        let max_fee = base_fee
            .checked_mul(2)
            .and_then(|doubled| doubled.checked_add(priority))
            .ok_or_else(|| ChainError::InvalidResponse("max fee overflows".to_string()))?;

        Ok(GasFees {
            gas_price,
            base_fee_per_gas: Some(base_fee),
            max_priority_fee_per_gas: Some(priority),
            max_fee_per_gas: Some(max_fee),
        })
    }

    /// Submit through `eth_sendTransaction`; the node signs for `from`.
    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<String, ChainError> {
        let result = self.request("eth_sendTransaction", json!([tx])).await?;
        result.as_str().map(str::to_string).ok_or_else(|| {
            ChainError::InvalidResponse(format!("eth_sendTransaction: expected hash, got {result}"))
        })
    }

    /// `None` while the transaction is pending.
    pub async fn transaction_receipt(&self, hash: &str) -> Result<Option<Receipt>, ChainError> {
        let result = self
            .request("eth_getTransactionReceipt", json!([hash]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        serde_json::from_value(result)
            .map(Some)
            .map_err(|e| ChainError::InvalidResponse(format!("eth_getTransactionReceipt: {e}")))
    }
}
