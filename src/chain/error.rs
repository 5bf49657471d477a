use thiserror::Error;

/// Errors from talking to a JSON-RPC node.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Request never produced a usable HTTP response.
    #[error("RPC request to '{url}' failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Node answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),

    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Invalid amount '{amount}': {reason}")]
    InvalidAmount { amount: String, reason: String },
}

impl ChainError {
    pub fn is_rpc(&self) -> bool {
        matches!(self, ChainError::Rpc { .. })
    }
}
