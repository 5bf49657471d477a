//! Read-side chain access over JSON-RPC.

pub mod client;
pub mod error;
pub mod units;

pub use client::{validate_address, GasFees, Receipt, RpcClient, TransactionRequest};
pub use error::ChainError;
pub use units::{format_units, parse_ether, parse_gwei, parse_quantity, Wei};

/// `value` wei as ether, e.g. `1.5`.
pub fn format_ether(value: Wei) -> String {
    value.to_ether_string()
}

/// `value` wei as gwei, e.g. `20.0`.
pub fn format_gwei(value: Wei) -> String {
    value.to_gwei_string()
}
