pub mod chain;
pub mod cli;
pub mod config;
pub mod ipfs;
pub mod logging;
pub mod payment;
pub mod scaffold;
pub mod server;
