use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::loader::StoreError;
use crate::config::project::{project_rpc_url, ProjectError};
use crate::config::store::EndpointStore;

/// Where a command takes its JSON-RPC URL from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcSource {
    /// A URL given on the command line.
    Url(String),
    /// The primary RPC entry of a named configuration in the store.
    Named(String),
    /// The primary RPC entry of the project `vx.config.json`.
    Project(Option<PathBuf>),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("configuration '{name}' has no RPC endpoint")]
    NoRpcEndpoint { name: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Project(#[from] ProjectError),
}

impl RpcSource {
    /// Pick the source from command-line flags, most specific first.
    pub fn from_flags(rpc: Option<String>, config: Option<String>, path: Option<PathBuf>) -> Self {
        match (rpc, config) {
            (Some(url), _) => Self::Url(url),
            (None, Some(name)) => Self::Named(name),
            (None, None) => Self::Project(path),
        }
    }

    pub fn resolve(&self, store: &EndpointStore, cwd: &Path) -> Result<String, SourceError> {
        match self {
            Self::Url(url) => Ok(url.clone()),
            Self::Named(name) => store
                .load(name)?
                .primary_rpc_url()
                .ok_or_else(|| SourceError::NoRpcEndpoint { name: name.clone() }),
            Self::Project(path) => Ok(project_rpc_url(cwd, path.as_deref())?),
        }
    }
}
