//! Project-level `vx.config.json`.
//!
//! Same array-of-records format as the named configurations, but looked up
//! relative to a project directory instead of the store directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::loader::{parse_collection, StoreError};
use crate::config::store::EndpointStore;
use crate::config::types::{EndpointCollection, EndpointRecord, IpfsEndpoint, RpcEndpoint, RpcProtocol};

pub const PROJECT_CONFIG_FILE: &str = "vx.config.json";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("{} already exists", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("vx.config.json not found in any of: {}", format_paths(searched))]
    NotFound { searched: Vec<PathBuf> },

    #[error("{} has no RPC endpoint (expected fields host, port, protocol)", path.display())]
    NoRpcEndpoint { path: PathBuf },

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Placeholder written by `rpc init`.
pub fn placeholder_collection() -> EndpointCollection {
    vec![
        EndpointRecord::from(RpcEndpoint::new("localhost", 8575, RpcProtocol::Http)),
        EndpointRecord::from(RpcEndpoint::new("rpc.example.com", 443, RpcProtocol::Https)),
        EndpointRecord::from(IpfsEndpoint::Gateway("https://ipfs.io".to_string())),
    ]
    .into()
}

/// Write the placeholder `vx.config.json` into `dir`. Never overwrites.
pub fn init_project_config(dir: &Path) -> Result<PathBuf, ProjectError> {
    let path = dir.join(PROJECT_CONFIG_FILE);
    if path.exists() {
        return Err(ProjectError::AlreadyExists { path });
    }
    EndpointStore::new(dir).save("vx.config", placeholder_collection())?;
    Ok(path)
}

/// Locations tried, in order, when looking for the project config.
pub fn candidate_paths(cwd: &Path, explicit: Option<&Path>) -> Vec<PathBuf> {
    vec![
        cwd.join(explicit.unwrap_or(Path::new(PROJECT_CONFIG_FILE))),
        cwd.join("packages").join("sdk").join(PROJECT_CONFIG_FILE),
    ]
}

/// Load the first candidate that exists.
///
/// A candidate that exists but does not parse is an error, not a skip.
pub fn load_project_config(
    cwd: &Path,
    explicit: Option<&Path>,
) -> Result<(PathBuf, EndpointCollection), ProjectError> {
    let searched = candidate_paths(cwd, explicit);
    for path in &searched {
        match fs::read_to_string(path) {
            Ok(content) => {
                let collection = parse_collection(&content, path)?;
                return Ok((path.clone(), collection));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(StoreError::Io {
                    path: path.clone(),
                    source: e,
                }
                .into())
            }
        }
    }
    Err(ProjectError::NotFound { searched })
}

/// URL of the primary RPC endpoint of the project config.
pub fn project_rpc_url(cwd: &Path, explicit: Option<&Path>) -> Result<String, ProjectError> {
    let (path, collection) = load_project_config(cwd, explicit)?;
    collection
        .primary_rpc_url()
        .ok_or(ProjectError::NoRpcEndpoint { path })
}
