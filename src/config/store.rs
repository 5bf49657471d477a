//! File-backed store of named endpoint collections.
//!
//! Each name maps to `<dir>/<name>.json`, a JSON array of endpoint records.
//! Every call goes to disk; there is no in-process cache, so hand edits to
//! the files are seen on the next `load`. Concurrent writers race and the
//! last rename wins.

use std::collections::BTreeSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::config::loader::{parse_collection, StoreError};
use crate::config::types::{EndpointCollection, EndpointRecord, RpcEndpoint, RpcProtocol};

/// Directory used when none is configured.
pub const DEFAULT_DIR: &str = "rpcs";

/// Name used by `create_default` when none is given.
pub const DEFAULT_NAME: &str = "localhost";

/// Named endpoint collections in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointStore {
    dir: PathBuf,
}

impl EndpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Write `records` under `name`, replacing any previous contents.
    ///
    /// The directory is created on demand. The file is written to a
    /// temporary sibling first and renamed into place.
    pub fn save(
        &self,
        name: &str,
        records: impl Into<EndpointCollection>,
    ) -> Result<(), StoreError> {
        let collection = records.into();
        let path = self.path_for(name);

        fs::create_dir_all(&self.dir).map_err(|e| StoreError::Io {
            path: self.dir.clone(),
            source: e,
        })?;

        let json = serde_json::to_string_pretty(&collection).map_err(|e| StoreError::Io {
            path: path.clone(),
            source: e.into(),
        })?;

        let io_err = |source: std::io::Error| StoreError::Io {
            path: path.clone(),
            source,
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    /// Read and validate the collection stored under `name`.
    pub fn load(&self, name: &str) -> Result<EndpointCollection, StoreError> {
        let path = self.path_for(name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound { path });
            }
            Err(e) => return Err(StoreError::Io { path, source: e }),
        };
        parse_collection(&content, &path)
    }

    /// Names of all `*.json` files directly inside the directory.
    ///
    /// A missing directory is an empty store.
    pub fn list(&self) -> Result<BTreeSet<String>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => {
                return Err(StoreError::Io {
                    path: self.dir.clone(),
                    source: e,
                })
            }
        };

        let mut names = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::Io {
                path: self.dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.insert(stem.to_string());
            }
        }
        Ok(names)
    }

    /// Save the stock single-node configuration (`http://localhost:8545`).
    pub fn create_default(&self, name: &str) -> Result<(), StoreError> {
        self.save(name, default_collection())
    }

    /// Append `record` to the collection under `name`.
    ///
    /// A missing file starts an empty collection; any other load failure is
    /// returned untouched. Not atomic across the load and the save.
    pub fn add_endpoint(
        &self,
        name: &str,
        record: impl Into<EndpointRecord>,
    ) -> Result<EndpointCollection, StoreError> {
        let mut collection = match self.load(name) {
            Ok(collection) => collection,
            Err(StoreError::NotFound { .. }) => EndpointCollection::new(),
            Err(e) => return Err(e),
        };
        collection.push(record);
        self.save(name, collection.clone())?;
        Ok(collection)
    }
}

impl Default for EndpointStore {
    fn default() -> Self {
        Self::new(DEFAULT_DIR)
    }
}

/// `[{"host":"localhost","port":8545,"protocol":"http"}]`
pub fn default_collection() -> EndpointCollection {
    RpcEndpoint::new("localhost", 8545, RpcProtocol::Http).into()
}
