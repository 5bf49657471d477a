use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::types::{
    ApiProtocol, EndpointCollection, EndpointRecord, IpfsApi, IpfsEndpoint, RpcEndpoint,
    RpcProtocol,
};

/// Why a single JSON value is not a valid endpoint record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("expected a JSON object")]
    NotAnObject,

    #[error("missing required field(s): {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("invalid value for '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("unknown endpoint type '{0}' (expected 'rpc' or 'ipfs')")]
    UnknownType(String),

    #[error("ipfs entry needs a 'gateway' URL or an 'api' object")]
    EmptyIpfs,

    #[error("ipfs entry has both 'gateway' and 'api'; expected exactly one")]
    AmbiguousIpfs,
}

impl RecordError {
    /// Field names this error refers to, for callers that report them.
    pub fn fields(&self) -> Vec<&'static str> {
        match self {
            RecordError::MissingFields(fields) => fields.clone(),
            RecordError::InvalidField { field, .. } => vec![*field],
            RecordError::EmptyIpfs | RecordError::AmbiguousIpfs => vec!["gateway", "api"],
            RecordError::NotAnObject | RecordError::UnknownType(_) => Vec::new(),
        }
    }
}

/// Errors returned by the endpoint store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to parse configuration file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid endpoint at index {index} in '{}': {source}", path.display())]
    Schema {
        path: PathBuf,
        index: usize,
        #[source]
        source: RecordError,
    },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Parse and validate the contents of an endpoint file.
///
/// A top-level object is treated as a one-element array.
pub fn parse_collection(content: &str, path: &Path) -> Result<EndpointCollection, StoreError> {
    let parsed: Value = serde_json::from_str(content).map_err(|e| StoreError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    let items = match parsed {
        Value::Array(items) => items,
        other => vec![other],
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            EndpointRecord::from_value(item).map_err(|source| StoreError::Schema {
                path: path.to_path_buf(),
                index,
                source,
            })
        })
        .collect()
}

impl EndpointRecord {
    /// Validate one JSON value against the record union.
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        let obj = value.as_object().ok_or(RecordError::NotAnObject)?;

        match obj.get("type") {
            None | Some(Value::Null) => rpc_from_object(obj).map(EndpointRecord::Rpc),
            Some(Value::String(kind)) if kind == "rpc" => {
                rpc_from_object(obj).map(EndpointRecord::Rpc)
            }
            Some(Value::String(kind)) if kind == "ipfs" => {
                ipfs_from_object(obj).map(EndpointRecord::Ipfs)
            }
            Some(other) => Err(RecordError::UnknownType(match other {
                Value::String(s) => s.clone(),
                v => v.to_string(),
            })),
        }
    }
}

impl IpfsEndpoint {
    /// Gateway entry for an absolute URL, checked the same way `load` checks it.
    pub fn gateway(url: impl Into<String>) -> Result<Self, RecordError> {
        let url = url.into();
        url::Url::parse(&url).map_err(|e| RecordError::InvalidField {
            field: "gateway",
            reason: e.to_string(),
        })?;
        Ok(IpfsEndpoint::Gateway(url))
    }
}

fn rpc_from_object(obj: &Map<String, Value>) -> Result<RpcEndpoint, RecordError> {
    require(obj, &["host", "port", "protocol"])?;
    Ok(RpcEndpoint {
        host: host_field(obj, "host")?,
        port: port_field(obj, "port")?,
        protocol: protocol_field::<RpcProtocol>(obj, "protocol")?,
    })
}

fn ipfs_from_object(obj: &Map<String, Value>) -> Result<IpfsEndpoint, RecordError> {
    let gateway = obj.get("gateway").filter(|v| !v.is_null());
    let api = obj.get("api").filter(|v| !v.is_null());

    match (gateway, api) {
        (None, None) => Err(RecordError::EmptyIpfs),
        (Some(_), Some(_)) => Err(RecordError::AmbiguousIpfs),
        (Some(gateway), None) => {
            let url = gateway.as_str().ok_or_else(|| RecordError::InvalidField {
                field: "gateway",
                reason: "expected a URL string".to_string(),
            })?;
            IpfsEndpoint::gateway(url)
        }
        (None, Some(api)) => {
            let api = api.as_object().ok_or_else(|| RecordError::InvalidField {
                field: "api",
                reason: "expected an object".to_string(),
            })?;
            require(api, &["host", "port", "protocol"]).map_err(|e| match e {
                RecordError::MissingFields(fields) => RecordError::MissingFields(
                    fields.into_iter().map(api_field_name).collect(),
                ),
                other => other,
            })?;
            Ok(IpfsEndpoint::Api(IpfsApi {
                host: host_field(api, "api.host")?,
                port: port_field(api, "api.port")?,
                protocol: protocol_field::<ApiProtocol>(api, "api.protocol")?,
            }))
        }
    }
}

fn api_field_name(field: &'static str) -> &'static str {
    match field {
        "host" => "api.host",
        "port" => "api.port",
        _ => "api.protocol",
    }
}

/// Missing, null, and empty-string values all count as absent.
fn require(obj: &Map<String, Value>, fields: &[&'static str]) -> Result<(), RecordError> {
    let missing: Vec<&'static str> = fields
        .iter()
        .copied()
        .filter(|field| match obj.get(*field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(RecordError::MissingFields(missing))
    }
}

/// Reads the last path segment of `field` from `obj`.
fn lookup<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    let key = field.rsplit('.').next().unwrap_or(field);
    obj.get(key)
}

fn host_field(obj: &Map<String, Value>, field: &'static str) -> Result<String, RecordError> {
    match lookup(obj, field) {
        Some(Value::String(host)) if !host.trim().is_empty() => Ok(host.clone()),
        _ => Err(RecordError::InvalidField {
            field,
            reason: "expected a non-empty string".to_string(),
        }),
    }
}

fn port_field(obj: &Map<String, Value>, field: &'static str) -> Result<u16, RecordError> {
    lookup(obj, field)
        .and_then(Value::as_u64)
        .filter(|port| (1..=u64::from(u16::MAX)).contains(port))
        .map(|port| port as u16)
        .ok_or_else(|| RecordError::InvalidField {
            field,
            reason: "expected an integer between 1 and 65535".to_string(),
        })
}

fn protocol_field<P>(obj: &Map<String, Value>, field: &'static str) -> Result<P, RecordError>
where
    P: std::str::FromStr<Err = String>,
{
    match lookup(obj, field) {
        Some(Value::String(s)) => s
            .parse::<P>()
            .map_err(|reason| RecordError::InvalidField { field, reason }),
        _ => Err(RecordError::InvalidField {
            field,
            reason: "expected a string".to_string(),
        }),
    }
}
