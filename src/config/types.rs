use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use clap::ValueEnum;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Transport scheme of a JSON-RPC node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RpcProtocol {
    Http,
    Https,
    Ws,
    Wss,
}

impl RpcProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Ws => "ws",
            Self::Wss => "wss",
        }
    }

    pub fn all() -> &'static [RpcProtocol] {
        &[Self::Http, Self::Https, Self::Ws, Self::Wss]
    }
}

impl fmt::Display for RpcProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RpcProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("'{s}' is not one of: http, https, ws, wss"))
    }
}

/// Transport scheme of an IPFS HTTP API. Websockets are not an option here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ApiProtocol {
    Http,
    Https,
}

impl ApiProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for ApiProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(format!("'{other}' is not one of: http, https")),
        }
    }
}

/// A JSON-RPC node address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcEndpoint {
    pub host: String,
    pub port: u16,
    pub protocol: RpcProtocol,
}

impl RpcEndpoint {
    pub fn new(host: impl Into<String>, port: u16, protocol: RpcProtocol) -> Self {
        Self {
            host: host.into(),
            port,
            protocol,
        }
    }

    /// `<protocol>://<host>:<port>`, the form handed to the JSON-RPC client.
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

/// Address of an IPFS HTTP API (not a gateway).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpfsApi {
    pub host: String,
    pub port: u16,
    pub protocol: ApiProtocol,
}

impl IpfsApi {
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

/// An IPFS endpoint. Exactly one of gateway or api, so both are variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpfsEndpoint {
    Gateway(String),
    Api(IpfsApi),
}

impl Serialize for IpfsEndpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", "ipfs")?;
        match self {
            Self::Gateway(url) => map.serialize_entry("gateway", url)?,
            Self::Api(api) => map.serialize_entry("api", api)?,
        }
        map.end()
    }
}

/// One connection target in a named configuration.
///
/// Deserialization goes through [`EndpointRecord::from_value`], so every
/// record obtained from JSON has passed the same validation as `load`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, try_from = "serde_json::Value")]
pub enum EndpointRecord {
    Rpc(RpcEndpoint),
    Ipfs(IpfsEndpoint),
}

impl EndpointRecord {
    pub fn as_rpc(&self) -> Option<&RpcEndpoint> {
        match self {
            Self::Rpc(rpc) => Some(rpc),
            Self::Ipfs(_) => None,
        }
    }

    pub fn as_ipfs(&self) -> Option<&IpfsEndpoint> {
        match self {
            Self::Ipfs(ipfs) => Some(ipfs),
            Self::Rpc(_) => None,
        }
    }
}

impl From<RpcEndpoint> for EndpointRecord {
    fn from(rpc: RpcEndpoint) -> Self {
        Self::Rpc(rpc)
    }
}

impl From<IpfsEndpoint> for EndpointRecord {
    fn from(ipfs: IpfsEndpoint) -> Self {
        Self::Ipfs(ipfs)
    }
}

impl TryFrom<serde_json::Value> for EndpointRecord {
    type Error = crate::config::RecordError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

/// Ordered endpoint records. The first RPC entry is the primary one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointCollection(Vec<EndpointRecord>);

impl EndpointCollection {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, record: impl Into<EndpointRecord>) {
        self.0.push(record.into());
    }

    /// First RPC record in collection order.
    pub fn primary_rpc(&self) -> Option<&RpcEndpoint> {
        self.0.iter().find_map(EndpointRecord::as_rpc)
    }

    pub fn primary_rpc_url(&self) -> Option<String> {
        self.primary_rpc().map(RpcEndpoint::url)
    }

    pub fn ipfs_entries(&self) -> impl Iterator<Item = &IpfsEndpoint> {
        self.0.iter().filter_map(EndpointRecord::as_ipfs)
    }

    pub fn into_inner(self) -> Vec<EndpointRecord> {
        self.0
    }
}

impl Deref for EndpointCollection {
    type Target = [EndpointRecord];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<EndpointRecord>> for EndpointCollection {
    fn from(records: Vec<EndpointRecord>) -> Self {
        Self(records)
    }
}

impl From<EndpointRecord> for EndpointCollection {
    fn from(record: EndpointRecord) -> Self {
        Self(vec![record])
    }
}

impl From<RpcEndpoint> for EndpointCollection {
    fn from(rpc: RpcEndpoint) -> Self {
        Self(vec![EndpointRecord::Rpc(rpc)])
    }
}

impl From<IpfsEndpoint> for EndpointCollection {
    fn from(ipfs: IpfsEndpoint) -> Self {
        Self(vec![EndpointRecord::Ipfs(ipfs)])
    }
}

impl FromIterator<EndpointRecord> for EndpointCollection {
    fn from_iter<I: IntoIterator<Item = EndpointRecord>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for EndpointCollection {
    type Item = EndpointRecord;
    type IntoIter = std::vec::IntoIter<EndpointRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a EndpointCollection {
    type Item = &'a EndpointRecord;
    type IntoIter = std::slice::Iter<'a, EndpointRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
