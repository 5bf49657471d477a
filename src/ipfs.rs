//! Fetching content by CID through an HTTP gateway.

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use thiserror::Error;

use crate::config::{EndpointCollection, IpfsEndpoint};

#[derive(Debug, Error)]
pub enum IpfsError {
    #[error("No IPFS gateway configured (add one with 'vx3 rpc add-ipfs' or pass a gateway URL)")]
    NoGateway,

    #[error("CID must not be empty")]
    EmptyCid,

    #[error("Request to '{url}' failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Gateway returned {status} for '{url}'")]
    Status { url: String, status: u16 },
}

/// Body of a fetched object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchedContent {
    Text(String),
    Binary(Vec<u8>),
}

impl FetchedContent {
    pub fn len(&self) -> usize {
        match self {
            FetchedContent::Text(text) => text.len(),
            FetchedContent::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Base URL for an entry: the gateway as written, or the API endpoint URL.
pub fn gateway_url(entry: &IpfsEndpoint) -> String {
    match entry {
        IpfsEndpoint::Gateway(gateway) => gateway.clone(),
        IpfsEndpoint::Api(api) => api.url(),
    }
}

/// Override, else first gateway entry, else first API entry.
pub fn select_gateway(
    collection: &EndpointCollection,
    override_url: Option<&str>,
) -> Result<String, IpfsError> {
    if let Some(url) = override_url.filter(|u| !u.trim().is_empty()) {
        return Ok(url.trim().to_string());
    }
    let entries: Vec<&IpfsEndpoint> = collection.ipfs_entries().collect();
    entries
        .iter()
        .find(|e| matches!(e, IpfsEndpoint::Gateway(_)))
        .or_else(|| entries.first())
        .map(|e| gateway_url(e))
        .ok_or(IpfsError::NoGateway)
}

pub fn content_url(gateway: &str, cid: &str) -> String {
    format!("{}/ipfs/{}", gateway.trim_end_matches('/'), cid.trim())
}

pub async fn fetch_cid(client: &Client, gateway: &str, cid: &str) -> Result<FetchedContent, IpfsError> {
    if cid.trim().is_empty() {
        return Err(IpfsError::EmptyCid);
    }
    let url = content_url(gateway, cid);
    tracing::debug!(url = %url, "Fetching IPFS content");

    let transport = |source| IpfsError::Transport {
        url: url.clone(),
        source,
    };
    let response = client.get(&url).send().await.map_err(transport)?;

    let status = response.status();
    if !status.is_success() {
        return Err(IpfsError::Status {
            url,
            status: status.as_u16(),
        });
    }

    let textual = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("json") || ct.contains("text"));

    if textual {
        Ok(FetchedContent::Text(response.text().await.map_err(transport)?))
    } else {
        Ok(FetchedContent::Binary(response.bytes().await.map_err(transport)?.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiProtocol, EndpointRecord, IpfsApi, RpcEndpoint, RpcProtocol};

    fn api() -> IpfsEndpoint {
        IpfsEndpoint::Api(IpfsApi {
            host: "127.0.0.1".into(),
            port: 5001,
            protocol: ApiProtocol::Http,
        })
    }

    #[test]
    fn test_gateway_preferred_over_api() {
        let collection: EndpointCollection = vec![
            EndpointRecord::from(RpcEndpoint::new("localhost", 8545, RpcProtocol::Http)),
            EndpointRecord::from(api()),
            EndpointRecord::from(IpfsEndpoint::Gateway("https://ipfs.io".into())),
        ]
        .into();
        assert_eq!(select_gateway(&collection, None).unwrap(), "https://ipfs.io");
    }

    #[test]
    fn test_api_used_when_no_gateway() {
        let collection: EndpointCollection = EndpointRecord::from(api()).into();
        assert_eq!(select_gateway(&collection, None).unwrap(), "http://127.0.0.1:5001");
    }

    #[test]
    fn test_override_wins_and_empty_collection_fails() {
        let empty = EndpointCollection::new();
        assert_eq!(
            select_gateway(&empty, Some("https://dweb.link")).unwrap(),
            "https://dweb.link"
        );
        assert!(matches!(select_gateway(&empty, None), Err(IpfsError::NoGateway)));
        assert!(matches!(select_gateway(&empty, Some("  ")), Err(IpfsError::NoGateway)));
    }

    #[test]
    fn test_content_url_strips_trailing_slash() {
        assert_eq!(content_url("https://ipfs.io/", "bafy"), "https://ipfs.io/ipfs/bafy");
        assert_eq!(content_url("https://ipfs.io", "bafy"), "https://ipfs.io/ipfs/bafy");
    }
}
