mod common;

use common::mock_node::MockNode;
use vx3::ipfs::{fetch_cid, FetchedContent, IpfsError};

/// Test that JSON content comes back as text.
#[tokio::test]
async fn test_fetch_json_as_text() {
    let gateway = MockNode::start().await;
    gateway
        .serve_ipfs("bafyjson", "application/json", br#"{"name":"nft"}"#)
        .await;

    let content = fetch_cid(&reqwest::Client::new(), &gateway.url(), "bafyjson")
        .await
        .unwrap();
    assert_eq!(content, FetchedContent::Text(r#"{"name":"nft"}"#.to_string()));
}

/// Test that a trailing slash on the gateway is tolerated.
#[tokio::test]
async fn test_fetch_with_trailing_slash() {
    let gateway = MockNode::start().await;
    gateway.serve_ipfs("bafytext", "text/plain; charset=utf-8", b"hello").await;

    let content = fetch_cid(
        &reqwest::Client::new(),
        &format!("{}/", gateway.url()),
        "bafytext",
    )
    .await
    .unwrap();
    assert_eq!(content, FetchedContent::Text("hello".into()));
}

/// Test that other content types come back as raw bytes.
#[tokio::test]
async fn test_fetch_binary() {
    let gateway = MockNode::start().await;
    let png = [0x89, b'P', b'N', b'G', 0, 1, 2];
    gateway.serve_ipfs("bafyimage", "image/png", &png).await;

    let content = fetch_cid(&reqwest::Client::new(), &gateway.url(), "bafyimage")
        .await
        .unwrap();
    assert_eq!(content, FetchedContent::Binary(png.to_vec()));
    assert_eq!(content.len(), 7);
}

/// Test that a gateway error status is reported with the URL.
#[tokio::test]
async fn test_fetch_missing_cid() {
    let gateway = MockNode::start().await;

    match fetch_cid(&reqwest::Client::new(), &gateway.url(), "bafymissing")
        .await
        .unwrap_err()
    {
        IpfsError::Status { url, status } => {
            assert_eq!(status, 404);
            assert!(url.ends_with("/ipfs/bafymissing"));
        }
        other => panic!("Expected Status error, got {other:?}"),
    }
}

/// Test that an empty CID is rejected locally.
#[tokio::test]
async fn test_fetch_empty_cid() {
    let err = fetch_cid(&reqwest::Client::new(), "https://ipfs.io", " ")
        .await
        .unwrap_err();
    assert!(matches!(err, IpfsError::EmptyCid));
}
