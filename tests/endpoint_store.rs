use std::fs;

use serde_json::{json, Value};
use tempfile::TempDir;
use vx3::config::{
    display, ApiProtocol, EndpointCollection, EndpointRecord, EndpointStore, IpfsApi,
    IpfsEndpoint, RecordError, RpcEndpoint, RpcProtocol, StoreError,
};

fn temp_store() -> (TempDir, EndpointStore) {
    let dir = TempDir::new().unwrap();
    let store = EndpointStore::new(dir.path().join("rpcs"));
    (dir, store)
}

fn mixed_collection() -> EndpointCollection {
    vec![
        EndpointRecord::from(RpcEndpoint::new("localhost", 8545, RpcProtocol::Http)),
        EndpointRecord::from(RpcEndpoint::new("node.example.com", 8546, RpcProtocol::Wss)),
        EndpointRecord::from(IpfsEndpoint::Gateway("https://ipfs.io".into())),
        EndpointRecord::from(IpfsEndpoint::Api(IpfsApi {
            host: "ipfs.example.com".into(),
            port: 5001,
            protocol: ApiProtocol::Https,
        })),
    ]
    .into()
}

/// Test the full create / add / load / display workflow.
#[test]
fn test_end_to_end_workflow() {
    let (_dir, store) = temp_store();

    store.create_default("localhost").unwrap();
    let written: Value =
        serde_json::from_str(&fs::read_to_string(store.path_for("localhost")).unwrap()).unwrap();
    assert_eq!(
        written,
        json!([{"host": "localhost", "port": 8545, "protocol": "http"}])
    );

    store
        .add_endpoint(
            "localhost",
            RpcEndpoint::new("mainnet.infura.io", 443, RpcProtocol::Https),
        )
        .unwrap();

    let loaded = store.load("localhost").unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(
        display(&loaded).collect::<Vec<_>>(),
        vec!["[0] http://localhost:8545", "[1] https://mainnet.infura.io:443"]
    );
}

/// Test that every record kind survives a save and load unchanged.
#[test]
fn test_round_trip_preserves_order_and_kinds() {
    let (_dir, store) = temp_store();
    let collection = mixed_collection();

    store.save("mixed", collection.clone()).unwrap();
    assert_eq!(store.load("mixed").unwrap(), collection);
}

/// Test the on-disk shape of each record kind.
#[test]
fn test_on_disk_format() {
    let (_dir, store) = temp_store();
    store.save("mixed", mixed_collection()).unwrap();

    let written: Value =
        serde_json::from_str(&fs::read_to_string(store.path_for("mixed")).unwrap()).unwrap();
    assert_eq!(written[0], json!({"host": "localhost", "port": 8545, "protocol": "http"}));
    assert_eq!(written[2], json!({"type": "ipfs", "gateway": "https://ipfs.io"}));
    assert_eq!(
        written[3],
        json!({"type": "ipfs", "api": {"host": "ipfs.example.com", "port": 5001, "protocol": "https"}})
    );
}

/// Test that a single saved record loads as a one-element collection.
#[test]
fn test_single_record_is_wrapped() {
    let (_dir, store) = temp_store();
    store
        .save("one", IpfsEndpoint::Gateway("https://dweb.link".into()))
        .unwrap();

    let written = fs::read_to_string(store.path_for("one")).unwrap();
    assert!(written.trim_start().starts_with('['));
    assert_eq!(store.load("one").unwrap().len(), 1);
}

/// Test that a hand-written top-level object is accepted as one record.
#[test]
fn test_top_level_object_is_normalized() {
    let (_dir, store) = temp_store();
    fs::create_dir_all(store.dir()).unwrap();
    fs::write(
        store.path_for("legacy"),
        r#"{"type":"rpc","host":"127.0.0.1","port":7545,"protocol":"http"}"#,
    )
    .unwrap();

    let loaded = store.load("legacy").unwrap();
    assert_eq!(loaded.primary_rpc_url().as_deref(), Some("http://127.0.0.1:7545"));
}

/// Test that appending keeps the earlier entries untouched.
#[test]
fn test_add_endpoint_appends() {
    let (_dir, store) = temp_store();
    let first_two: EndpointCollection = mixed_collection().into_inner()[..2].to_vec().into();
    store.save("net", first_two.clone()).unwrap();

    let updated = store
        .add_endpoint("net", IpfsEndpoint::Gateway("https://ipfs.io".into()))
        .unwrap();
    assert_eq!(updated.len(), 3);
    assert_eq!(&updated[..2], &first_two[..]);
    assert_eq!(store.load("net").unwrap(), updated);
}

/// Test that appending to a missing file starts a new collection.
#[test]
fn test_add_endpoint_to_missing_file() {
    let (_dir, store) = temp_store();
    let collection = store
        .add_endpoint("fresh", RpcEndpoint::new("localhost", 8545, RpcProtocol::Http))
        .unwrap();
    assert_eq!(collection.len(), 1);
    assert!(store.path_for("fresh").is_file());
}

/// Test that a record missing its protocol is a schema error at index 0.
#[test]
fn test_missing_protocol_is_schema_error() {
    let (_dir, store) = temp_store();
    fs::create_dir_all(store.dir()).unwrap();
    fs::write(store.path_for("bad"), r#"{"host":"x","port":8545}"#).unwrap();

    match store.load("bad").unwrap_err() {
        StoreError::Schema { index, source, .. } => {
            assert_eq!(index, 0);
            assert_eq!(source.fields(), vec!["protocol"]);
        }
        other => panic!("Expected Schema error, got {other:?}"),
    }
}

/// Test that an empty IPFS record is a schema error naming its index.
#[test]
fn test_empty_ipfs_is_schema_error() {
    let (_dir, store) = temp_store();
    fs::create_dir_all(store.dir()).unwrap();
    fs::write(
        store.path_for("bad"),
        r#"[{"host":"a","port":1,"protocol":"http"},{"type":"ipfs"}]"#,
    )
    .unwrap();

    match store.load("bad").unwrap_err() {
        StoreError::Schema { index, source, .. } => {
            assert_eq!(index, 1);
            assert_eq!(source, RecordError::EmptyIpfs);
        }
        other => panic!("Expected Schema error, got {other:?}"),
    }
}

/// Test that the three load failures are distinguishable.
#[test]
fn test_load_errors_are_distinct() {
    let (_dir, store) = temp_store();
    assert!(matches!(store.load("absent"), Err(StoreError::NotFound { .. })));

    fs::create_dir_all(store.dir()).unwrap();
    fs::write(store.path_for("broken"), "[{").unwrap();
    assert!(matches!(store.load("broken"), Err(StoreError::Parse { .. })));

    fs::write(store.path_for("wrong"), r#"[{"host":"x","port":"8545","protocol":"http"}]"#)
        .unwrap();
    assert!(matches!(store.load("wrong"), Err(StoreError::Schema { .. })));
}

/// Test that listing an absent directory is empty, not an error.
#[test]
fn test_list_absent_directory() {
    let (_dir, store) = temp_store();
    assert!(store.list().unwrap().is_empty());
    assert!(!store.dir().exists());
}

/// Test that listing returns base names of saved files.
#[test]
fn test_list_names() {
    let (_dir, store) = temp_store();
    store.create_default("localhost").unwrap();
    store.create_default("sepolia").unwrap();

    let names: Vec<String> = store.list().unwrap().into_iter().collect();
    assert_eq!(names, vec!["localhost", "sepolia"]);
}

/// Test that every load sees edits made behind the store's back.
#[test]
fn test_load_rereads_disk() {
    let (_dir, store) = temp_store();
    store.create_default("localhost").unwrap();
    assert_eq!(store.load("localhost").unwrap().len(), 1);

    fs::write(
        store.path_for("localhost"),
        r#"[{"host":"a","port":1,"protocol":"ws"},{"host":"b","port":2,"protocol":"wss"}]"#,
    )
    .unwrap();
    assert_eq!(store.load("localhost").unwrap().len(), 2);
}

/// Test that two stores in different directories do not see each other.
#[test]
fn test_directories_are_independent() {
    let dir = TempDir::new().unwrap();
    let a = EndpointStore::new(dir.path().join("a"));
    let b = EndpointStore::new(dir.path().join("b"));

    a.create_default("localhost").unwrap();
    assert!(b.load("localhost").unwrap_err().is_not_found());
    assert!(b.list().unwrap().is_empty());
}

/// Test that a directory that cannot be created is an I/O error.
#[test]
fn test_uncreatable_directory_is_io_error() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();
    let store = EndpointStore::new(blocker.join("rpcs"));

    match store.create_default("localhost").unwrap_err() {
        StoreError::Io { path, .. } => assert_eq!(path, blocker.join("rpcs")),
        other => panic!("Expected Io error, got {other:?}"),
    }
    assert!(matches!(
        store.add_endpoint("localhost", RpcEndpoint::new("a", 1, RpcProtocol::Http)),
        Err(StoreError::Io { .. })
    ));
}
