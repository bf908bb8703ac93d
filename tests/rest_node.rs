//! End-to-end checks against a mock node's REST API.

use std::io::Write;

use ledger_connect::config::{load_config, ClientSettings, PresetStore};
use ledger_connect::ledger::client::QueryClient;
use ledger_connect::ledger::types::{ConnectionError, ErrorClass};
use ledger_connect::session::Session;
use ledger_connect::ConnectionManager;

mod common;

const NODE_INFO: &str =
    r#"{"node_info":{"network":"testing-1","version":"0.50.1","moniker":"node0"}}"#;

fn probing() -> ClientSettings {
    ClientSettings {
        request_timeout_secs: 2,
        probe_on_connect: true,
    }
}

#[tokio::test]
async fn test_query_session_reads_node_info() {
    let rest = common::start_mock_node(NODE_INFO).await;
    let manager = ConnectionManager::from_settings(probing()).unwrap();
    let config = common::endpoint("http://127.0.0.1:26657", &rest);

    let session = manager.get_query_session(&config, false).await.unwrap();
    let info = session.client().node_info().await.unwrap();

    assert_eq!(info.network, "testing-1");
    assert_eq!(info.moniker, "node0");
    assert_eq!(session.endpoints().rest, rest);
}

#[tokio::test]
async fn test_unreachable_node_fails_and_is_not_cached() {
    let rest = common::closed_endpoint().await;
    let manager = ConnectionManager::from_settings(probing()).unwrap();
    let config = common::endpoint("http://127.0.0.1:26657", &rest);

    let err = manager.get_query_session(&config, false).await.unwrap_err();

    assert!(matches!(err, ConnectionError::EndpointUnreachable { .. }));
    assert_eq!(err.class(), ErrorClass::Retryable);
    assert!(manager.cache().query_endpoints().is_none());
}

#[tokio::test]
async fn test_reloaded_preset_switches_session() {
    let first = common::start_mock_node(NODE_INFO).await;
    let second = common::start_mock_node(NODE_INFO).await;

    let write_presets = |rest: &str| {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [client]
            probe_on_connect = true

            [presets.local]
            rpc_endpoint = "http://127.0.0.1:26657"
            rest_endpoint = "{rest}"
            chain_id = "testing-1"
            address_prefix = "cosmos"
            gas_price = 0.025
            denom = "uatom"
            "#
        )
        .unwrap();
        file
    };

    let file = write_presets(first.as_str());
    let config = load_config(file.path()).unwrap();
    let manager = ConnectionManager::from_settings(config.client.clone()).unwrap();
    let store = PresetStore::new(config);

    let before = manager
        .get_query_session(&store.preset("local").unwrap(), false)
        .await
        .unwrap();

    let file = write_presets(second.as_str());
    store.replace(load_config(file.path()).unwrap());

    let after = manager
        .get_query_session(&store.preset("local").unwrap(), false)
        .await
        .unwrap();

    assert_eq!(before.endpoints().rest, first);
    assert_eq!(after.endpoints().rest, second);
    assert_eq!(manager.cache().query_endpoints(), Some(after.endpoints().clone()));
}
