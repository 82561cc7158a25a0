//! JSON-RPC round trips against a live server on an ephemeral port

use std::sync::Arc;

use jsonrpsee::core::client::{ClientT, Error as ClientError};
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use jsonrpsee::server::ServerHandle;
use ledgerd_api_rpc::{RpcServer, RpcServerConfig};
use ledgerd_core::application::{Provider, ProviderOptions};
use ledgerd_core::port::ledger::mocks::MockLedger;
use serde_json::{json, Value};

async fn start_server(
    options: ProviderOptions,
) -> (HttpClient, ServerHandle, Arc<Provider<MockLedger>>, Arc<MockLedger>) {
    let ledger = Arc::new(MockLedger::new());
    let provider = Arc::new(Provider::initialize(&options, ledger.clone()).unwrap());

    let config = RpcServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    };
    let (addr, handle) = RpcServer::new(config, provider.clone())
        .start()
        .await
        .unwrap();

    let client = HttpClientBuilder::default()
        .build(format!("http://{}", addr))
        .unwrap();
    (client, handle, provider, ledger)
}

fn error_code(err: ClientError) -> i32 {
    match err {
        ClientError::Call(obj) => obj.code(),
        other => panic!("expected a JSON-RPC error response, got {other:?}"),
    }
}

#[tokio::test]
async fn test_exposed_method_roundtrip() {
    let (client, handle, _provider, ledger) = start_server(ProviderOptions::default()).await;

    let value: Value = client.request("echo", rpc_params!["a", 1]).await.unwrap();
    assert_eq!(value, json!(["a", 1]));

    let value: Value = client.request("ready", rpc_params![]).await.unwrap();
    assert_eq!(value, json!(true));
    assert!(ledger.is_initialized());

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_unexposed_method_is_not_found() {
    let (client, handle, _provider, ledger) = start_server(ProviderOptions::default()).await;

    let err = client
        .request::<Value, _>("reset", rpc_params![])
        .await
        .unwrap_err();
    assert_eq!(error_code(err), -32601);
    assert_eq!(ledger.call_count(), 0);

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_ledger_failures_map_to_error_codes() {
    let (client, handle, _provider, _ledger) = start_server(ProviderOptions::default()).await;

    let err = client
        .request::<Value, _>("fail", rpc_params!["out of gas"])
        .await
        .unwrap_err();
    assert_eq!(error_code(err), -32000);

    let err = client
        .request::<Value, _>("sleep", rpc_params!["not a number"])
        .await
        .unwrap_err();
    assert_eq!(error_code(err), -32602);

    let err = client
        .request::<Value, _>("panic", rpc_params![])
        .await
        .unwrap_err();
    assert_eq!(error_code(err), -32000);

    // The server keeps serving after a panicking call
    let value: Value = client.request("echo", rpc_params![]).await.unwrap();
    assert_eq!(value, json!([]));

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_serial_provider_over_rpc() {
    let options = ProviderOptions {
        async_request_processing: false,
        concurrency_limit: None,
    };
    let (client, handle, provider, ledger) = start_server(options).await;

    let (slow, fast) = tokio::join!(
        client.request::<Value, _>("sleep", rpc_params![40, "slow"]),
        client.request::<Value, _>("sleep", rpc_params![1, "fast"]),
    );
    assert_eq!(slow.unwrap(), json!("slow"));
    assert_eq!(fast.unwrap(), json!("fast"));
    assert_eq!(ledger.call_count(), 2);
    assert_eq!(provider.stats().in_flight, 0);

    handle.stop().unwrap();
}

#[tokio::test]
async fn test_requests_fail_after_shutdown() {
    let (client, handle, provider, _ledger) = start_server(ProviderOptions::default()).await;

    provider.shutdown();
    let err = client
        .request::<Value, _>("echo", rpc_params![])
        .await
        .unwrap_err();
    assert_eq!(error_code(err), -32002);

    handle.stop().unwrap();
}
