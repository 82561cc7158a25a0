//! Fault isolation and validation through the provider

use std::sync::Arc;
use std::time::Duration;

use ledgerd_core::application::{Executor, Provider, ProviderOptions};
use ledgerd_core::domain::{
    CallDescriptor, CallError, CallErrorKind, CoordinatorError, LedgerError,
};
use ledgerd_core::port::ledger::mocks::MockLedger;
use ledgerd_core::port::ReadinessObserver;
use serde_json::json;

fn serial_provider() -> (Provider<MockLedger>, Arc<MockLedger>) {
    let ledger = Arc::new(MockLedger::new());
    let options = ProviderOptions {
        async_request_processing: false,
        concurrency_limit: None,
    };
    let (provider, ready) = Provider::new(&options, ledger.clone()).unwrap();
    ready.on_ready();
    (provider, ledger)
}

#[tokio::test]
async fn test_failed_request_does_not_block_later_ones() {
    let (provider, ledger) = serial_provider();

    let first = provider.request("echo", vec![json!(1)]).unwrap();
    let failing = provider.request("fail", vec![json!("insufficient funds")]).unwrap();
    let third = provider.request("echo", vec![json!(3)]).unwrap();
    let fourth = provider.request("echo", vec![json!(4)]).unwrap();

    assert_eq!(first.await, Ok(Ok(json!([1]))));

    let err = failing.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), CallErrorKind::Execution);
    assert_eq!(
        err,
        CallError::Execution(LedgerError::Failed("insufficient funds".to_string()))
    );

    assert_eq!(third.await, Ok(Ok(json!([3]))));
    assert_eq!(fourth.await, Ok(Ok(json!([4]))));
    assert_eq!(ledger.calls(), vec!["echo", "fail", "echo", "echo"]);
}

#[tokio::test]
async fn test_panicking_request_does_not_block_later_ones() {
    let (provider, _ledger) = serial_provider();

    let polled = provider.request("panic", vec![]).unwrap();
    let eager = provider.request("sync_panic", vec![]).unwrap();
    let after = provider.request("echo", vec![json!("still here")]).unwrap();

    assert!(matches!(
        polled.await,
        Ok(Err(CallError::Execution(LedgerError::Panicked(_))))
    ));
    assert!(matches!(
        eager.await,
        Ok(Err(CallError::Execution(LedgerError::Panicked(_))))
    ));
    assert_eq!(after.await, Ok(Ok(json!(["still here"]))));
    assert_eq!(provider.stats().in_flight, 0);
}

#[tokio::test]
async fn test_unknown_method_never_reaches_ledger() {
    let (provider, ledger) = serial_provider();

    let result = provider.request("eth_sendTransaction", vec![]).unwrap().await;
    assert_eq!(
        result,
        Ok(Err(CallError::Validation(
            "Method not supported: eth_sendTransaction".to_string()
        )))
    );

    // Public on the type, but not exposed
    let result = provider.request("reset", vec![]).unwrap().await;
    assert!(matches!(result, Ok(Err(CallError::Validation(_)))));
    assert_eq!(ledger.call_count(), 0);
}

#[tokio::test]
async fn test_executor_validates_without_coordinator() {
    let ledger = Arc::new(MockLedger::new());
    let executor = Executor::<MockLedger>::new();

    let result = executor
        .execute(CallDescriptor::new(ledger.clone(), "nope", vec![]))
        .await;
    assert_eq!(result.unwrap_err().kind(), CallErrorKind::Validation);
    assert!(ledger.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_rejects_held_and_new_requests() {
    let ledger = Arc::new(MockLedger::new().with_init_delay(Duration::from_secs(60)));
    let provider =
        Provider::initialize(&ProviderOptions::default(), ledger.clone()).unwrap();

    let held = provider.request("echo", vec![]).unwrap();
    provider.shutdown();

    assert_eq!(held.await, Err(CoordinatorError::Disposed));
    assert!(matches!(
        provider.request("echo", vec![]),
        Err(CoordinatorError::Disposed)
    ));
    assert_eq!(ledger.call_count(), 0);
}

#[tokio::test]
async fn test_failed_initialization_rejects_requests() {
    let ledger = Arc::new(MockLedger::new().with_init_failure("genesis unreadable"));
    let provider =
        Provider::initialize(&ProviderOptions::default(), ledger.clone()).unwrap();

    let handle = provider.request("echo", vec![]).unwrap();
    assert_eq!(handle.await, Err(CoordinatorError::Disposed));
    assert!(provider.stats().disposed);
    assert_eq!(ledger.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_requests_run_after_slow_initialization() {
    let ledger = Arc::new(MockLedger::new().with_init_delay(Duration::from_millis(250)));
    let provider =
        Provider::initialize(&ProviderOptions::default(), ledger.clone()).unwrap();

    let handle = provider.request("ready", vec![]).unwrap();
    assert_eq!(handle.await, Ok(Ok(json!(true))));
    assert!(ledger.is_initialized());
    assert!(!provider.stats().held);
}
