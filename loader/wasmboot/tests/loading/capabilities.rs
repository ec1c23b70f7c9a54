use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use wasmboot::{Capabilities, Capability, Environment, StartRoutine, Value};

use crate::common::{bootstrapper, global_i32, serving, COUNTER};

/// Imports a caller capability `double` and records its result.
const DOUBLES: &str = r#"
(module
  (import "env" "double" (func $double (param i32) (result i32)))
  (memory (export "memory") 1)
  (global $result (export "result") (mut i32) (i32.const 0))
  (func (export "_start")
    (global.set $result (call $double (i32.const 21)))))
"#;

#[tokio::test]
async fn every_capability_is_importable() {
    let fetcher = serving("m", COUNTER);
    let caps = Capabilities::new()
        .with("alpha", Capability::noop())
        .with("beta", Capability::noop());

    let loaded = bootstrapper(&fetcher).load("m", caps.into()).await.unwrap();

    let names = loaded.import_names();
    for name in ["alpha", "beta", "js"] {
        assert!(names.iter().any(|n| n == name), "{name} missing from {names:?}");
    }
}

#[tokio::test]
async fn guest_calls_caller_capability() {
    let fetcher = serving("m", DOUBLES);
    let caps = Capabilities::new().with(
        "double",
        Capability::new(|call| Ok(Value::Int(call.arg(0).to_i64() * 2))),
    );

    let mut loaded = bootstrapper(&fetcher).load("m", caps.into()).await.unwrap();
    assert_eq!(global_i32(&mut loaded, "result"), 42);
}

#[tokio::test]
async fn secure_mode_does_not_link_caller_capabilities() {
    let fetcher = serving("m", DOUBLES);
    let err = bootstrapper(&fetcher)
        .load("m", Environment::Secure)
        .await
        .err()
        .expect("unresolved import");

    assert!(matches!(err, wasmboot::BootError::Instantiate(_)), "{err:?}");
}

#[tokio::test]
async fn start_capability_replaces_exported_start() {
    let fetcher = serving("m", COUNTER);
    let started = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&started);
    let caps = Capabilities::new().with(
        "start",
        Capability::new(move |call| {
            assert_eq!(call.identifier(), "m");
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Null)
        }),
    );

    let mut loaded = bootstrapper(&fetcher).load("m", caps.into()).await.unwrap();

    assert_eq!(loaded.start_routine(), StartRoutine::Environment);
    assert_eq!(started.load(Ordering::SeqCst), 1);
    // `_start` never ran.
    assert_eq!(global_i32(&mut loaded, "runs"), 0);
}

#[tokio::test]
async fn exported_start_runs_once() {
    let fetcher = serving("m", COUNTER);
    let mut loaded = bootstrapper(&fetcher)
        .load("m", Environment::permissive())
        .await
        .unwrap();

    assert_eq!(loaded.start_routine(), StartRoutine::Export);
    assert_eq!(global_i32(&mut loaded, "runs"), 1);
}
