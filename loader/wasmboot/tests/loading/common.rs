//! Shared guest modules and helpers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use wasmboot::{
    Bootstrapper, CodeExecutionProvider, ExecContext, ExecError, LoadedModule, MemoryFetcher,
    Value,
};

/// Writes `1+1` at offset 16, passes it to `js` and stores the f64 result in
/// the `result` global.
pub const ONE_PLUS_ONE: &str = r#"
(module
  (import "env" "js" (func $js (param i32 i32) (result f64)))
  (memory (export "memory") 1)
  (data (i32.const 16) "1+1")
  (global $result (export "result") (mut f64) (f64.const -1))
  (func (export "_start")
    (global.set $result (call $js (i32.const 16) (i32.const 3)))))
"#;

/// Sends a source with two extra i32 arguments and stores the i32 result.
pub const WITH_ARGS: &str = r#"
(module
  (import "env" "js" (func $js (param i32 i32 i32 i32) (result i32)))
  (memory (export "memory") 1)
  (data (i32.const 0) "arguments[0] * arguments[1]")
  (global $result (export "result") (mut i32) (i32.const -1))
  (func (export "_start")
    (global.set $result
      (call $js (i32.const 0) (i32.const 27) (i32.const 6) (i32.const 7)))))
"#;

/// A `js` call pointing outside memory.
pub const OUT_OF_BOUNDS: &str = r#"
(module
  (import "env" "js" (func $js (param i32 i32)))
  (memory (export "memory") 1)
  (func (export "_start")
    (call $js (i32.const 65530) (i32.const 100))))
"#;

/// Exports `_start` that bumps `runs`.
pub const COUNTER: &str = r#"
(module
  (global $runs (export "runs") (mut i32) (i32.const 0))
  (func (export "_start")
    (global.set $runs (i32.add (global.get $runs) (i32.const 1)))))
"#;

/// Provider that records every call and answers 42.
#[derive(Default)]
pub struct Recording {
    calls: AtomicUsize,
    last: parking_lot::Mutex<Option<(String, ExecContext, Vec<Value>)>>,
}

impl Recording {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last(&self) -> Option<(String, ExecContext, Vec<Value>)> {
        self.last.lock().clone()
    }
}

impl CodeExecutionProvider for Recording {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn execute(
        &self,
        source: &str,
        context: &ExecContext,
        args: &[Value],
    ) -> Result<Value, ExecError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock() = Some((source.to_string(), context.clone(), args.to_vec()));
        Ok(Value::Int(42))
    }
}

/// Fetcher serving one module, shared so tests can inspect requests.
pub fn serving(identifier: &str, wat: &str) -> Arc<MemoryFetcher> {
    Arc::new(MemoryFetcher::new().with_module(identifier, wat.as_bytes().to_vec()))
}

pub fn bootstrapper(fetcher: &Arc<MemoryFetcher>) -> Bootstrapper {
    Bootstrapper::with_fetcher(Arc::clone(fetcher) as Arc<dyn wasmboot::Fetcher>)
}

pub fn global_f64(loaded: &mut LoadedModule, name: &str) -> f64 {
    loaded.global(name).and_then(|v| v.f64()).expect("f64 global")
}

pub fn global_i32(loaded: &mut LoadedModule, name: &str) -> i32 {
    loaded.global(name).and_then(|v| v.i32()).expect("i32 global")
}
