//! wasmboot - fetch, instantiate and start a WebAssembly module named by a
//! script URL.
//!
//! # Flow
//!
//! ```text
//! script URL ──► Invocation::detect ──► ExportLoader ──► (nothing fetched)
//!                       │
//!                       ▼
//!                 ModuleReference
//!                       │
//!                       ▼
//! Fetcher::fetch("/wasm/<id>.wasm") ──► Module::new ──► Linker (env.*) ──► start
//! ```
//!
//! Two entry points:
//!
//! - [`Bootstrapper::load`] is the loader, always available to embedders.
//! - [`autorun`] is the hook a hosting shell calls with the script URL. It
//!   loads the module the fragment names, or returns `None` when there is no
//!   fragment so the caller can hand out the loader instead.
//!
//! # The `env` namespace
//!
//! Every guest may import `env.js`. In secure mode it does nothing. In
//! permissive mode it reads a string out of guest memory and runs it through
//! the configured [`CodeExecutionProvider`]. Permissive environments also
//! expose every caller-supplied [`Capability`].

mod autorun;
mod bootstrap;
pub mod commands;
mod config;
mod environment;
mod error;
mod fetch;
mod host;
mod namespace;
mod std_caps;

pub use autorun::autorun;
pub use bootstrap::{Bootstrapper, LoadedModule, StartRoutine, START_EXPORT};
pub use config::BootConfig;
pub use environment::{Capabilities, Capability, Environment};
pub use error::{BootError, FetchError, MemoryError};
pub use fetch::{DirFetcher, Fetcher, HttpFetcher, MemoryFetcher};
pub use host::{HostCall, HostState};
pub use namespace::{ImportNamespace, ENV_MODULE, JS_CAPABILITY, START_CAPABILITY};
pub use std_caps::standard_capabilities;

pub use wasmtime;
pub use wb_exec::{CodeExecutionProvider, Disabled, ExecContext, ExecError, Value};
pub use wb_locate::{resource_path, Invocation, ModuleReference};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=wasmboot=debug` or `RUST_LOG=wasmboot=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
