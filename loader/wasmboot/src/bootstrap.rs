//! The bootstrapper: fetch → instantiate → bind → start.

use std::sync::Arc;

use wasmtime::{Engine, Func, FuncType, Instance, Linker, Memory, Module, Store, Val};
use wb_exec::CodeExecutionProvider;

use crate::environment::Environment;
use crate::error::BootError;
use crate::fetch::Fetcher;
use crate::host::{HostCall, HostState};
use crate::namespace::{invoke, zero, ImportNamespace, START_CAPABILITY};

/// Name of the module's own entry point.
pub const START_EXPORT: &str = "_start";

/// Which start routine ran after instantiation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartRoutine {
    /// The caller's `start` capability.
    Environment,
    /// The module's exported `_start`.
    Export,
    /// Neither was present.
    None,
}

/// Loads guest binaries.
///
/// This is the loader handed to embedders; [`crate::autorun`] is a thin hook
/// on top of it.
pub struct Bootstrapper {
    engine: Engine,
    fetcher: Arc<dyn Fetcher>,
    provider: Arc<dyn CodeExecutionProvider>,
}

impl Bootstrapper {
    /// Bootstrapper using the default engine and code-execution provider.
    pub fn new(fetcher: impl Fetcher + 'static) -> Self {
        Self::with_fetcher(Arc::new(fetcher))
    }

    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>) -> Self {
        Bootstrapper {
            engine: Engine::default(),
            fetcher,
            provider: wb_exec::default_provider(),
        }
    }

    /// Use `provider` to run `env.js` requests in permissive mode.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn CodeExecutionProvider>) -> Self {
        self.provider = provider;
        self
    }

    #[must_use]
    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn provider(&self) -> &Arc<dyn CodeExecutionProvider> {
        &self.provider
    }

    /// Fetch `/wasm/<identifier>.wasm`, instantiate it against `env` and run
    /// its start routine.
    ///
    /// The fetch is the only suspension point. Nothing is retried.
    pub async fn load(&self, identifier: &str, env: Environment) -> Result<LoadedModule, BootError> {
        let path = wb_locate::resource_path(identifier);
        tracing::debug!(identifier, %path, secure = env.is_secure(), "fetching guest binary");

        let bytes = self.fetcher.fetch(&path).await?;
        tracing::debug!(identifier, len = bytes.len(), "fetched guest binary");

        self.instantiate(identifier, &bytes, env)
    }

    /// Instantiate already-retrieved bytes and run the start routine.
    ///
    /// Accepts binary modules, and text modules when wasmtime's `wat`
    /// feature is on.
    pub fn instantiate(
        &self,
        identifier: &str,
        bytes: &[u8],
        env: Environment,
    ) -> Result<LoadedModule, BootError> {
        let module = Module::new(&self.engine, bytes).map_err(BootError::Instantiate)?;

        let namespace = ImportNamespace::build(&env, Arc::clone(&self.provider));
        let mut linker = Linker::new(&self.engine);
        namespace
            .define(&mut linker, &module)
            .map_err(BootError::Instantiate)?;

        let mut store = Store::new(&self.engine, HostState::new(identifier, &module));
        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(BootError::Instantiate)?;
        store.data_mut().bind(instance);
        tracing::debug!(identifier, "instantiated");

        let start = run_start(&mut store, instance, &env).map_err(BootError::Start)?;
        tracing::debug!(identifier, ?start, "started");

        Ok(LoadedModule {
            identifier: identifier.to_string(),
            imports: namespace.names().map(str::to_string).collect(),
            store,
            instance,
            start,
        })
    }
}

/// Run the caller's `start` capability if there is one, else `_start`.
///
/// Both are called with no arguments; missing parameters of `_start` are
/// zero-filled.
fn run_start(
    store: &mut Store<HostState>,
    instance: Instance,
    env: &Environment,
) -> wasmtime::Result<StartRoutine> {
    if let Some(start) = env.capabilities().and_then(|c| c.get(START_CAPABILITY)) {
        let start = start.clone();
        let ty = FuncType::new(store.engine(), [], []);
        let func = Func::new(&mut *store, ty, move |mut caller, _, _| {
            start.call(&mut HostCall::new(&mut caller, &[]))?;
            Ok(())
        });
        func.call(&mut *store, &[], &mut [])?;
        return Ok(StartRoutine::Environment);
    }

    let Some(func) = instance.get_func(&mut *store, START_EXPORT) else {
        return Ok(StartRoutine::None);
    };
    let params = func
        .ty(&*store)
        .params()
        .map(|t| zero(&t))
        .collect::<wasmtime::Result<Vec<_>>>()?;
    invoke(&mut *store, &func, &params)?;
    Ok(StartRoutine::Export)
}

/// A started module.
pub struct LoadedModule {
    identifier: String,
    imports: Vec<String>,
    store: Store<HostState>,
    instance: Instance,
    start: StartRoutine,
}

impl LoadedModule {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn start_routine(&self) -> StartRoutine {
        self.start
    }

    /// Every name in the resolved `env` namespace, whether or not the module
    /// imported it.
    pub fn import_names(&self) -> &[String] {
        &self.imports
    }

    pub fn exports(&self) -> &[String] {
        self.store.data().exports()
    }

    pub fn instance(&self) -> Instance {
        self.instance
    }

    pub fn store(&self) -> &Store<HostState> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store<HostState> {
        &mut self.store
    }

    /// Current value of an exported global.
    pub fn global(&mut self, name: &str) -> Option<Val> {
        let global = self.instance.get_global(&mut self.store, name)?;
        Some(global.get(&mut self.store))
    }

    pub fn memory(&mut self) -> Option<Memory> {
        self.instance.get_memory(&mut self.store, "memory")
    }

    /// Call an exported function with explicit arguments.
    pub fn call(&mut self, name: &str, args: &[Val]) -> wasmtime::Result<Vec<Val>> {
        let Some(func) = self.instance.get_func(&mut self.store, name) else {
            anyhow::bail!("module `{}` has no exported function `{name}`", self.identifier);
        };
        invoke(&mut self.store, &func, args)
    }
}
