//! Host capabilities and the environment a module is loaded with.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use wb_exec::Value;
use wb_locate::ModuleReference;

use crate::host::HostCall;

type CapabilityFn = dyn Fn(&mut HostCall<'_, '_>) -> wasmtime::Result<Value> + Send + Sync;

/// A host function a guest can import from `env`.
///
/// Capabilities are dynamically typed: the signature comes from the guest's
/// import declaration, arguments arrive as [`Value`]s and the returned value
/// is coerced into the declared result type. Returning an error traps the
/// guest and propagates out of whatever guest code made the call.
#[derive(Clone)]
pub struct Capability {
    handler: Arc<CapabilityFn>,
}

impl Capability {
    pub fn new(
        handler: impl Fn(&mut HostCall<'_, '_>) -> wasmtime::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Capability {
            handler: Arc::new(handler),
        }
    }

    /// Ignores its arguments and returns `Null`.
    pub fn noop() -> Self {
        Capability::new(|_| Ok(Value::Null))
    }

    pub fn call(&self, call: &mut HostCall<'_, '_>) -> wasmtime::Result<Value> {
        (self.handler)(call)
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Capability(..)")
    }
}

/// Named capabilities supplied by the caller.
#[derive(Clone, Debug, Default)]
pub struct Capabilities {
    entries: BTreeMap<String, Capability>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace `name`.
    pub fn insert(&mut self, name: impl Into<String>, capability: Capability) {
        self.entries.insert(name.into(), capability);
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, capability: Capability) -> Self {
        self.insert(name, capability);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Capability> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Capability> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Capabilities {
    type Item = (&'a String, &'a Capability);
    type IntoIter = btree_map::Iter<'a, String, Capability>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The environment a module is loaded with.
///
/// `Secure` and `Permissive` with no capabilities are NOT the same thing.
/// Secure disables `env.js`; any permissive environment, even an empty one,
/// lets the guest run host code through it. Embedders that want a locked
/// down guest must ask for `Secure` explicitly.
#[derive(Clone, Debug)]
pub enum Environment {
    /// `env.js` is a no-op and no caller capabilities are exposed.
    Secure,
    /// `env.js` runs guest-supplied source; every capability is exposed.
    Permissive(Capabilities),
}

impl Environment {
    /// Permissive with no extra capabilities.
    pub fn permissive() -> Self {
        Environment::Permissive(Capabilities::new())
    }

    /// The environment an auto-run load uses for `reference`.
    pub fn from_reference(reference: &ModuleReference) -> Self {
        if reference.is_secure() {
            Environment::Secure
        } else {
            Environment::permissive()
        }
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, Environment::Secure)
    }

    /// Caller capabilities. `None` in secure mode.
    pub fn capabilities(&self) -> Option<&Capabilities> {
        match self {
            Environment::Secure => None,
            Environment::Permissive(capabilities) => Some(capabilities),
        }
    }
}

impl From<Capabilities> for Environment {
    fn from(capabilities: Capabilities) -> Self {
        Environment::Permissive(capabilities)
    }
}
