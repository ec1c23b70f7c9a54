//! Per-store host state and the call context handed to capabilities.

use wasmtime::{Caller, Extern, Func, Instance, Memory, Module, Val};
use wb_exec::{ExecContext, Value};

use crate::error::MemoryError;
use crate::namespace::invoke;

/// Data carried by every store the bootstrapper creates.
pub struct HostState {
    identifier: String,
    exports: Vec<String>,
    instance: Option<Instance>,
}

impl HostState {
    pub(crate) fn new(identifier: &str, module: &Module) -> Self {
        HostState {
            identifier: identifier.to_string(),
            exports: module.exports().map(|e| e.name().to_string()).collect(),
            instance: None,
        }
    }

    /// Bind the finished instance as the context capabilities run against.
    pub(crate) fn bind(&mut self, instance: Instance) {
        self.instance = Some(instance);
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn exports(&self) -> &[String] {
        &self.exports
    }

    /// The bound instance. `None` while instantiation is still running.
    pub fn instance(&self) -> Option<Instance> {
        self.instance
    }
}

/// One invocation of a capability.
///
/// Gives the handler its arguments and access to the calling instance's
/// exported `memory` and functions.
pub struct HostCall<'a, 'c> {
    caller: &'a mut Caller<'c, HostState>,
    args: &'a [Value],
}

impl<'a, 'c> HostCall<'a, 'c> {
    pub(crate) fn new(caller: &'a mut Caller<'c, HostState>, args: &'a [Value]) -> Self {
        HostCall { caller, args }
    }

    pub fn args(&self) -> &[Value] {
        self.args
    }

    /// Argument `index`, or `Undefined` when the guest passed fewer.
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or(Value::Undefined)
    }

    pub fn identifier(&self) -> &str {
        self.caller.data().identifier()
    }

    /// The instance as seen by a code-execution provider.
    pub fn context(&self) -> ExecContext {
        let state = self.caller.data();
        ExecContext {
            module: state.identifier.clone(),
            exports: state.exports.clone(),
        }
    }

    /// Call an exported function of the instance, e.g. `_start` from a
    /// `start` capability.
    pub fn call_export(&mut self, name: &str, args: &[Val]) -> wasmtime::Result<Vec<Val>> {
        let Some(func) = self.func(name) else {
            anyhow::bail!(
                "module `{}` has no exported function `{name}`",
                self.caller.data().identifier
            );
        };
        invoke(&mut *self.caller, &func, args)
    }

    fn func(&mut self, name: &str) -> Option<Func> {
        if let Some(Extern::Func(func)) = self.caller.get_export(name) {
            return Some(func);
        }
        let bound = self.caller.data().instance;
        bound.and_then(|instance| instance.get_func(&mut *self.caller, name))
    }

    fn memory(&mut self) -> Result<Memory, MemoryError> {
        if let Some(Extern::Memory(memory)) = self.caller.get_export("memory") {
            return Ok(memory);
        }
        // Host-initiated calls (the `start` capability) have no calling
        // instance; fall back to the bound one.
        let bound = self.caller.data().instance;
        bound
            .and_then(|instance| instance.get_memory(&mut *self.caller, "memory"))
            .ok_or_else(|| MemoryError::NoMemory {
                module: self.caller.data().identifier.clone(),
            })
    }

    /// Copy `length` bytes starting at `pointer` out of guest memory.
    pub fn read_memory(&mut self, pointer: u32, length: u32) -> Result<Vec<u8>, MemoryError> {
        let memory = self.memory()?;
        let end = u64::from(pointer) + u64::from(length);
        if end > memory.data_size(&*self.caller) as u64 {
            return Err(MemoryError::OutOfBounds { pointer, length });
        }
        let mut buf = vec![0; length as usize];
        memory
            .read(&*self.caller, pointer as usize, &mut buf)
            .map_err(|_| MemoryError::OutOfBounds { pointer, length })?;
        Ok(buf)
    }

    /// Read guest memory as UTF-8, replacing invalid sequences.
    pub fn read_str(&mut self, pointer: u32, length: u32) -> Result<String, MemoryError> {
        let bytes = self.read_memory(pointer, length)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Copy `bytes` into guest memory at `pointer`.
    pub fn write_memory(&mut self, pointer: u32, bytes: &[u8]) -> Result<(), MemoryError> {
        let memory = self.memory()?;
        memory
            .write(&mut *self.caller, pointer as usize, bytes)
            .map_err(|_| MemoryError::OutOfBounds {
                pointer,
                length: u32::try_from(bytes.len()).unwrap_or(u32::MAX),
            })
    }
}
