//! The `env` import namespace.
//!
//! Built once per load from the environment: caller capabilities first (in
//! permissive mode), then `js`, which always wins over a caller entry of the
//! same name. Only entries the module actually imports are defined in the
//! linker; anything the module imports that the namespace lacks is left for
//! wasmtime to report as an unknown import.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use wasmtime::{AsContextMut, ExternType, Func, Linker, Module, Val, ValType};
use wb_exec::{CodeExecutionProvider, Value};

use crate::environment::{Capability, Environment};
use crate::host::{HostCall, HostState};

/// Import module every capability lives under.
pub const ENV_MODULE: &str = "env";

/// The dynamic code-evaluation capability.
pub const JS_CAPABILITY: &str = "js";

/// Caller capability run in place of the module's `_start`.
pub const START_CAPABILITY: &str = "start";

/// Resolved `env` namespace for one load.
#[derive(Clone, Debug)]
pub struct ImportNamespace {
    entries: BTreeMap<String, Capability>,
}

impl ImportNamespace {
    pub fn build(env: &Environment, provider: Arc<dyn CodeExecutionProvider>) -> Self {
        let mut entries = BTreeMap::new();
        if let Some(capabilities) = env.capabilities() {
            for (name, capability) in capabilities {
                entries.insert(name.clone(), capability.clone());
            }
        }
        entries.insert(
            JS_CAPABILITY.to_string(),
            js_capability(env.is_secure(), provider),
        );
        ImportNamespace { entries }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Capability> {
        self.entries.get(name)
    }

    /// Define every `env` function `module` imports that this namespace has.
    ///
    /// Each definition takes the signature from the import declaration.
    pub(crate) fn define(
        &self,
        linker: &mut Linker<HostState>,
        module: &Module,
    ) -> wasmtime::Result<()> {
        let mut defined = HashSet::new();
        for import in module.imports() {
            if import.module() != ENV_MODULE || !defined.insert(import.name().to_string()) {
                continue;
            }
            let Some(capability) = self.entries.get(import.name()) else {
                continue;
            };
            let ExternType::Func(ty) = import.ty() else {
                continue;
            };

            tracing::trace!(name = import.name(), ?ty, "binding env import");
            let capability = capability.clone();
            let result_types: Vec<ValType> = ty.results().collect();
            linker.func_new(
                ENV_MODULE,
                import.name(),
                ty,
                move |mut caller, params, results| {
                    let args: Vec<Value> = params.iter().map(val_to_value).collect();
                    let value = capability.call(&mut HostCall::new(&mut caller, &args))?;
                    for (slot, ty) in results.iter_mut().zip(&result_types) {
                        *slot = coerce(&value, ty)?;
                    }
                    Ok(())
                },
            )?;
        }
        Ok(())
    }
}

/// The `js` capability for one load.
///
/// Secure: a no-op. Permissive: `(pointer, length, ...args)` reads source
/// from guest memory and hands it to `provider` with `args` as arguments.
fn js_capability(secure: bool, provider: Arc<dyn CodeExecutionProvider>) -> Capability {
    if secure {
        return Capability::noop();
    }
    Capability::new(move |call| {
        #[expect(clippy::cast_sign_loss, reason = "guest pointers are u32 bit patterns")]
        let (pointer, length) = (call.arg(0).to_i32() as u32, call.arg(1).to_i32() as u32);
        let source = call.read_str(pointer, length)?;
        let context = call.context();
        let extra = call.args().get(2..).unwrap_or_default();

        tracing::debug!(
            module = %context.module,
            provider = provider.name(),
            pointer,
            length,
            args = extra.len(),
            "env.js"
        );
        tracing::trace!(%source, "env.js source");

        Ok(provider.execute(&source, &context, extra)?)
    })
}

/// Convert a wasm value to a host value. Reference and vector values have no
/// host representation and become `Null`.
pub(crate) fn val_to_value(val: &Val) -> Value {
    match val {
        Val::I32(i) => Value::from(*i),
        Val::I64(i) => Value::from(*i),
        Val::F32(bits) => Value::from(f32::from_bits(*bits)),
        Val::F64(bits) => Value::from(f64::from_bits(*bits)),
        _ => Value::Null,
    }
}

/// Coerce a host value into a wasm value of type `ty`.
pub(crate) fn coerce(value: &Value, ty: &ValType) -> wasmtime::Result<Val> {
    Ok(match ty {
        ValType::I32 => Val::I32(value.to_i32()),
        ValType::I64 => Val::I64(value.to_i64()),
        ValType::F32 => Val::F32(value.to_f32().to_bits()),
        ValType::F64 => Val::F64(value.to_f64().to_bits()),
        other => anyhow::bail!("cannot pass `{value}` to the guest as {other}"),
    })
}

/// Placeholder argument or result of type `ty`.
pub(crate) fn zero(ty: &ValType) -> wasmtime::Result<Val> {
    coerce(&Value::Int(0), ty)
}

/// Call `func` and collect however many results it declares.
pub(crate) fn invoke(
    mut store: impl AsContextMut,
    func: &Func,
    args: &[Val],
) -> wasmtime::Result<Vec<Val>> {
    let ty = func.ty(&store);
    let mut results = ty.results().map(|t| zero(&t)).collect::<wasmtime::Result<Vec<_>>>()?;
    func.call(&mut store, args, &mut results)?;
    Ok(results)
}
