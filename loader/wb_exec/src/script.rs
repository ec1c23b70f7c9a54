//! Rhai-backed code execution.
//!
//! Guest source is compiled as the body of a one-parameter function:
//!
//! ```text
//! fn wasmboot_js_body(arguments) {
//!     <guest source>
//! }
//! ```
//!
//! and called once with `arguments` set to the forwarded call arguments and
//! `this` bound to a map describing the instance (`this.module`,
//! `this.exports`). The value of the body is the call's result.

use rhai::{Array, CallFnOptions, Dynamic, Engine, Map, Scope};

use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::provider::{CodeExecutionProvider, ExecContext, ExecError};
use crate::value::Value;

const ENTRY: &str = "wasmboot_js_body";

/// Runs guest-supplied source as Rhai.
pub struct ScriptProvider {
    engine: Engine,
    print: SharedPrintHandler,
}

impl ScriptProvider {
    /// Script provider printing to stdout.
    pub fn new() -> Self {
        Self::with_print_handler(stdout_handler())
    }

    pub fn with_print_handler(print: SharedPrintHandler) -> Self {
        let mut engine = Engine::new();

        let out = SharedPrintHandler::clone(&print);
        engine.on_print(move |text| out.println(text));
        engine.on_debug(|text, source, pos| {
            tracing::debug!(target: "wb_exec::script", source = source.unwrap_or(""), %pos, "{text}");
        });

        ScriptProvider { engine, print }
    }

    /// Abort scripts after `limit` operations. Zero removes the limit.
    #[must_use]
    pub fn with_max_operations(mut self, limit: u64) -> Self {
        self.engine.set_max_operations(limit);
        self
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print
    }
}

impl Default for ScriptProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeExecutionProvider for ScriptProvider {
    fn name(&self) -> &'static str {
        "rhai"
    }

    fn execute(
        &self,
        source: &str,
        context: &ExecContext,
        args: &[Value],
    ) -> Result<Value, ExecError> {
        let body = format!("fn {ENTRY}(arguments) {{\n{source}\n}}");
        let ast = self.engine.compile(&body).map_err(|e| ExecError::Compile {
            message: e.to_string(),
        })?;

        let mut this = context_to_dynamic(context);
        let arguments: Array = args.iter().map(value_to_dynamic).collect();
        let mut scope = Scope::new();
        let options = CallFnOptions::new()
            .eval_ast(false)
            .bind_this_ptr(&mut this);

        let result: Dynamic = self
            .engine
            .call_fn_with_options(options, &mut scope, &ast, ENTRY, (arguments,))
            .map_err(|e| ExecError::Runtime {
                message: e.to_string(),
            })?;

        Ok(dynamic_to_value(result))
    }
}

fn context_to_dynamic(context: &ExecContext) -> Dynamic {
    let exports: Array = context
        .exports
        .iter()
        .map(|name| Dynamic::from(name.clone()))
        .collect();

    let mut map = Map::new();
    map.insert("module".into(), Dynamic::from(context.module.clone()));
    map.insert("exports".into(), Dynamic::from_array(exports));
    Dynamic::from_map(map)
}

fn value_to_dynamic(value: &Value) -> Dynamic {
    match value {
        Value::Null | Value::Undefined => Dynamic::UNIT,
        Value::Bool(b) => Dynamic::from_bool(*b),
        Value::Int(i) => Dynamic::from_int(*i),
        Value::Float(f) => Dynamic::from_float(*f),
        Value::Str(s) => Dynamic::from(s.clone()),
    }
}

fn dynamic_to_value(value: Dynamic) -> Value {
    if value.is_unit() {
        return Value::Undefined;
    }
    if let Ok(b) = value.as_bool() {
        return Value::Bool(b);
    }
    if let Ok(i) = value.as_int() {
        return Value::Int(i);
    }
    if let Ok(f) = value.as_float() {
        return Value::Float(f);
    }
    if value.is_string() {
        return match value.into_string() {
            Ok(s) => Value::Str(s),
            Err(type_name) => Value::Str(type_name.to_string()),
        };
    }
    Value::Str(value.to_string())
}
