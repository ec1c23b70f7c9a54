//! The code-execution provider seam.

use std::sync::Arc;

use crate::value::Value;

/// The guest instance a script runs against, bound as its `this`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecContext {
    /// Identifier the module was loaded under.
    pub module: String,
    /// Names of the instance's exports.
    pub exports: Vec<String>,
}

/// Failure while compiling or running guest-supplied source.
///
/// These propagate out of the `js` capability unchanged; the bootstrapper
/// never catches them.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExecError {
    #[error("failed to compile guest source: {message}")]
    Compile { message: String },
    #[error("guest source raised an error: {message}")]
    Runtime { message: String },
}

/// Compiles host-language source into a function body and invokes it.
pub trait CodeExecutionProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Compile `source` as a function body and call it once.
    ///
    /// `args` are the call arguments; `context` is bound as `this`.
    fn execute(&self, source: &str, context: &ExecContext, args: &[Value])
        -> Result<Value, ExecError>;
}

/// Provider for hosts that cannot or will not generate code at runtime.
///
/// Ignores every request and returns [`Value::Null`], matching secure mode.
#[derive(Clone, Copy, Debug, Default)]
pub struct Disabled;

impl CodeExecutionProvider for Disabled {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn execute(&self, _: &str, _: &ExecContext, _: &[Value]) -> Result<Value, ExecError> {
        Ok(Value::Null)
    }
}

/// The provider used when the embedder does not pick one.
///
/// Script execution when the `scripting` feature is on, [`Disabled`] otherwise.
pub fn default_provider() -> Arc<dyn CodeExecutionProvider> {
    #[cfg(feature = "scripting")]
    {
        Arc::new(crate::script::ScriptProvider::new())
    }
    #[cfg(not(feature = "scripting"))]
    {
        Arc::new(Disabled)
    }
}
