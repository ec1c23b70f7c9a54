//! Code-execution providers for the `js` host capability.
//!
//! A guest binary running in permissive mode can write host-language source
//! into its own linear memory and ask the host to compile and run it. What
//! "compile and run" means is decided by a [`CodeExecutionProvider`]:
//!
//! - [`Disabled`]: fails closed. Every request is ignored and yields
//!   [`Value::Null`], the same observable behavior as secure mode.
//! - [`ScriptProvider`] (feature `scripting`): compiles the text as the body
//!   of a Rhai function and calls it.
//!
//! The provider never sees guest memory directly. The caller decodes the
//! source, converts the trailing call arguments to [`Value`]s and describes
//! the bound instance with an [`ExecContext`].

mod print_handler;
mod provider;
#[cfg(feature = "scripting")]
mod script;
mod value;

pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, BufferPrintHandler, PrintHandlerImpl,
    SharedPrintHandler, StdoutPrintHandler,
};
pub use provider::{default_provider, CodeExecutionProvider, Disabled, ExecContext, ExecError};
#[cfg(feature = "scripting")]
pub use script::ScriptProvider;
pub use value::Value;
