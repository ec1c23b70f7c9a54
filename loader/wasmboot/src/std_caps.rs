//! Capabilities the CLI hands to permissive guests.

use wb_exec::Value;

use crate::environment::{Capabilities, Capability};

/// `log(pointer, length)`: print a UTF-8 string from guest memory.
pub fn standard_capabilities() -> Capabilities {
    Capabilities::new().with("log", Capability::new(log))
}

#[expect(clippy::cast_sign_loss, reason = "guest pointers are u32 bit patterns")]
fn log(call: &mut crate::host::HostCall<'_, '_>) -> wasmtime::Result<Value> {
    let (pointer, length) = (call.arg(0).to_i32() as u32, call.arg(1).to_i32() as u32);
    let text = call.read_str(pointer, length)?;
    tracing::info!(target: "guest", module = call.identifier(), "{text}");
    println!("{text}");
    Ok(Value::Null)
}
