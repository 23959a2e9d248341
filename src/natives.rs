//! Host functions available to every program.

use chrono::Utc;

use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Install the default natives into `interpreter`'s global scope.
pub fn register_defaults(interpreter: &mut Interpreter) {
    interpreter.define_native("clock", 0, clock);
}

/// Milliseconds since the Unix epoch.
fn clock(_: &mut Interpreter, _: &[Value]) -> Result<Value> {
    Ok(Value::Number(Utc::now().timestamp_millis() as f64))
}
