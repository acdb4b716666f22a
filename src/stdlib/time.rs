use std::time::{SystemTime, UNIX_EPOCH};

use crate::ast::DataType;
use crate::interpreter::Value;
use crate::stdlib::{NativeError, NativeFunction};
use crate::t_float;

pub fn natives() -> Vec<Box<dyn NativeFunction>> {
    vec![Box::new(Clock)]
}

/// clock() -> float, seconds since the Unix epoch.
#[derive(Debug, Clone, Copy)]
pub struct Clock;

impl NativeFunction for Clock {
    fn name(&self) -> &'static str {
        "clock"
    }

    fn params(&self) -> Vec<DataType> {
        vec![]
    }

    fn return_type(&self) -> DataType {
        t_float!()
    }

    fn call(&self, _args: Vec<Value>) -> Result<Value, NativeError> {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| NativeError::Message(format!("clock error: {}", e)))?;
        Ok(Value::Float(elapsed.as_secs_f64()))
    }

    fn box_clone(&self) -> Box<dyn NativeFunction> {
        Box::new(*self)
    }
}
