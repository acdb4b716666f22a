use std::io::{BufRead, Write};

use crate::ast::DataType;
use crate::interpreter::Value;
use crate::stdlib::{Host, NativeError, NativeFunction};
use crate::{t_any, t_nil, t_string};

pub fn natives(host: &Host) -> Vec<Box<dyn NativeFunction>> {
    vec![
        Box::new(Print { host: host.clone() }),
        Box::new(Input { host: host.clone() }),
    ]
}

/// print(value: any) -> nil
#[derive(Debug, Clone)]
pub struct Print {
    host: Host,
}

impl NativeFunction for Print {
    fn name(&self) -> &'static str {
        "print"
    }

    fn params(&self) -> Vec<DataType> {
        vec![t_any!()]
    }

    fn return_type(&self) -> DataType {
        t_nil!()
    }

    fn call(&self, args: Vec<Value>) -> Result<Value, NativeError> {
        let mut out = self.host.out.borrow_mut();
        for arg in &args {
            writeln!(out, "{}", arg)?;
        }
        out.flush()?;
        Ok(Value::Nil)
    }

    fn box_clone(&self) -> Box<dyn NativeFunction> {
        Box::new(self.clone())
    }
}

/// input() -> string
///
/// Reads one line without its terminator. End of input reads as "".
#[derive(Debug, Clone)]
pub struct Input {
    host: Host,
}

impl NativeFunction for Input {
    fn name(&self) -> &'static str {
        "input"
    }

    fn params(&self) -> Vec<DataType> {
        vec![]
    }

    fn return_type(&self) -> DataType {
        t_string!()
    }

    fn call(&self, _args: Vec<Value>) -> Result<Value, NativeError> {
        let mut line = String::new();
        self.host.input.borrow_mut().read_line(&mut line)?;
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Value::String(line))
    }

    fn box_clone(&self) -> Box<dyn NativeFunction> {
        Box::new(self.clone())
    }
}
