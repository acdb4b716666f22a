pub mod io;
pub mod time;

#[cfg(test)]
pub mod test;

use std::cell::RefCell;
use std::fmt;
use std::io::{BufRead, Cursor, Write};
use std::rc::Rc;

use thiserror::Error;

use crate::ast::DataType;
use crate::interpreter::Value;

#[derive(Debug, Error)]
pub enum NativeError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Message(String),
}

/// A host-provided callable bound into scope by `import`.
///
/// The typechecker only reads the signature; the interpreter calls it with
/// arguments already checked against `arity`.
pub trait NativeFunction: fmt::Debug {
    fn name(&self) -> &'static str;
    fn params(&self) -> Vec<DataType>;
    fn return_type(&self) -> DataType;

    fn arity(&self) -> usize {
        self.params().len()
    }

    fn call(&self, args: Vec<Value>) -> Result<Value, NativeError>;

    fn box_clone(&self) -> Box<dyn NativeFunction>;
}

impl Clone for Box<dyn NativeFunction> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Output and input handles shared by every native of one run.
#[derive(Clone)]
pub struct Host {
    pub out: Rc<RefCell<dyn Write>>,
    pub input: Rc<RefCell<dyn BufRead>>,
}

impl Host {
    pub fn stdio() -> Self {
        Host {
            out: Rc::new(RefCell::new(std::io::stdout())),
            input: Rc::new(RefCell::new(std::io::stdin().lock())),
        }
    }

    /// Writes go nowhere and reads hit end of input. Used where only
    /// signatures matter.
    pub fn detached() -> Self {
        Host {
            out: Rc::new(RefCell::new(std::io::sink())),
            input: Rc::new(RefCell::new(std::io::empty())),
        }
    }

    /// Feeds `input` to the script and collects everything it prints in the
    /// returned buffer.
    pub fn captured(input: &str) -> (Self, Rc<RefCell<Vec<u8>>>) {
        let buffer = Rc::new(RefCell::new(Vec::new()));
        let host = Host {
            out: buffer.clone(),
            input: Rc::new(RefCell::new(Cursor::new(input.as_bytes().to_vec()))),
        };
        (host, buffer)
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host").finish_non_exhaustive()
    }
}

/// Resolves a library name to its natives, or `None` if no such library
/// exists.
pub fn load(library: &str, host: &Host) -> Option<Vec<Box<dyn NativeFunction>>> {
    let natives = match library {
        "io" => io::natives(host),
        "time" => time::natives(),
        _ => return None,
    };
    tracing::trace!(library, count = natives.len(), "loaded native library");
    Some(natives)
}
