pub mod ast;
pub mod config;
pub mod diagnostic;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod stdlib;
pub mod typechecker;


use crate::config::Config;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::interpreter::{Interpreter, Value};
use crate::parser::Parser;
use crate::stdlib::Host;

/// Exit status for lex, parse or type diagnostics.
pub const EXIT_DIAGNOSTICS: i32 = 65;
/// Exit status for a runtime error.
pub const EXIT_RUNTIME: i32 = 70;
/// Exit status for an unreadable script.
pub const EXIT_IO: i32 = 74;

/// What one run of the pipeline produced.
#[derive(Debug)]
pub struct RunOutcome {
    /// Every diagnostic in the order the phases raised them.
    pub diagnostics: Vec<Diagnostic>,
    /// Value of the program, present only when evaluation completed.
    pub value: Option<Value>,
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        let runtime = self
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::Runtime);
        match (self.diagnostics.is_empty(), runtime) {
            (true, _) => 0,
            (false, true) => EXIT_RUNTIME,
            (false, false) => EXIT_DIAGNOSTICS,
        }
    }
}

/// Scans, parses, checks and evaluates `source`.
///
/// Parsing always runs; the type check only runs on a program that scanned
/// and parsed cleanly, and evaluation only on one that also type-checked.
#[tracing::instrument(level = "debug", skip_all, fields(bytes = source.len()))]
pub fn run_source(source: &str, config: &Config, host: Host) -> RunOutcome {
    let (tokens, mut diagnostics) = lexer::scan(source);

    let mut parser = Parser::new(tokens);
    let program = parser.parse_program();
    diagnostics.extend(parser.into_errors());
    if !diagnostics.is_empty() {
        return RunOutcome {
            diagnostics,
            value: None,
        };
    }

    if let Err(errors) = typechecker::check(&program) {
        return RunOutcome {
            diagnostics: errors,
            value: None,
        };
    }

    let mut interpreter = Interpreter::new(host, config.clone());
    match interpreter.run_program(&program) {
        Ok(value) => RunOutcome {
            diagnostics,
            value: Some(value),
        },
        Err(error) => {
            tracing::debug!(%error, "runtime error");
            diagnostics.push(error.into_diagnostic());
            RunOutcome {
                diagnostics,
                value: None,
            }
        }
    }
}
