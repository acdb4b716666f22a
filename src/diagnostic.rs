use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use yansi::Paint;

use std::fmt;
use std::io;
use std::ops::Range;

/// The phase a diagnostic was raised by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Lex,
    Parse,
    Type,
    Runtime,
}

impl DiagnosticKind {
    fn header(self) -> &'static str {
        match self {
            DiagnosticKind::Lex => "Lex Error",
            DiagnosticKind::Parse => "Parse Error",
            DiagnosticKind::Type => "Type Error",
            DiagnosticKind::Runtime => "Runtime Error",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::Lex => "Lex",
            DiagnosticKind::Parse => "Parse",
            DiagnosticKind::Type => "Type",
            DiagnosticKind::Runtime => "Runtime",
        };
        f.write_str(name)
    }
}

/// A single fault from any phase, located by source line and byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub line: usize,
    pub span: Range<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        line: usize,
        span: Range<usize>,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            kind,
            line,
            span,
            message: message.into(),
        }
    }

    /// Builds an ariadne report whose header reads exactly like the
    /// one-line form: `[Line <n>] <Kind> Error: <message>`. Ariadne paints
    /// the header of a custom kind even with colour off; `render` is the
    /// plain entry point.
    pub fn to_report(
        &self,
        file: &str,
        source_len: usize,
        color: bool,
    ) -> Report<'static, (String, Range<usize>)> {
        let end = self.span.end.min(source_len);
        let start = self.span.start.min(end);
        let span = (file.to_string(), start..end);

        Report::build(ReportKind::Custom(self.kind.header(), Color::Red), span.clone())
            .with_config(Config::default().with_color(color))
            .with_code(format!("Line {}", self.line))
            .with_message(&self.message)
            .with_label(
                Label::new(span)
                    .with_message(self.kind.label())
                    .with_color(Color::Red),
            )
            .finish()
    }

    /// The full report as text. Without colour the header line is the
    /// one-line form and the source snippet carries no escape codes.
    pub fn render(&self, file: &str, source: &str, color: bool) -> io::Result<String> {
        let mut buffer = Vec::new();
        self.to_report(file, source.len(), color).write(
            (file.to_string(), Source::from(source.to_string())),
            &mut buffer,
        )?;
        let rendered = String::from_utf8_lossy(&buffer).into_owned();
        if color {
            return Ok(rendered);
        }
        Ok(match rendered.split_once('\n') {
            Some((_, snippet)) => format!("{}\n{}", self, snippet),
            None => format!("{}\n", self),
        })
    }
}

impl DiagnosticKind {
    fn label(self) -> &'static str {
        match self {
            DiagnosticKind::Lex => "while scanning this",
            DiagnosticKind::Parse => "while parsing this",
            DiagnosticKind::Type => "while checking this",
            DiagnosticKind::Runtime => "while evaluating this",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Line {}] {} Error: {}",
            self.line, self.kind, self.message
        )
    }
}

/// Writes every diagnostic to stderr as an ariadne report. Falls back to the
/// one-line form if the report cannot be rendered.
pub fn report_diagnostics(file: &str, source: &str, diagnostics: &[Diagnostic], color: bool) {
    for diagnostic in diagnostics {
        match diagnostic.render(file, source, color) {
            Ok(report) => eprint!("{}", report),
            Err(error) => {
                tracing::warn!(%error, "could not render report");
                eprintln!("{}", diagnostic.to_string().red());
            }
        }
    }
}
