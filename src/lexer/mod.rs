use logos::Logos;

use crate::diagnostic::{Diagnostic, DiagnosticKind};

use std::fmt;
use std::ops::Range;

#[cfg(test)]
pub mod test;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum LexError {
    #[default]
    UnexpectedCharacter,
    IntegerOutOfRange,
    InvalidFloat,
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(error = LexError)]
pub enum TokenKind {
    // literals
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().map_err(|_| LexError::IntegerOutOfRange))]
    Int(i64),

    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().map_err(|_| LexError::InvalidFloat))]
    Float(f64),

    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    String(String),

    // a string that never found its closing quote
    #[regex(r#""[^"]*"#)]
    UnterminatedString,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // operators
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("::")]
    DoubleColon,
    #[token("->")]
    Arrow,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
    #[token("!=")]
    BangEqual,
    #[token("=")]
    Assign,
    #[token("==")]
    EqualEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,

    // keywords
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("nil")]
    Nil,
    #[token("if")]
    KeywordIf,
    #[token("else")]
    KeywordElse,
    #[token("while")]
    KeywordWhile,
    #[token("for")]
    KeywordFor,
    #[token("return")]
    KeywordReturn,
    #[token("class")]
    KeywordClass,
    #[token("new")]
    KeywordNew,
    #[token("import")]
    KeywordImport,

    // type names
    #[token("int")]
    TypeInt,
    #[token("float")]
    TypeFloat,
    #[token("string")]
    TypeString,
    #[token("bool")]
    TypeBool,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(i) => write!(f, "integer '{}'", i),
            TokenKind::Float(x) => write!(f, "float '{}'", x),
            TokenKind::String(s) => write!(f, "string \"{}\"", s),
            TokenKind::UnterminatedString => write!(f, "unterminated string"),
            TokenKind::Identifier(name) => write!(f, "identifier '{}'", name),
            TokenKind::Eof => write!(f, "end of file"),
            other => write!(f, "'{}'", other.symbol()),
        }
    }
}

impl TokenKind {
    /// Fixed spelling of operator, keyword and type-name tokens.
    pub fn symbol(&self) -> &'static str {
        match self {
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::DoubleColon => "::",
            TokenKind::Arrow => "->",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Bang => "!",
            TokenKind::BangEqual => "!=",
            TokenKind::Assign => "=",
            TokenKind::EqualEqual => "==",
            TokenKind::Less => "<",
            TokenKind::LessEqual => "<=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEqual => ">=",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Nil => "nil",
            TokenKind::KeywordIf => "if",
            TokenKind::KeywordElse => "else",
            TokenKind::KeywordWhile => "while",
            TokenKind::KeywordFor => "for",
            TokenKind::KeywordReturn => "return",
            TokenKind::KeywordClass => "class",
            TokenKind::KeywordNew => "new",
            TokenKind::KeywordImport => "import",
            TokenKind::TypeInt => "int",
            TokenKind::TypeFloat => "float",
            TokenKind::TypeString => "string",
            TokenKind::TypeBool => "bool",
            TokenKind::Int(_)
            | TokenKind::Float(_)
            | TokenKind::String(_)
            | TokenKind::UnterminatedString
            | TokenKind::Identifier(_) => "<literal>",
            TokenKind::Eof => "<eof>",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub span: Range<usize>,
}

/// Maps byte offsets to 1-based line numbers.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        LineIndex { line_starts }
    }

    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }
}

/// Scans the whole source. The token list always ends with an `Eof` token;
/// lexical faults are collected and scanning carries on to the end.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn scan(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    let lines = LineIndex::new(source);
    let mut tokens = vec![];
    let mut diagnostics = vec![];
    let mut lexer = TokenKind::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let line = lines.line_of(span.start);
        let lexeme = lexer.slice();
        match result {
            Ok(TokenKind::UnterminatedString) => diagnostics.push(Diagnostic::new(
                DiagnosticKind::Lex,
                line,
                span,
                "unterminated string",
            )),
            Ok(kind) => tokens.push(Token {
                kind,
                lexeme: lexeme.to_string(),
                line,
                span,
            }),
            Err(error) => {
                let message = match error {
                    LexError::UnexpectedCharacter => {
                        format!("unexpected character '{}'", lexeme)
                    }
                    LexError::IntegerOutOfRange => {
                        format!("integer literal '{}' is out of range", lexeme)
                    }
                    LexError::InvalidFloat => format!("invalid float literal '{}'", lexeme),
                };
                diagnostics.push(Diagnostic::new(DiagnosticKind::Lex, line, span, message));
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        lexeme: String::new(),
        line: lines.line_of(source.len()),
        span: source.len()..source.len(),
    });
    tracing::debug!(
        tokens = tokens.len(),
        errors = diagnostics.len(),
        "scan finished"
    );
    (tokens, diagnostics)
}
