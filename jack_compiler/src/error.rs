use std::fmt;

/// A single failure while compiling a Jack file. The compiler has no error
/// recovery (spec.md §1 Non-goals): the first mismatch aborts the file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// Ran out of tokens while a production still expected one.
    UnexpectedEof,
    /// The current token didn't match any of the expected alternatives.
    Expected { expected: Vec<String>, found: String },
    /// An identifier was referenced that isn't in either symbol table.
    UnresolvedSymbol(String),
    /// A character outside the Jack token grammar was encountered.
    BadToken(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::UnexpectedEof => write!(f, "unexpected end of input"),
            ParseError::Expected { expected, found } => write!(
                f,
                "expected one of {:?}, found \"{}\"",
                expected, found
            ),
            ParseError::UnresolvedSymbol(name) => write!(f, "unresolved symbol \"{}\"", name),
            ParseError::BadToken(token) => write!(f, "invalid token \"{}\"", token),
        }
    }
}

impl std::error::Error for ParseError {}

/// Top-level error for a Jack compilation run, carrying the source file and
/// a best-effort token position.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Error {
    pub file: String,
    pub source: ParseError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.file, self.source)
    }
}

impl std::error::Error for Error {}
