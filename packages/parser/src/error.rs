use arbor_model::StructuralError;
use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

/// Malformed wire text
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token at {pos}: expected {expected}, found {found}")]
    UnexpectedToken {
        pos: usize,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of file at {pos}")]
    UnexpectedEof { pos: usize },

    #[error("Invalid syntax at {pos}: {message}")]
    InvalidSyntax { pos: usize, message: String },

    #[error("Lexer error at {pos}")]
    LexerError { pos: usize },

    #[error("Unsupported format version at {pos}: {found}")]
    UnsupportedFormat { pos: usize, found: String },

    #[error("Duplicate attribute '{name}' at {pos}")]
    DuplicateAttribute { pos: usize, name: String },

    #[error("Duplicate tree ID '{id}' at {pos}")]
    DuplicateTree { pos: usize, id: String },
}

impl ParseError {
    pub fn unexpected_token(pos: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            pos,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_eof(pos: usize) -> Self {
        Self::UnexpectedEof { pos }
    }

    pub fn invalid_syntax(pos: usize, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            pos,
            message: message.into(),
        }
    }

    pub fn lexer_error(pos: usize) -> Self {
        Self::LexerError { pos }
    }

    /// Byte offset the error points at
    pub fn pos(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { pos, .. }
            | ParseError::UnexpectedEof { pos }
            | ParseError::InvalidSyntax { pos, .. }
            | ParseError::LexerError { pos }
            | ParseError::UnsupportedFormat { pos, .. }
            | ParseError::DuplicateAttribute { pos, .. }
            | ParseError::DuplicateTree { pos, .. } => *pos,
        }
    }
}

/// Failure to decode a document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Component '{component}' is malformed: {source}")]
    Structural {
        component: String,
        source: StructuralError,
    },
}

impl CodecError {
    pub fn structural(component: impl Into<String>, source: StructuralError) -> Self {
        Self::Structural {
            component: component.into(),
            source,
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, CodecError::Structural { .. })
    }
}

/// Pretty-print a parse error with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub fn format_error(source: &str, filename: &str, error: &ParseError) -> String {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let span = char_span(source, error.pos());

    let label = match error {
        ParseError::UnexpectedToken { expected, .. } => format!("expected {}", expected),
        ParseError::UnexpectedEof { .. } => "input ends here".to_string(),
        ParseError::InvalidSyntax { message, .. } => message.clone(),
        ParseError::LexerError { .. } => "unrecognized input".to_string(),
        ParseError::UnsupportedFormat { found, .. } => format!("format '{}' is not supported", found),
        ParseError::DuplicateAttribute { name, .. } => format!("'{}' is already set", name),
        ParseError::DuplicateTree { id, .. } => format!("'{}' is already defined", id),
    };

    let mut output = Vec::new();
    let written = Report::build(ReportKind::Error, filename, span.start)
        .with_message(error.to_string())
        .with_label(
            Label::new((filename, span))
                .with_color(Color::Red)
                .with_message(label),
        )
        .finish()
        .write((filename, Source::from(source)), &mut output);

    match written {
        Ok(()) => String::from_utf8(output).unwrap_or_else(|_| error.to_string()),
        Err(_) => error.to_string(),
    }
}

/// One-character span at a byte position. ariadne indexes by character.
#[cfg(feature = "pretty-errors")]
fn char_span(source: &str, pos: usize) -> std::ops::Range<usize> {
    let mut byte = pos.min(source.len());
    while !source.is_char_boundary(byte) {
        byte -= 1;
    }
    let total = source.chars().count();
    let start = source[..byte].chars().count().min(total.saturating_sub(1));
    start..(start + 1).min(total)
}
