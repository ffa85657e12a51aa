use text_size::TextRange;

/// A recoverable syntax problem found while lexing or parsing.
///
/// `span` is `None` when no position is determinable (e.g. an error reported
/// at end of input).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxDiagnostic {
    pub message: String,
    pub span: Option<TextRange>,
}

impl SyntaxDiagnostic {
    pub fn new(message: impl Into<String>, span: TextRange) -> Self {
        Self {
            message: message.into(),
            span: Some(span),
        }
    }

    pub fn without_position(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }
}
