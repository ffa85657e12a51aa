use serde::{Deserialize, Serialize};
use text_size::TextRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    /// Squiggle color for the editor.
    pub fn color_hint(self) -> &'static str {
        match self {
            Severity::Error => "#e45649",
            Severity::Warning => "#c18401",
        }
    }
}

/// One renderable diagnostic.
///
/// `line` is 0-based; `start` is the byte offset of the diagnostic, or -1
/// when no position is determinable; `length` is -1 for unknown/whole-line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    pub severity: Severity,
    pub line: u32,
    pub start: i32,
    pub length: i32,
}

impl Diagnostic {
    pub(crate) fn from_span(
        text: &str,
        message: String,
        severity: Severity,
        span: Option<TextRange>,
    ) -> Self {
        match span {
            Some(span) => {
                let start = usize::from(span.start()).min(text.len());
                let line = text[..start].bytes().filter(|b| *b == b'\n').count() as u32;
                Diagnostic {
                    message,
                    severity,
                    line,
                    start: start as i32,
                    length: (usize::from(span.len()) as i32).max(1),
                }
            }
            None => Diagnostic {
                message,
                severity,
                line: 0,
                start: -1,
                length: 1,
            },
        }
    }

    pub fn color_hint(&self) -> &'static str {
        self.severity.color_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_is_zero_based() {
        let text = "select 1;\nselect 2;";
        let d = Diagnostic::from_span(
            text,
            "boom".into(),
            Severity::Error,
            Some(TextRange::new(12.into(), 18.into())),
        );
        assert_eq!(d.line, 1);
        assert_eq!(d.start, 12);
        assert_eq!(d.length, 6);
    }

    #[test]
    fn missing_position_uses_the_sentinels() {
        let d = Diagnostic::from_span("", "boom".into(), Severity::Error, None);
        assert_eq!(d.start, -1);
        assert_eq!(d.length, 1);
    }

    #[test]
    fn severity_maps_to_a_color() {
        assert_ne!(
            Severity::Error.color_hint(),
            Severity::Warning.color_hint()
        );
    }
}
