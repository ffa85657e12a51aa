use squint_syntax::{Parse, parse};
use text_size::TextRange;

use crate::directives::{Directive, extract_directives};
use crate::lints::{self, LintDiagnostic};

/// Everything derived from one parse pass. Rebuilt wholesale on reparse;
/// nothing here survives a text change.
pub(crate) struct Analysis {
    pub(crate) parse: Parse,
    pub(crate) lints: Vec<LintDiagnostic>,
    pub(crate) directives: Vec<Directive>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocState {
    Clean,
    Dirty,
}

/// Owns the document text and the reparse-on-dirty state machine.
///
/// Any text mutation moves the state to Dirty; [`ensure_analyzed`] moves it
/// back to Clean, bumping the parse generation exactly when a reparse
/// happened. Not reentrant: one analyzer must not be driven from two
/// threads.
///
/// [`ensure_analyzed`]: DocumentAnalyzer::ensure_analyzed
pub struct DocumentAnalyzer {
    text: String,
    state: DocState,
    generation: u64,
    analysis: Option<Analysis>,
}

impl DocumentAnalyzer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            state: DocState::Dirty,
            generation: 0,
            analysis: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.state = DocState::Dirty;
    }

    /// Replaces `range` with `new_text`. Inserts and removals are the
    /// degenerate cases (empty range / empty text).
    pub fn apply_change(&mut self, range: TextRange, new_text: &str) {
        let start = usize::from(range.start()).min(self.text.len());
        let end = usize::from(range.end()).clamp(start, self.text.len());
        self.text.replace_range(start..end, new_text);
        self.state = DocState::Dirty;
    }

    pub fn is_dirty(&self) -> bool {
        self.state == DocState::Dirty
    }

    /// Monotonic counter of reparses, for observing (the absence of)
    /// re-analysis.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[tracing::instrument(level = "debug", skip(self), fields(dirty = self.is_dirty()))]
    pub(crate) fn ensure_analyzed(&mut self) {
        if self.state == DocState::Clean && self.analysis.is_some() {
            return;
        }
        let parsed = parse(&self.text);
        let lints = lints::run(&parsed, &self.text);
        let directives = extract_directives(&parsed);
        self.analysis = Some(Analysis {
            parse: parsed,
            lints,
            directives,
        });
        self.generation += 1;
        self.state = DocState::Clean;
    }

    pub(crate) fn analysis(&self) -> &Analysis {
        self.analysis
            .as_ref()
            .expect("ensure_analyzed must run before analysis is read")
    }
}
