//! Editor-embedded query intelligence: parse the current document with
//! error recovery, emit diagnostics, and compute context-aware completions
//! at a caret offset through pluggable catalog extensions.
//!
//! One [`Engine`] serves one document. All tree-derived work runs
//! synchronously on the caller's thread; only metadata loading is
//! asynchronous, behind the injected [`MetadataCache`].

mod diagnostics;
mod directives;
mod document;
mod lints;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use squint_completions::{
    CompletionBuilder, CompletionRegistry, keyword_completions, resolve, visit,
};
use squint_syntax::{Node, Parse, RuleKind, SyntaxKind, collect};

pub use diagnostics::{Diagnostic, Severity};
pub use directives::Directive;
pub use document::DocumentAnalyzer;
pub use squint_catalog::{
    CatalogExtension, EventBus, MetadataCache, NoopEventBus, SessionState, TaskEvent,
};
pub use squint_completions::{CompletionItem, CompletionItemKind};
pub use text_size::{TextRange, TextSize};

use crate::document::Analysis;

#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionResult {
    pub items: Vec<CompletionItem>,
    /// True when at least one catalog was skipped because its metadata is
    /// still loading in the background.
    pub partial: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResult {
    /// Diagnostics in discovery order, not necessarily position order.
    pub diagnostics: Vec<Diagnostic>,
    /// Present iff an offset was passed to [`Engine::analyze`].
    pub completions: Option<CompletionResult>,
}

/// The engine behind one query document.
///
/// Not reentrant: callers serialize requests per document. Across requests
/// there is no ordering guarantee; a request that triggered a slow metadata
/// load simply comes back partial while a later one may hit a warm cache.
pub struct Engine {
    analyzer: DocumentAnalyzer,
    session: SessionState,
    registry: CompletionRegistry,
}

impl Engine {
    pub fn new(catalogs: Vec<Arc<dyn CatalogExtension>>, cache: Arc<MetadataCache>) -> Self {
        Self {
            analyzer: DocumentAnalyzer::new(""),
            session: SessionState::default(),
            registry: CompletionRegistry::new(catalogs, cache),
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.analyzer.set_text(text);
    }

    /// Replace-range text change; inserts and removals are the degenerate
    /// cases. Marks the document dirty.
    pub fn apply_change(&mut self, range: TextRange, new_text: &str) {
        self.analyzer.apply_change(range, new_text);
    }

    pub fn text(&self) -> &str {
        self.analyzer.text()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    /// Reparses of this document so far. Unchanged between two `analyze`
    /// calls without an intervening text mutation.
    pub fn parse_generation(&self) -> u64 {
        self.analyzer.generation()
    }

    /// Validates the document and, when `offset` is given, completes at it.
    ///
    /// Reparses only when dirty. Inline `use` directives are applied to the
    /// session before completion expansion, so providers observe up-to-date
    /// configuration. Never fails: malformed input degrades to diagnostics
    /// plus empty or partial completions.
    #[tracing::instrument(level = "debug", skip(self), fields(offset = offset.map(u32::from)))]
    pub fn analyze(&mut self, offset: Option<TextSize>) -> AnalyzeResult {
        self.analyzer.ensure_analyzed();
        let analysis = self.analyzer.analysis();

        for directive in &analysis.directives {
            self.session
                .set_catalog_property(&directive.catalog, &directive.property, directive.value.clone());
        }

        let text = self.analyzer.text();
        let mut diagnostics = Vec::with_capacity(analysis.parse.errors.len() + analysis.lints.len());
        for error in &analysis.parse.errors {
            diagnostics.push(Diagnostic::from_span(
                text,
                error.message.clone(),
                Severity::Error,
                error.span,
            ));
        }
        for lint in &analysis.lints {
            diagnostics.push(Diagnostic::from_span(
                text,
                lint.message.clone(),
                Severity::Warning,
                Some(lint.span),
            ));
        }

        let completions =
            offset.map(|offset| complete_at(&self.registry, &self.session, analysis, offset));

        AnalyzeResult {
            diagnostics,
            completions,
        }
    }
}

fn complete_at(
    registry: &CompletionRegistry,
    session: &SessionState,
    analysis: &Analysis,
    offset: TextSize,
) -> CompletionResult {
    let parse = &analysis.parse;
    let catalog_aliases = registry.catalog_aliases();

    let sources = statement_for_offset(parse, offset)
        .map(|stmt| visit(stmt, parse, &catalog_aliases))
        .unwrap_or_default();

    let Some(caret) = resolve(parse, offset, &sources) else {
        return CompletionResult {
            items: Vec::new(),
            partial: false,
        };
    };

    let candidates = collect(parse, caret.token_index, caret.context_rule);

    let mut partial = false;
    let mut builder = CompletionBuilder::new(&caret.already_typed);
    if !caret.skip_rules {
        if candidates.has_rule(RuleKind::TableSource) {
            let tables = registry.table_completions(session);
            partial |= tables.partial;
            builder.add_items(tables.items);

            let functions = registry.table_function_completions(session);
            partial |= functions.partial;
            builder.add_items(functions.items);
        }
        if candidates.has_rule(RuleKind::ExprPrimary) {
            let columns = registry.column_completions(session, &sources);
            partial |= columns.partial;
            builder.add_items(columns.items);

            let functions = registry.scalar_function_completions(session);
            partial |= functions.partial;
            builder.add_items(functions.items);
        }
    }
    builder.add_items(keyword_completions(&candidates));

    CompletionResult {
        items: builder.finish(),
        partial,
    }
}

/// The smallest statement owning `offset`. A trailing caret still belongs to
/// the preceding statement while no semicolon closed it and no further
/// statement started.
fn statement_for_offset(parse: &Parse, offset: TextSize) -> Option<&Node> {
    let statements: Vec<&Node> = parse.statements().collect();
    for (i, &stmt) in statements.iter().enumerate() {
        let range = stmt.range();
        if range.contains_inclusive(offset) {
            return Some(stmt);
        }
        if offset > range.end() {
            let before_next = statements
                .get(i + 1)
                .is_none_or(|next| offset < next.range().start());
            if before_next && !semicolon_between(parse, range.end(), offset) {
                return Some(stmt);
            }
        }
    }
    None
}

fn semicolon_between(parse: &Parse, from: TextSize, to: TextSize) -> bool {
    parse.tokens.iter().any(|t| {
        t.kind == SyntaxKind::Semicolon && t.span.start() >= from && t.span.end() <= to
    })
}
