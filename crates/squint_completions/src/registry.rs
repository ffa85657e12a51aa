use std::sync::Arc;

use squint_catalog::{
    CatalogExtension, FunctionKind, MetadataCache, SessionState, TableMeta, contains_suffix,
};
use squint_syntax::CandidateSet;

use crate::item::{CompletionItem, CompletionItemKind};
use crate::relevance;
use crate::sources::TableSourceMap;

/// Expression-only helpers that no catalog extension declares.
const BUILTIN_FUNCTIONS: &[(&str, &str)] = &[
    ("cast", "cast(value AS type)"),
    ("date_add", "date_add(unit, amount, date)"),
    ("date_diff", "date_diff(unit, start, end)"),
    ("date_trunc", "date_trunc(unit, date)"),
    ("now", "now()"),
];

/// A completion family's raw items plus whether some catalog was skipped
/// because its metadata is still loading.
#[derive(Debug, Default)]
pub struct Completions {
    pub items: Vec<CompletionItem>,
    pub partial: bool,
}

/// Expands grammar-level candidates into domain completions by consulting
/// the catalog extensions and the metadata cache. Filtering and ranking
/// against the typed text stay with the caller so UI-level matching can
/// evolve independently.
pub struct CompletionRegistry {
    catalogs: Vec<Arc<dyn CatalogExtension>>,
    cache: Arc<MetadataCache>,
}

impl CompletionRegistry {
    pub fn new(catalogs: Vec<Arc<dyn CatalogExtension>>, cache: Arc<MetadataCache>) -> Self {
        Self { catalogs, cache }
    }

    pub fn catalog_aliases(&self) -> Vec<String> {
        self.catalogs.iter().map(|c| c.alias().to_string()).collect()
    }

    /// Cached table metadata per enabled catalog. Catalogs whose entry is
    /// absent get a load scheduled and are skipped for this request.
    fn cached_tables(&self, session: &SessionState) -> (Vec<(String, Arc<Vec<TableMeta>>)>, bool) {
        let mut cached = Vec::new();
        let mut partial = false;

        for extension in &self.catalogs {
            let Some(provider) = extension.schema_metadata_provider() else {
                continue;
            };
            if !provider.enabled(session) {
                continue;
            }
            let Some(key) = provider.cache_key(session) else {
                // the provider declared itself unready; nothing to wait for
                continue;
            };

            let label = provider.describe(session);
            let session_snapshot = session.clone();
            let fetch_provider = Arc::clone(&provider);
            let loaded = self.cache.compute_if_absent(
                extension.alias(),
                &key,
                provider.ttl(),
                &label,
                move || fetch_provider.fetch_tables(&session_snapshot),
            );
            match loaded {
                Some(tables) => cached.push((extension.alias().to_string(), tables)),
                None => partial = true,
            }
        }

        (cached, partial)
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn table_completions(&self, session: &SessionState) -> Completions {
        let (cached, partial) = self.cached_tables(session);
        let mut items = Vec::new();
        for (catalog, tables) in &cached {
            for table in tables.iter() {
                items.push(CompletionItem {
                    match_parts: table.name_parts.clone(),
                    replacement: table.qualified_name(),
                    insertion: table.name_parts.last().cloned(),
                    description: table
                        .description
                        .clone()
                        .or_else(|| Some(format!("Catalog: {catalog}"))),
                    kind: CompletionItemKind::Table,
                    score: relevance::TABLE,
                });
            }
        }
        Completions { items, partial }
    }

    /// Column completions scoped to the statement's table sources: an
    /// unprefixed source draws candidates from every cached catalog, a
    /// catalog-prefixed one only from its own, and a table is in scope iff
    /// the source's name parts suffix-match its qualified name.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn column_completions(
        &self,
        session: &SessionState,
        sources: &TableSourceMap,
    ) -> Completions {
        let (cached, partial) = self.cached_tables(session);
        let mut items = Vec::new();
        for source in sources.iter() {
            if source.name_parts.is_empty() {
                continue;
            }
            for (catalog, tables) in &cached {
                if !source.catalog_alias.is_empty()
                    && !source.catalog_alias.eq_ignore_ascii_case(catalog)
                {
                    continue;
                }
                for table in tables.iter() {
                    if !contains_suffix(&table.name_parts, &source.name_parts) {
                        continue;
                    }
                    let qualifier = if source.alias.is_empty() {
                        table.name_parts.last().cloned().unwrap_or_default()
                    } else {
                        source.alias.clone()
                    };
                    for column in &table.columns {
                        items.push(CompletionItem {
                            match_parts: vec![qualifier.clone(), column.name.clone()],
                            replacement: format!("{qualifier}.{}", column.name),
                            insertion: Some(column.name.clone()),
                            description: column
                                .description
                                .clone()
                                .or_else(|| Some(format!("Table: {}", table.qualified_name()))),
                            kind: CompletionItemKind::Column,
                            score: relevance::COLUMN,
                        });
                    }
                }
            }
        }
        Completions { items, partial }
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn table_function_completions(&self, session: &SessionState) -> Completions {
        Completions {
            items: self.function_items(session, FunctionKind::Table),
            partial: false,
        }
    }

    /// Scalar functions from every catalog, plus the built-in expression
    /// functions, which are not discoverable through extensions.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn scalar_function_completions(&self, session: &SessionState) -> Completions {
        let mut items = self.function_items(session, FunctionKind::Scalar);
        for (name, signature) in BUILTIN_FUNCTIONS {
            items.push(CompletionItem {
                match_parts: vec![name.to_string()],
                replacement: name.to_string(),
                insertion: None,
                description: Some(signature.to_string()),
                kind: CompletionItemKind::Function,
                score: relevance::BUILTIN_FUNCTION,
            });
        }
        Completions {
            items,
            partial: false,
        }
    }

    fn function_items(&self, session: &SessionState, kind: FunctionKind) -> Vec<CompletionItem> {
        let item_kind = match kind {
            FunctionKind::Scalar => CompletionItemKind::Function,
            FunctionKind::Table => CompletionItemKind::TableFunction,
        };
        let mut items = Vec::new();
        for extension in &self.catalogs {
            for function in extension.functions(session) {
                if function.kind != kind {
                    continue;
                }
                items.push(CompletionItem {
                    match_parts: vec![function.name.clone()],
                    replacement: function.name.clone(),
                    insertion: None,
                    description: function
                        .description
                        .or_else(|| Some(format!("Catalog: {}", extension.alias()))),
                    kind: item_kind,
                    score: relevance::FUNCTION,
                });
            }
        }
        items
    }
}

/// Keyword items for the viable terminals of a candidate set, two-word
/// keywords (`GROUP BY`) rendered with their follow tokens.
pub fn keyword_completions(candidates: &CandidateSet) -> Vec<CompletionItem> {
    let mut items = Vec::new();
    for (kind, follow) in candidates.tokens() {
        let Some(text) = kind.keyword_text() else {
            continue;
        };
        let mut label = text.to_uppercase();
        for follow_kind in follow {
            if let Some(follow_text) = follow_kind.keyword_text() {
                label.push(' ');
                label.push_str(&follow_text.to_uppercase());
            }
        }
        items.push(CompletionItem {
            match_parts: vec![label.clone()],
            replacement: label,
            insertion: None,
            description: None,
            kind: CompletionItemKind::Keyword,
            score: relevance::KEYWORD,
        });
    }
    items
}
