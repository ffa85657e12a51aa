use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionItemKind {
    Table,
    Column,
    Function,
    TableFunction,
    Keyword,
}

impl Display for CompletionItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let txt = match self {
            CompletionItemKind::Table => "Table",
            CompletionItemKind::Column => "Column",
            CompletionItemKind::Function => "Function",
            CompletionItemKind::TableFunction => "Table Function",
            CompletionItemKind::Keyword => "Keyword",
        };

        write!(f, "{txt}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionItem {
    /// Ordered name parts the caller matches against the already-typed text.
    pub match_parts: Vec<String>,
    /// Text replacing the typed identifier chain when the item is accepted.
    pub replacement: String,
    /// Short-form insertion (e.g. the bare column name), when one exists.
    pub insertion: Option<String>,
    pub description: Option<String>,
    /// Icon-hint category for the completion list.
    pub kind: CompletionItemKind,
    /// Relevance; higher ranks first.
    pub score: i32,
}
