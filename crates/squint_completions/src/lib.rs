//! Context-aware completion for the query language: map a caret offset to a
//! token position, scope table aliases, expand grammar candidates into
//! domain completions via the catalog extensions, then rank what survives
//! the typed-text filter.

mod builder;
mod caret;
mod item;
mod matching;
mod registry;
mod relevance;
mod sources;

pub use builder::CompletionBuilder;
pub use caret::{CaretContext, resolve};
pub use item::{CompletionItem, CompletionItemKind};
pub use matching::match_score;
pub use registry::{CompletionRegistry, Completions, keyword_completions};
pub use sources::{TableSource, TableSourceMap, visit};

/// Upper bound on the items a single completion request returns.
pub const LIMIT: usize = 50;
