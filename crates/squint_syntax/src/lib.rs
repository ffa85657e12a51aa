//! Lexer, recovering parser, and completion-candidate collection for the
//! query language. The parser always produces a tree, even for invalid
//! input; completion candidates are computed by replaying the parser against
//! a target token position.

mod candidates;
mod diagnostics;
mod kind;
mod lexer;
mod parser;
mod tree;

pub use candidates::{CandidateSet, PREFERRED_RULES, collect};
pub use diagnostics::SyntaxDiagnostic;
pub use kind::SyntaxKind;
pub use lexer::{Channel, Token, lex};
pub use parser::parse;
pub use tree::{Child, Node, Parse, RuleKind};
