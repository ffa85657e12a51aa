use text_size::TextRange;

use crate::SyntaxKind;
use crate::diagnostics::SyntaxDiagnostic;
use crate::lexer::Token;

/// Grammar productions materialized in the parse tree.
///
/// Only the productions the engine actually inspects get a node; everything
/// else (precedence layers, clause keywords) flows into the nearest enclosing
/// node as plain tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Document,
    SelectStmt,
    UseStmt,
    SelectItem,
    TableSource,
    QualifiedName,
    ExprPrimary,
    Comparison,
    Literal,
}

#[derive(Debug)]
pub enum Child {
    Node(Node),
    /// Index into the parse's token vector.
    Token(usize),
}

#[derive(Debug)]
pub struct Node {
    pub(crate) kind: RuleKind,
    pub(crate) range: TextRange,
    pub(crate) children: Vec<Child>,
}

impl Node {
    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    pub fn child_nodes(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(|c| match c {
            Child::Node(n) => Some(n),
            Child::Token(_) => None,
        })
    }

    pub fn token_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.children.iter().filter_map(|c| match c {
            Child::Token(i) => Some(*i),
            Child::Node(_) => None,
        })
    }

    pub fn first_node(&self, kind: RuleKind) -> Option<&Node> {
        self.child_nodes().find(|n| n.kind == kind)
    }

    /// Pre-order traversal over this node and all descendants.
    pub fn for_each(&self, f: &mut impl FnMut(&Node)) {
        f(self);
        for child in self.child_nodes() {
            child.for_each(f);
        }
    }

    /// Splits a `QualifiedName` node's tokens into its dot-separated parts,
    /// unquoting quoted identifiers. A trailing dot contributes no part.
    pub fn qualified_name_parts(&self, tokens: &[Token]) -> Vec<String> {
        let mut parts = Vec::new();
        let mut current = String::new();
        for idx in self.token_indices() {
            let token = &tokens[idx];
            match token.kind {
                SyntaxKind::Dot => parts.push(std::mem::take(&mut current)),
                SyntaxKind::QuotedIdent => current.push_str(&unquote_ident(&token.text)),
                _ => current.push_str(&token.text),
            }
        }
        if !current.is_empty() {
            parts.push(current);
        }
        parts
    }
}

fn unquote_ident(text: &str) -> String {
    let inner = text.strip_prefix('"').unwrap_or(text);
    let inner = inner.strip_suffix('"').unwrap_or(inner);
    inner.replace("\"\"", "\"")
}

/// The result of one parse pass: the token stream (hidden channel included),
/// the tree, and every diagnostic discovered along the way.
///
/// The tree is rebuilt wholesale on every reparse; holding on to it across
/// reparses is a caller bug.
#[derive(Debug)]
pub struct Parse {
    pub tokens: Vec<Token>,
    pub root: Node,
    pub errors: Vec<SyntaxDiagnostic>,
}

impl Parse {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The top-level statement nodes, in document order.
    pub fn statements(&self) -> impl Iterator<Item = &Node> {
        self.root.child_nodes()
    }
}
