use squint_syntax::{Parse, RuleKind, SyntaxKind};
use text_size::TextRange;

/// Advisory warning from the static pass over the tree. Never blocks
/// further processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintDiagnostic {
    pub message: String,
    pub span: TextRange,
}

/// Single read-only traversal emitting the static lints, in discovery
/// order:
/// - a `=`/`!=`/`<>` comparison with the literal null on either side is
///   always false;
/// - a comparison with the same expression on both sides is suspicious.
pub(crate) fn run(parse: &Parse, text: &str) -> Vec<LintDiagnostic> {
    let mut lints = Vec::new();
    parse.root.for_each(&mut |node| {
        if node.kind() != RuleKind::Comparison {
            return;
        }
        let Some(op) = node
            .token_indices()
            .find(|i| matches!(parse.tokens[*i].kind, SyntaxKind::Eq | SyntaxKind::Neq))
        else {
            return;
        };
        let op_span = parse.tokens[op].span;
        let range = node.range();
        let left = text[usize::from(range.start())..usize::from(op_span.start())].trim();
        let right = text[usize::from(op_span.end())..usize::from(range.end())].trim();

        if left.eq_ignore_ascii_case("null") || right.eq_ignore_ascii_case("null") {
            lints.push(LintDiagnostic {
                message: "Comparison is always false".into(),
                span: range,
            });
        } else if !left.is_empty() && left == right {
            lints.push(LintDiagnostic {
                message: "Same expression on both sides".into(),
                span: range,
            });
        }
    });
    lints
}
