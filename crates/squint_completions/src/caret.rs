use squint_syntax::{Parse, RuleKind, SyntaxKind, Token};
use text_size::TextSize;

use crate::sources::TableSourceMap;

/// Where a byte offset lands in the token stream, plus everything candidate
/// collection needs to know about that position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaretContext {
    /// Anchor for candidate collection: an index into the parse's token
    /// vector, or `tokens.len()` for end of input.
    pub token_index: usize,
    /// Rule-based suggestions make no sense here (caret mid-keyword, on an
    /// operator, or right behind a valid alias).
    pub skip_rules: bool,
    /// Stable enclosing rule to fall back to when the tree has errors.
    pub context_rule: Option<RuleKind>,
    /// The identifier chain typed so far, truncated at the caret.
    pub already_typed: String,
}

/// Maps `offset` to a token-stream position.
///
/// The caret counts as *on* a token if the token's span, extended one past
/// its end, contains the offset; a caret inside a hidden-channel run anchors
/// to the following significant token instead. Returns `None` when the
/// document has no significant tokens at all.
pub fn resolve(parse: &Parse, offset: TextSize, sources: &TableSourceMap) -> Option<CaretContext> {
    let tokens = &parse.tokens;
    tokens.iter().find(|t| !t.is_hidden())?;

    let mut on_token = None;
    for (i, token) in tokens.iter().enumerate() {
        if token.is_hidden() {
            continue;
        }
        if token.span.start() < offset && offset <= token.span.end() {
            on_token = Some(i);
            break;
        }
    }

    let (anchor, on) = match on_token {
        Some(i) => (i, true),
        None => (next_significant_at_or_after(tokens, offset), false),
    };

    let mut token_index = anchor;
    let mut skip_rules = false;
    if on {
        let token = &tokens[anchor];
        match token.kind {
            // these offer no candidate set of their own; anchor one further
            SyntaxKind::Comma | SyntaxKind::LParen | SyntaxKind::RParen => {
                token_index = next_significant_after(tokens, anchor);
            }
            kind if kind.is_identifier_like() => {
                // a caret sitting right behind a valid alias must not invite
                // "a new table here" suggestions
                if kind == SyntaxKind::Ident && sources.is_alias(&token.text) {
                    skip_rules = true;
                }
            }
            _ => skip_rules = true,
        }
    }

    let already_typed = if on {
        typed_text(tokens, anchor, offset)
    } else {
        String::new()
    };

    let context_rule = if parse.has_errors() {
        stable_ancestor(parse, offset)
    } else {
        None
    };

    Some(CaretContext {
        token_index,
        skip_rules,
        context_rule,
        already_typed,
    })
}

fn next_significant_at_or_after(tokens: &[Token], offset: TextSize) -> usize {
    tokens
        .iter()
        .position(|t| !t.is_hidden() && t.span.start() >= offset)
        .unwrap_or(tokens.len())
}

fn next_significant_after(tokens: &[Token], index: usize) -> usize {
    tokens
        .iter()
        .enumerate()
        .skip(index + 1)
        .find(|(_, t)| !t.is_hidden())
        .map(|(i, _)| i)
        .unwrap_or(tokens.len())
}

/// Walks backward from the anchor over contiguous identifier-like tokens and
/// returns their text up to the caret.
fn typed_text(tokens: &[Token], anchor: usize, offset: TextSize) -> String {
    if !tokens[anchor].kind.is_identifier_like() {
        return String::new();
    }
    let mut start = anchor;
    while start > 0 {
        let prev = &tokens[start - 1];
        if prev.kind.is_identifier_like() && prev.span.end() == tokens[start].span.start() {
            start -= 1;
        } else {
            break;
        }
    }

    let run_start = tokens[start].span.start();
    let mut text = String::new();
    for token in &tokens[start..=anchor] {
        text.push_str(&token.text);
    }
    let mut keep = usize::from(offset - run_start).min(text.len());
    while keep > 0 && !text.is_char_boundary(keep) {
        keep -= 1;
    }
    text.truncate(keep);
    text
}

/// Smallest enclosing rule from the stable whitelist, used as collection
/// context when the literal token-level context is unreliable after a
/// syntax error.
fn stable_ancestor(parse: &Parse, offset: TextSize) -> Option<RuleKind> {
    let mut best: Option<(RuleKind, TextSize)> = None;
    parse.root.for_each(&mut |node| {
        if !matches!(node.kind(), RuleKind::TableSource | RuleKind::ExprPrimary) {
            return;
        }
        if !node.range().contains_inclusive(offset) {
            return;
        }
        let len = node.range().len();
        if best.is_none_or(|(_, best_len)| len <= best_len) {
            best = Some((node.kind(), len));
        }
    });
    best.map(|(kind, _)| kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::visit;
    use squint_syntax::parse;
    use squint_test_utils::InputQuery;

    fn resolve_marked(input: &str) -> Option<CaretContext> {
        let query = InputQuery::from(input);
        let parsed = parse(&query.sql);
        let sources = parsed
            .statements()
            .next()
            .map(|stmt| visit(stmt, &parsed, &[]))
            .unwrap_or_default();
        resolve(&parsed, query.offset(), &sources)
    }

    #[test]
    fn empty_document_has_no_location() {
        assert!(resolve_marked("€").is_none());
        assert!(resolve_marked("   €  ").is_none());
    }

    #[test]
    fn end_of_document_anchors_past_the_last_token() {
        let ctx = resolve_marked("select * from €").unwrap();
        assert!(!ctx.skip_rules);
        assert_eq!(ctx.already_typed, "");
        // anchor is the EOF sentinel
        let parsed = parse("select * from ");
        assert_eq!(ctx.token_index, parsed.tokens.len());
    }

    #[test]
    fn caret_after_a_dot_keeps_the_chain_as_typed_text() {
        let ctx = resolve_marked("select a.€ from tbl a").unwrap();
        assert_eq!(ctx.already_typed, "a.");
        assert!(!ctx.skip_rules);
    }

    #[test]
    fn caret_inside_an_identifier_truncates_at_the_caret() {
        let ctx = resolve_marked("select a.nar€rator from tbl a").unwrap();
        assert_eq!(ctx.already_typed, "a.nar");
    }

    #[test]
    fn caret_on_an_alias_suppresses_rules() {
        let ctx = resolve_marked("select * from tbl a€").unwrap();
        assert!(ctx.skip_rules);
    }

    #[test]
    fn caret_mid_keyword_suppresses_rules() {
        let ctx = resolve_marked("select * fro€m tbl").unwrap();
        assert!(ctx.skip_rules);
        assert_eq!(ctx.already_typed, "");
    }

    #[test]
    fn caret_on_a_comma_advances_to_the_next_token() {
        let input = "select a,€ b from tbl";
        let ctx = resolve_marked(input).unwrap();
        let parsed = parse(&input.replace('€', ""));
        let b_index = parsed
            .tokens
            .iter()
            .position(|t| t.text == "b")
            .unwrap();
        assert_eq!(ctx.token_index, b_index);
        assert_eq!(ctx.already_typed, "");
        assert!(!ctx.skip_rules);
    }

    #[test]
    fn caret_in_whitespace_anchors_to_the_following_token() {
        let input = "select a €from tbl";
        let ctx = resolve_marked(input).unwrap();
        let parsed = parse(&input.replace('€', ""));
        let from_index = parsed
            .tokens
            .iter()
            .position(|t| t.kind == SyntaxKind::From)
            .unwrap();
        assert_eq!(ctx.token_index, from_index);
        assert_eq!(ctx.already_typed, "");
        assert!(!ctx.skip_rules);
    }

    #[test]
    fn errors_surface_a_stable_context_rule() {
        // `fro` is swallowed as an alias, leaving the statement in recovery;
        // the expression primary around `a.` is the stable context
        let ctx = resolve_marked("select a.€ fro tbl").unwrap();
        assert!(ctx.context_rule.is_some());
    }

    #[test]
    fn clean_parses_carry_no_context_rule() {
        let ctx = resolve_marked("select a.€ from tbl a").unwrap();
        assert_eq!(ctx.context_rule, None);
    }
}
