use squint_syntax::{Child, Node, Parse, RuleKind, SyntaxKind};

/// An inline `use <catalog>.<property> = <literal>` session directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub catalog: String,
    pub property: String,
    pub value: String,
}

/// Collects the honored directives of the document, in order. Only
/// literal-valued directives qualify; expression-valued ones are ignored.
pub(crate) fn extract_directives(parse: &Parse) -> Vec<Directive> {
    let mut directives = Vec::new();
    for stmt in parse.statements() {
        if stmt.kind() != RuleKind::UseStmt {
            continue;
        }
        let Some(name) = stmt.first_node(RuleKind::QualifiedName) else {
            continue;
        };
        let parts = name.qualified_name_parts(&parse.tokens);
        if parts.len() < 2 {
            continue;
        }
        let Some(value) = literal_value(stmt, parse) else {
            continue;
        };
        directives.push(Directive {
            catalog: parts[0].to_lowercase(),
            property: parts[1..].join(".").to_lowercase(),
            value,
        });
    }
    directives
}

/// The directive's right-hand side, provided it is exactly one literal.
fn literal_value(stmt: &Node, parse: &Parse) -> Option<String> {
    let mut after_eq = false;
    let mut literal: Option<&Node> = None;
    for child in stmt.children() {
        match child {
            Child::Token(i) => {
                let kind = parse.tokens[*i].kind;
                if after_eq {
                    // operators or extra tokens make this an expression
                    return None;
                }
                if kind == SyntaxKind::Eq {
                    after_eq = true;
                }
            }
            Child::Node(node) => {
                if !after_eq {
                    continue;
                }
                if node.kind() == RuleKind::Literal && literal.is_none() {
                    literal = Some(node);
                } else {
                    return None;
                }
            }
        }
    }

    let literal = literal?;
    let index = literal.token_indices().next()?;
    let token = &parse.tokens[index];
    Some(match token.kind {
        SyntaxKind::StringLit => unquote_string(&token.text),
        _ => token.text.clone(),
    })
}

fn unquote_string(text: &str) -> String {
    let inner = text.strip_prefix('\'').unwrap_or(text);
    let inner = inner.strip_suffix('\'').unwrap_or(inner);
    inner.replace("''", "'")
}
