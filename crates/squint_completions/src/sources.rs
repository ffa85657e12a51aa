use rustc_hash::FxHashMap;
use squint_syntax::{Node, Parse, RuleKind, SyntaxKind};

/// One table-source binding inside a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSource {
    /// Lower-cased alias, or "" when the source is unaliased.
    pub alias: String,
    /// Lower-cased catalog alias, or "" when the name carries none.
    pub catalog_alias: String,
    /// Qualified name parts, catalog prefix stripped.
    pub name_parts: Vec<String>,
    pub is_function: bool,
}

/// Alias → table-source bindings for one statement. Last writer wins on
/// collisions.
#[derive(Debug, Default)]
pub struct TableSourceMap {
    by_alias: FxHashMap<String, TableSource>,
}

impl TableSourceMap {
    pub fn insert(&mut self, source: TableSource) {
        self.by_alias.insert(source.alias.clone(), source);
    }

    pub fn get(&self, alias: &str) -> Option<&TableSource> {
        self.by_alias.get(&alias.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableSource> {
        self.by_alias.values()
    }

    pub fn is_alias(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        !text.is_empty() && self.by_alias.contains_key(&text)
    }

    pub fn len(&self) -> usize {
        self.by_alias.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_alias.is_empty()
    }
}

/// Extracts the table sources of the given statement node.
///
/// Scope is the statement itself: nested sub-selects are not entered, so
/// sub-query scopes, derived scans, and lambda-bound names never contribute
/// bindings (a known limitation, not a guess). A leading qualified-name part
/// is treated as a catalog alias only when it names a registered catalog.
pub fn visit(statement: &Node, parse: &Parse, catalog_aliases: &[String]) -> TableSourceMap {
    let mut map = TableSourceMap::default();
    walk(statement, parse, catalog_aliases, &mut map, true);
    map
}

fn walk(
    node: &Node,
    parse: &Parse,
    catalog_aliases: &[String],
    map: &mut TableSourceMap,
    is_root: bool,
) {
    if !is_root && node.kind() == RuleKind::SelectStmt {
        return;
    }
    if node.kind() == RuleKind::TableSource {
        if let Some(source) = table_source_of(node, parse, catalog_aliases) {
            map.insert(source);
        }
        return;
    }
    for child in node.child_nodes() {
        walk(child, parse, catalog_aliases, map, false);
    }
}

fn table_source_of(node: &Node, parse: &Parse, catalog_aliases: &[String]) -> Option<TableSource> {
    let name = node.first_node(RuleKind::QualifiedName)?;
    let mut parts = name.qualified_name_parts(&parse.tokens);
    if parts.is_empty() {
        return None;
    }

    let mut is_function = false;
    let mut alias = String::new();
    for idx in node.token_indices() {
        let token = &parse.tokens[idx];
        match token.kind {
            SyntaxKind::LParen => is_function = true,
            SyntaxKind::Ident | SyntaxKind::QuotedIdent => alias = normalize_ident(&token.text),
            kind if kind.is_keyword() && !kind.is_reserved() => {
                alias = normalize_ident(&token.text)
            }
            _ => {}
        }
    }

    let mut catalog_alias = String::new();
    if parts.len() > 1
        && catalog_aliases
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&parts[0]))
    {
        catalog_alias = parts.remove(0).to_lowercase();
    }

    Some(TableSource {
        alias,
        catalog_alias,
        name_parts: parts,
        is_function,
    })
}

fn normalize_ident(text: &str) -> String {
    let inner = text.strip_prefix('"').unwrap_or(text);
    let inner = inner.strip_suffix('"').unwrap_or(inner);
    inner.replace("\"\"", "\"").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use squint_syntax::parse;

    fn sources_of(sql: &str, catalogs: &[&str]) -> TableSourceMap {
        let parsed = parse(sql);
        let stmt = parsed.statements().next().expect("no statement");
        let catalogs: Vec<String> = catalogs.iter().map(|c| c.to_string()).collect();
        visit(stmt, &parsed, &catalogs)
    }

    #[test]
    fn records_aliased_and_unaliased_sources() {
        let map = sources_of("select * from sys.objects o, names", &[]);
        assert_eq!(map.len(), 2);

        let o = map.get("o").unwrap();
        assert_eq!(o.name_parts, vec!["sys".to_string(), "objects".to_string()]);
        assert_eq!(o.catalog_alias, "");
        assert!(!o.is_function);

        let unaliased = map.get("").unwrap();
        assert_eq!(unaliased.name_parts, vec!["names".to_string()]);
    }

    #[test]
    fn aliases_are_lower_cased() {
        let map = sources_of("select * from objects AS Obj", &[]);
        assert!(map.get("obj").is_some());
        assert!(map.is_alias("OBJ"));
    }

    #[test]
    fn strips_a_registered_catalog_prefix() {
        let map = sources_of("select * from hive.web.logs l", &["hive"]);
        let l = map.get("l").unwrap();
        assert_eq!(l.catalog_alias, "hive");
        assert_eq!(l.name_parts, vec!["web".to_string(), "logs".to_string()]);
    }

    #[test]
    fn keeps_unregistered_prefixes_in_the_name() {
        let map = sources_of("select * from web.logs l", &["hive"]);
        let l = map.get("l").unwrap();
        assert_eq!(l.catalog_alias, "");
        assert_eq!(l.name_parts, vec!["web".to_string(), "logs".to_string()]);
    }

    #[test]
    fn marks_table_functions() {
        let map = sources_of("select * from events(7) e", &[]);
        assert!(map.get("e").unwrap().is_function);
    }

    #[test]
    fn joined_sources_are_all_visible() {
        let map = sources_of(
            "select * from orders o left join customers c on o.cid = c.id",
            &[],
        );
        assert_eq!(map.len(), 2);
        assert!(map.get("o").is_some());
        assert!(map.get("c").is_some());
    }

    #[test]
    fn last_writer_wins_on_alias_collisions() {
        let map = sources_of("select * from first x, second x", &[]);
        assert_eq!(map.len(), 1);
        assert_eq!(
            map.get("x").unwrap().name_parts,
            vec!["second".to_string()]
        );
    }

    #[test]
    fn subquery_scopes_are_not_entered() {
        let map = sources_of("select * from (select * from hidden) sub", &[]);
        assert!(map.is_empty());
    }
}
