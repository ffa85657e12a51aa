use text_size::{TextRange, TextSize};

use crate::SyntaxKind;
use crate::candidates::CandidateSet;
use crate::diagnostics::SyntaxDiagnostic;
use crate::lexer::{Token, lex};
use crate::tree::{Child, Node, Parse, RuleKind};

/// Parses `text` into a tree.
///
/// The parser always produces a tree: a single-token mismatch records a
/// diagnostic and either drops the offending token or pretends the expected
/// one was there, and anything worse resynchronizes at the next statement
/// boundary.
pub fn parse(text: &str) -> Parse {
    let (tokens, mut errors) = lex(text);
    let parser = Parser::new(&tokens, TextSize::of(text), None);
    let (root, parse_errors, _) = parser.run();
    errors.extend(parse_errors);
    Parse {
        tokens,
        root,
        errors,
    }
}

struct Frame {
    kind: RuleKind,
    start: TextSize,
    children: Vec<Child>,
}

pub(crate) struct Parser<'a> {
    tokens: &'a [Token],
    text_len: TextSize,
    /// Index of the current significant token, or `tokens.len()` at EOF.
    pos: usize,
    last_end: TextSize,
    errors: Vec<SyntaxDiagnostic>,
    stack: Vec<Frame>,
    rule_stack: Vec<RuleKind>,
    /// Candidate-collection target; `None` for a plain parse.
    target: Option<usize>,
    candidates: CandidateSet,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(tokens: &'a [Token], text_len: TextSize, target: Option<usize>) -> Self {
        let mut pos = 0;
        while pos < tokens.len() && tokens[pos].is_hidden() {
            pos += 1;
        }
        Self {
            tokens,
            text_len,
            pos,
            last_end: TextSize::new(0),
            errors: Vec::new(),
            stack: Vec::new(),
            rule_stack: Vec::new(),
            target,
            candidates: CandidateSet::default(),
        }
    }

    pub(crate) fn run(mut self) -> (Node, Vec<SyntaxDiagnostic>, CandidateSet) {
        self.start_node(RuleKind::Document);
        loop {
            if self.at(SyntaxKind::Semicolon) {
                self.bump();
                continue;
            }
            if self.at(SyntaxKind::Select) {
                self.select_stmt();
                continue;
            }
            if self.at(SyntaxKind::Use) {
                self.use_stmt();
                continue;
            }
            if self.current() == SyntaxKind::Eof {
                break;
            }
            self.error_current("Expected a statement");
            self.bump();
        }
        let mut root = self.pop_node();
        root.range = TextRange::new(TextSize::new(0), self.text_len);
        (root, self.errors, self.candidates)
    }

    // -- statements ----------------------------------------------------------

    fn use_stmt(&mut self) {
        self.start_node(RuleKind::UseStmt);
        self.expect(SyntaxKind::Use);
        self.qualified_name();
        if self.eat(SyntaxKind::Eq) {
            self.expr();
        }
        self.end_node();
    }

    fn select_stmt(&mut self) {
        self.start_node(RuleKind::SelectStmt);
        self.select_core();
        while self.at(SyntaxKind::Union) {
            self.bump();
            self.eat(SyntaxKind::All);
            self.select_core();
        }
        if self.at_with_follow(SyntaxKind::Order, SyntaxKind::By) {
            self.bump();
            self.expect(SyntaxKind::By);
            self.order_items();
        }
        if self.at(SyntaxKind::Limit) {
            self.bump();
            self.expect(SyntaxKind::NumberLit);
        }
        self.end_node();
    }

    fn select_core(&mut self) {
        self.expect(SyntaxKind::Select);
        self.eat(SyntaxKind::Distinct);
        loop {
            self.select_item();
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        if self.at(SyntaxKind::From) {
            self.bump();
            self.table_source_list();
        }
        if self.at(SyntaxKind::Where) {
            self.bump();
            self.expr();
        }
        if self.at_with_follow(SyntaxKind::Group, SyntaxKind::By) {
            self.bump();
            self.expect(SyntaxKind::By);
            loop {
                self.expr();
                if !self.eat(SyntaxKind::Comma) {
                    break;
                }
            }
        }
        if self.at(SyntaxKind::Having) {
            self.bump();
            self.expr();
        }
        if !self.at_stmt_boundary() {
            self.error_current("Unexpected token");
            while !self.at_stmt_boundary() {
                self.bump();
            }
        }
    }

    fn at_stmt_boundary(&self) -> bool {
        matches!(
            self.current(),
            SyntaxKind::Eof
                | SyntaxKind::Semicolon
                | SyntaxKind::Select
                | SyntaxKind::Use
                | SyntaxKind::Union
                | SyntaxKind::Order
                | SyntaxKind::Limit
                | SyntaxKind::RParen
        )
    }

    fn select_item(&mut self) {
        self.start_node(RuleKind::SelectItem);
        if self.at(SyntaxKind::Star) {
            self.bump();
            self.end_node();
            return;
        }
        self.expr();
        self.alias();
        self.end_node();
    }

    fn order_items(&mut self) {
        loop {
            self.expr();
            if self.at(SyntaxKind::Asc) || self.at(SyntaxKind::Desc) {
                self.bump();
            }
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
    }

    // -- table sources -------------------------------------------------------

    fn table_source_list(&mut self) {
        self.table_source();
        loop {
            if self.eat(SyntaxKind::Comma) {
                self.table_source();
                continue;
            }
            if self.at_join_start() {
                self.join_clause();
                continue;
            }
            break;
        }
    }

    fn at_join_start(&mut self) -> bool {
        self.observe(SyntaxKind::Join);
        self.observe(SyntaxKind::Left);
        self.observe(SyntaxKind::Inner);
        self.observe(SyntaxKind::Cross);
        matches!(
            self.current(),
            SyntaxKind::Join
                | SyntaxKind::Left
                | SyntaxKind::Right
                | SyntaxKind::Inner
                | SyntaxKind::Outer
                | SyntaxKind::Cross
        )
    }

    fn join_clause(&mut self) {
        while matches!(
            self.current(),
            SyntaxKind::Left | SyntaxKind::Right | SyntaxKind::Inner | SyntaxKind::Outer | SyntaxKind::Cross
        ) {
            self.bump();
        }
        self.expect(SyntaxKind::Join);
        self.table_source();
        if self.at(SyntaxKind::On) {
            self.bump();
            self.expr();
        }
    }

    fn table_source(&mut self) {
        self.start_node(RuleKind::TableSource);
        if self.at(SyntaxKind::LParen) {
            self.bump();
            if self.at(SyntaxKind::Select) {
                self.select_stmt();
            } else {
                self.expr();
            }
            self.expect(SyntaxKind::RParen);
            self.alias();
            self.end_node();
            return;
        }
        if self.at_name_part() {
            self.qualified_name();
            if self.at(SyntaxKind::LParen) {
                self.call_args();
            }
            self.alias();
        } else {
            self.error_current("Expected a table source");
        }
        self.end_node();
    }

    fn alias(&mut self) {
        if self.at(SyntaxKind::As) {
            self.bump();
            if self.at_name_part() {
                self.name_part();
            } else {
                self.error_current("Expected an alias");
            }
            return;
        }
        // bare aliases are plain identifiers only; a non-reserved keyword
        // here would swallow join modifiers like `left`
        self.observe(SyntaxKind::Ident);
        if matches!(self.current(), SyntaxKind::Ident | SyntaxKind::QuotedIdent) {
            self.bump();
        }
    }

    // -- names ---------------------------------------------------------------

    fn at_name_part(&mut self) -> bool {
        self.observe(SyntaxKind::Ident);
        let kind = self.current();
        matches!(
            kind,
            SyntaxKind::Ident | SyntaxKind::QuotedIdent | SyntaxKind::Hash
        ) || (kind.is_keyword() && !kind.is_reserved())
    }

    fn name_part(&mut self) {
        if self.current() == SyntaxKind::Hash {
            self.bump();
            if self.current() == SyntaxKind::Ident {
                self.bump();
            }
            return;
        }
        self.bump();
    }

    fn qualified_name(&mut self) {
        self.start_node(RuleKind::QualifiedName);
        if self.at_name_part() {
            self.name_part();
        } else {
            self.error_current("Expected an identifier");
            self.end_node();
            return;
        }
        while self.at(SyntaxKind::Dot) {
            self.bump();
            if self.at_name_part() {
                self.name_part();
            } else {
                // trailing dot: leave the position open for completion
                break;
            }
        }
        self.end_node();
    }

    // -- expressions ---------------------------------------------------------

    fn expr(&mut self) {
        self.or_expr();
    }

    fn or_expr(&mut self) {
        self.and_expr();
        while self.at(SyntaxKind::Or) {
            self.bump();
            self.and_expr();
        }
    }

    fn and_expr(&mut self) {
        self.not_expr();
        while self.at(SyntaxKind::And) {
            self.bump();
            self.not_expr();
        }
    }

    fn not_expr(&mut self) {
        if self.at(SyntaxKind::Not) {
            self.bump();
            self.not_expr();
            return;
        }
        self.comparison();
    }

    fn comparison(&mut self) {
        let cp = self.checkpoint();
        self.additive();
        if self.at_comparison_op() {
            self.bump();
            self.additive();
            self.wrap_from(cp, RuleKind::Comparison);
            return;
        }
        if self.at(SyntaxKind::Is) {
            self.bump();
            self.eat(SyntaxKind::Not);
            self.expect(SyntaxKind::Null);
            return;
        }
        if self.at(SyntaxKind::Not) {
            if matches!(
                self.next_significant_kind(),
                SyntaxKind::Like | SyntaxKind::In | SyntaxKind::Between
            ) {
                self.bump();
            } else {
                return;
            }
        }
        if self.at(SyntaxKind::Like) {
            self.bump();
            self.additive();
            return;
        }
        if self.at(SyntaxKind::In) {
            self.bump();
            self.in_list();
            return;
        }
        if self.at(SyntaxKind::Between) {
            self.bump();
            self.additive();
            self.expect(SyntaxKind::And);
            self.additive();
        }
    }

    fn at_comparison_op(&mut self) -> bool {
        self.observe(SyntaxKind::Eq);
        self.current().is_comparison_op()
    }

    fn in_list(&mut self) {
        self.expect(SyntaxKind::LParen);
        if self.at(SyntaxKind::Select) {
            self.select_stmt();
        } else {
            loop {
                self.expr();
                if !self.eat(SyntaxKind::Comma) {
                    break;
                }
            }
        }
        self.expect(SyntaxKind::RParen);
    }

    fn additive(&mut self) {
        self.multiplicative();
        while matches!(
            self.current(),
            SyntaxKind::Plus | SyntaxKind::Minus | SyntaxKind::Concat
        ) {
            self.bump();
            self.multiplicative();
        }
    }

    fn multiplicative(&mut self) {
        self.unary();
        while matches!(
            self.current(),
            SyntaxKind::Star | SyntaxKind::Slash | SyntaxKind::Percent
        ) {
            self.bump();
            self.unary();
        }
    }

    fn unary(&mut self) {
        if matches!(self.current(), SyntaxKind::Plus | SyntaxKind::Minus) {
            self.bump();
        }
        self.primary();
    }

    fn primary(&mut self) {
        self.rule_stack.push(RuleKind::ExprPrimary);
        self.primary_inner();
        self.rule_stack.pop();
    }

    fn primary_inner(&mut self) {
        self.observe(SyntaxKind::NumberLit);
        self.observe(SyntaxKind::StringLit);
        self.observe(SyntaxKind::Null);
        self.observe(SyntaxKind::True);
        self.observe(SyntaxKind::False);
        if matches!(
            self.current(),
            SyntaxKind::NumberLit
                | SyntaxKind::StringLit
                | SyntaxKind::Null
                | SyntaxKind::True
                | SyntaxKind::False
        ) {
            self.start_node(RuleKind::Literal);
            self.bump();
            self.end_node();
            return;
        }
        if self.at(SyntaxKind::Cast) {
            self.start_node(RuleKind::ExprPrimary);
            self.bump();
            self.expect(SyntaxKind::LParen);
            self.expr();
            self.expect(SyntaxKind::As);
            self.type_name();
            self.expect(SyntaxKind::RParen);
            self.end_node();
            return;
        }
        if self.at(SyntaxKind::Case) {
            self.start_node(RuleKind::ExprPrimary);
            self.bump();
            if !self.at(SyntaxKind::When) {
                self.expr();
            }
            while self.at(SyntaxKind::When) {
                self.bump();
                self.expr();
                self.expect(SyntaxKind::Then);
                self.expr();
            }
            if self.at(SyntaxKind::Else) {
                self.bump();
                self.expr();
            }
            self.expect(SyntaxKind::End);
            self.end_node();
            return;
        }
        if self.at(SyntaxKind::LParen) {
            self.start_node(RuleKind::ExprPrimary);
            self.bump();
            if self.at(SyntaxKind::Select) {
                self.select_stmt();
            } else {
                self.expr();
            }
            self.expect(SyntaxKind::RParen);
            self.end_node();
            return;
        }
        if self.at_name_part() {
            self.start_node(RuleKind::ExprPrimary);
            self.qualified_name();
            if self.at(SyntaxKind::LParen) {
                self.call_args();
            }
            self.end_node();
            return;
        }
        self.error_current("Expected an expression");
    }

    fn type_name(&mut self) {
        if !self.at_name_part() {
            self.error_current("Expected a type name");
            return;
        }
        self.name_part();
        if self.eat(SyntaxKind::LParen) {
            self.expect(SyntaxKind::NumberLit);
            if self.eat(SyntaxKind::Comma) {
                self.expect(SyntaxKind::NumberLit);
            }
            self.expect(SyntaxKind::RParen);
        }
    }

    fn call_args(&mut self) {
        self.bump(); // '('
        if self.at(SyntaxKind::RParen) {
            self.bump();
            return;
        }
        if self.at(SyntaxKind::Star) {
            self.bump();
            self.expect(SyntaxKind::RParen);
            return;
        }
        loop {
            self.expr();
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::RParen);
    }

    // -- token machinery -----------------------------------------------------

    fn current(&self) -> SyntaxKind {
        self.tokens
            .get(self.pos)
            .map(|t| t.kind)
            .unwrap_or(SyntaxKind::Eof)
    }

    fn next_significant_kind(&self) -> SyntaxKind {
        let mut i = self.pos + 1;
        while i < self.tokens.len() && self.tokens[i].is_hidden() {
            i += 1;
        }
        self.tokens
            .get(i)
            .map(|t| t.kind)
            .unwrap_or(SyntaxKind::Eof)
    }

    fn bump(&mut self) {
        if self.pos >= self.tokens.len() {
            return;
        }
        self.last_end = self.tokens[self.pos].span.end();
        if let Some(frame) = self.stack.last_mut() {
            frame.children.push(Child::Token(self.pos));
        }
        self.pos += 1;
        while self.pos < self.tokens.len() && self.tokens[self.pos].is_hidden() {
            self.pos += 1;
        }
    }

    /// Records `kind` (and the active preferred rules) as viable when the
    /// parser is probing at the collection target.
    fn observe(&mut self, kind: SyntaxKind) {
        self.observe_with_follow(kind, &[]);
    }

    fn observe_with_follow(&mut self, kind: SyntaxKind, follow: &[SyntaxKind]) {
        if self.target != Some(self.pos) {
            return;
        }
        self.candidates.record_token(kind, follow);
        for rule in &self.rule_stack {
            self.candidates.record_rule_if_preferred(*rule);
        }
    }

    fn at(&mut self, kind: SyntaxKind) -> bool {
        self.observe(kind);
        self.current() == kind
    }

    fn at_with_follow(&mut self, kind: SyntaxKind, follow: SyntaxKind) -> bool {
        self.observe_with_follow(kind, &[follow]);
        self.current() == kind
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: SyntaxKind) {
        if self.eat(kind) {
            return;
        }
        self.error_current(format!("Expected {:#?}", kind));
        // single-token deletion: drop the offender when the expected token
        // is right behind it
        if self.current() != SyntaxKind::Eof && self.next_significant_kind() == kind {
            self.bump();
            self.bump();
        }
    }

    fn error_current(&mut self, message: impl Into<String>) {
        match self.tokens.get(self.pos) {
            Some(token) => self
                .errors
                .push(SyntaxDiagnostic::new(message, token.span)),
            None => self.errors.push(SyntaxDiagnostic::without_position(message)),
        }
    }

    // -- tree building -------------------------------------------------------

    fn node_start(&self) -> TextSize {
        self.tokens
            .get(self.pos)
            .map(|t| t.span.start())
            .unwrap_or(self.last_end)
    }

    fn start_node(&mut self, kind: RuleKind) {
        self.stack.push(Frame {
            kind,
            start: self.node_start(),
            children: Vec::new(),
        });
        self.rule_stack.push(kind);
    }

    fn pop_node(&mut self) -> Node {
        self.rule_stack.pop();
        let frame = self.stack.pop().expect("unbalanced node stack");
        let end = self.last_end.max(frame.start);
        Node {
            kind: frame.kind,
            range: TextRange::new(frame.start, end),
            children: frame.children,
        }
    }

    fn end_node(&mut self) {
        let node = self.pop_node();
        let parent = self.stack.last_mut().expect("node closed without parent");
        parent.children.push(Child::Node(node));
    }

    fn checkpoint(&self) -> (usize, TextSize) {
        let frame = self.stack.last().expect("checkpoint outside a node");
        (frame.children.len(), self.node_start())
    }

    /// Wraps everything produced since `cp` into a fresh node, rowan-style.
    fn wrap_from(&mut self, cp: (usize, TextSize), kind: RuleKind) {
        let (child_index, start) = cp;
        let frame = self.stack.last_mut().expect("wrap outside a node");
        let children: Vec<Child> = frame.children.drain(child_index..).collect();
        let end = self.last_end.max(start);
        frame.children.push(Child::Node(Node {
            kind,
            range: TextRange::new(start, end),
            children,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement_kinds(input: &str) -> Vec<RuleKind> {
        parse(input).statements().map(|n| n.kind()).collect()
    }

    #[test]
    fn parses_a_clean_select() {
        let parsed = parse("select a, b.c from sys.objects o where o.id = 1 order by a limit 10;");
        assert!(!parsed.has_errors(), "unexpected: {:?}", parsed.errors);
        assert_eq!(statement_kinds("select 1"), vec![RuleKind::SelectStmt]);
    }

    #[test]
    fn splits_statements_on_semicolons() {
        assert_eq!(
            statement_kinds("use hive.scan_mode = 'fast'; select 1; select 2"),
            vec![
                RuleKind::UseStmt,
                RuleKind::SelectStmt,
                RuleKind::SelectStmt
            ]
        );
    }

    #[test]
    fn builds_table_source_nodes() {
        let parsed = parse("select * from sys.objects o join names n on o.id = n.id");
        let stmt = parsed.statements().next().unwrap();
        let mut sources = 0;
        stmt.for_each(&mut |node| {
            if node.kind() == RuleKind::TableSource {
                sources += 1;
            }
        });
        assert_eq!(sources, 2);
    }

    #[test]
    fn qualified_name_parts_are_split_on_dots() {
        let parsed = parse("select * from sys.\"obj\"\"ects\"");
        let stmt = parsed.statements().next().unwrap();
        let source = stmt.first_node(RuleKind::TableSource).unwrap();
        let name = source.first_node(RuleKind::QualifiedName).unwrap();
        assert_eq!(
            name.qualified_name_parts(&parsed.tokens),
            vec!["sys".to_string(), "obj\"ects".to_string()]
        );
    }

    #[test]
    fn missing_select_item_recovers_with_one_error() {
        let parsed = parse("select from t");
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(
            parsed.statements().map(|n| n.kind()).collect::<Vec<_>>(),
            vec![RuleKind::SelectStmt]
        );
        // the from clause still produced a table source
        let stmt = parsed.statements().next().unwrap();
        let mut found = false;
        stmt.for_each(&mut |node| found |= node.kind() == RuleKind::TableSource);
        assert!(found);
    }

    #[test]
    fn garbage_resynchronizes_at_the_next_statement() {
        let parsed = parse("select 1 2 3 4; select 5");
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(
            parsed.statements().map(|n| n.kind()).collect::<Vec<_>>(),
            vec![RuleKind::SelectStmt, RuleKind::SelectStmt]
        );
    }

    #[test]
    fn unterminated_string_still_yields_a_tree() {
        let parsed = parse("select 'abc");
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(
            parsed.statements().map(|n| n.kind()).collect::<Vec<_>>(),
            vec![RuleKind::SelectStmt]
        );
    }

    #[test]
    fn trailing_dot_stays_inside_the_qualified_name() {
        let parsed = parse("select a. from tbl a");
        let stmt = parsed.statements().next().unwrap();
        let item = stmt.first_node(RuleKind::SelectItem).unwrap();
        let primary = item.first_node(RuleKind::ExprPrimary).unwrap();
        let name = primary.first_node(RuleKind::QualifiedName).unwrap();
        assert_eq!(
            name.qualified_name_parts(&parsed.tokens),
            vec!["a".to_string()]
        );
    }

    #[test]
    fn comparison_nodes_wrap_both_operands() {
        let parsed = parse("select 1 where null = null");
        let mut comparisons = 0;
        parsed.root.for_each(&mut |node| {
            if node.kind() == RuleKind::Comparison {
                comparisons += 1;
                let op = node
                    .token_indices()
                    .find(|i| parsed.tokens[*i].kind == SyntaxKind::Eq);
                assert!(op.is_some());
            }
        });
        assert_eq!(comparisons, 1);
    }

    #[test]
    fn empty_input_produces_an_empty_document() {
        let parsed = parse("");
        assert!(!parsed.has_errors());
        assert_eq!(parsed.statements().count(), 0);
    }

    #[test]
    fn subqueries_nest_select_statements() {
        let parsed = parse("select * from (select id from t) sub");
        let stmt = parsed.statements().next().unwrap();
        let source = stmt.first_node(RuleKind::TableSource).unwrap();
        assert!(source.first_node(RuleKind::SelectStmt).is_some());
    }
}
