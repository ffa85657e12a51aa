/// Lexical token kinds of the query language.
///
/// Keywords are listed first, then identifiers/literals, punctuation,
/// operators, and finally the hidden-channel trivia kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    All,
    And,
    As,
    Asc,
    Between,
    By,
    Case,
    Cast,
    Cross,
    Desc,
    Distinct,
    Else,
    End,
    False,
    From,
    Group,
    Having,
    In,
    Inner,
    Is,
    Join,
    Left,
    Like,
    Limit,
    Not,
    Null,
    On,
    Or,
    Order,
    Outer,
    Right,
    Select,
    Then,
    True,
    Union,
    Use,
    When,
    Where,

    Ident,
    QuotedIdent,
    StringLit,
    NumberLit,

    Comma,
    Dot,
    Hash,
    LParen,
    RParen,
    Semicolon,

    Star,
    Plus,
    Minus,
    Slash,
    Percent,
    Concat,
    Eq,
    Neq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    Whitespace,
    LineComment,
    BlockComment,

    ErrorToken,
    Eof,
}

impl SyntaxKind {
    pub fn from_keyword(text: &str) -> Option<SyntaxKind> {
        let kind = match text.to_ascii_lowercase().as_str() {
            "all" => SyntaxKind::All,
            "and" => SyntaxKind::And,
            "as" => SyntaxKind::As,
            "asc" => SyntaxKind::Asc,
            "between" => SyntaxKind::Between,
            "by" => SyntaxKind::By,
            "case" => SyntaxKind::Case,
            "cast" => SyntaxKind::Cast,
            "cross" => SyntaxKind::Cross,
            "desc" => SyntaxKind::Desc,
            "distinct" => SyntaxKind::Distinct,
            "else" => SyntaxKind::Else,
            "end" => SyntaxKind::End,
            "false" => SyntaxKind::False,
            "from" => SyntaxKind::From,
            "group" => SyntaxKind::Group,
            "having" => SyntaxKind::Having,
            "in" => SyntaxKind::In,
            "inner" => SyntaxKind::Inner,
            "is" => SyntaxKind::Is,
            "join" => SyntaxKind::Join,
            "left" => SyntaxKind::Left,
            "like" => SyntaxKind::Like,
            "limit" => SyntaxKind::Limit,
            "not" => SyntaxKind::Not,
            "null" => SyntaxKind::Null,
            "on" => SyntaxKind::On,
            "or" => SyntaxKind::Or,
            "order" => SyntaxKind::Order,
            "outer" => SyntaxKind::Outer,
            "right" => SyntaxKind::Right,
            "select" => SyntaxKind::Select,
            "then" => SyntaxKind::Then,
            "true" => SyntaxKind::True,
            "union" => SyntaxKind::Union,
            "use" => SyntaxKind::Use,
            "when" => SyntaxKind::When,
            "where" => SyntaxKind::Where,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_keyword(self) -> bool {
        self.keyword_text().is_some()
    }

    /// Keywords that may still be used as plain identifiers.
    pub fn is_reserved(self) -> bool {
        self.is_keyword()
            && !matches!(
                self,
                SyntaxKind::Asc | SyntaxKind::Desc | SyntaxKind::Left | SyntaxKind::Right
            )
    }

    /// Token kinds that can participate in an identifier chain around the
    /// caret: identifiers, the qualification dot, the `#` name prefix, and
    /// non-reserved keywords.
    pub fn is_identifier_like(self) -> bool {
        match self {
            SyntaxKind::Ident | SyntaxKind::QuotedIdent | SyntaxKind::Dot | SyntaxKind::Hash => true,
            kind => kind.is_keyword() && !kind.is_reserved(),
        }
    }

    pub fn is_comparison_op(self) -> bool {
        matches!(
            self,
            SyntaxKind::Eq
                | SyntaxKind::Neq
                | SyntaxKind::Lt
                | SyntaxKind::LtEq
                | SyntaxKind::Gt
                | SyntaxKind::GtEq
        )
    }

    pub fn keyword_text(self) -> Option<&'static str> {
        let text = match self {
            SyntaxKind::All => "all",
            SyntaxKind::And => "and",
            SyntaxKind::As => "as",
            SyntaxKind::Asc => "asc",
            SyntaxKind::Between => "between",
            SyntaxKind::By => "by",
            SyntaxKind::Case => "case",
            SyntaxKind::Cast => "cast",
            SyntaxKind::Cross => "cross",
            SyntaxKind::Desc => "desc",
            SyntaxKind::Distinct => "distinct",
            SyntaxKind::Else => "else",
            SyntaxKind::End => "end",
            SyntaxKind::False => "false",
            SyntaxKind::From => "from",
            SyntaxKind::Group => "group",
            SyntaxKind::Having => "having",
            SyntaxKind::In => "in",
            SyntaxKind::Inner => "inner",
            SyntaxKind::Is => "is",
            SyntaxKind::Join => "join",
            SyntaxKind::Left => "left",
            SyntaxKind::Like => "like",
            SyntaxKind::Limit => "limit",
            SyntaxKind::Not => "not",
            SyntaxKind::Null => "null",
            SyntaxKind::On => "on",
            SyntaxKind::Or => "or",
            SyntaxKind::Order => "order",
            SyntaxKind::Outer => "outer",
            SyntaxKind::Right => "right",
            SyntaxKind::Select => "select",
            SyntaxKind::Then => "then",
            SyntaxKind::True => "true",
            SyntaxKind::Union => "union",
            SyntaxKind::Use => "use",
            SyntaxKind::When => "when",
            SyntaxKind::Where => "where",
            _ => return None,
        };
        Some(text)
    }
}
