use text_size::{TextRange, TextSize};

use crate::SyntaxKind;
use crate::diagnostics::SyntaxDiagnostic;

/// The channel a token lives on. Language rules only ever see the default
/// channel; whitespace and comments stay on the hidden channel but remain in
/// the token stream for cursor-position mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Default,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub text: String,
    pub span: TextRange,
    pub channel: Channel,
}

impl Token {
    pub fn is_hidden(&self) -> bool {
        self.channel == Channel::Hidden
    }
}

/// Tokenizes `input` into the full token stream, hidden channel included.
///
/// The lexer never fails: malformed input (unterminated strings or block
/// comments, stray characters) yields a best-effort token plus a diagnostic.
pub fn lex(input: &str) -> (Vec<Token>, Vec<SyntaxDiagnostic>) {
    let mut lexer = Lexer {
        input,
        pos: 0,
        tokens: Vec::new(),
        errors: Vec::new(),
    };
    lexer.run();
    (lexer.tokens, lexer.errors)
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<Token>,
    errors: Vec<SyntaxDiagnostic>,
}

impl Lexer<'_> {
    fn run(&mut self) {
        while let Some(c) = self.peek() {
            let start = self.pos;
            match c {
                c if c.is_whitespace() => {
                    while self.peek().is_some_and(|c| c.is_whitespace()) {
                        self.bump();
                    }
                    self.push(SyntaxKind::Whitespace, start, Channel::Hidden);
                }
                '-' if self.peek_second() == Some('-') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                    self.push(SyntaxKind::LineComment, start, Channel::Hidden);
                }
                '/' if self.peek_second() == Some('*') => {
                    self.block_comment(start);
                }
                '\'' => self.string_literal(start),
                '"' => self.quoted_ident(start),
                c if c.is_ascii_digit() => self.number(start),
                c if is_ident_start(c) => {
                    while self.peek().is_some_and(is_ident_continue) {
                        self.bump();
                    }
                    let text = &self.input[start..self.pos];
                    let kind = SyntaxKind::from_keyword(text).unwrap_or(SyntaxKind::Ident);
                    self.push(kind, start, Channel::Default);
                }
                _ => self.punct(start),
            }
        }
    }

    fn block_comment(&mut self, start: usize) {
        self.bump();
        self.bump();
        loop {
            match self.peek() {
                None => {
                    self.errors.push(SyntaxDiagnostic::new(
                        "Unterminated block comment",
                        span_of(start, self.pos),
                    ));
                    break;
                }
                Some('*') if self.peek_second() == Some('/') => {
                    self.bump();
                    self.bump();
                    break;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        self.push(SyntaxKind::BlockComment, start, Channel::Hidden);
    }

    fn string_literal(&mut self, start: usize) {
        self.bump();
        loop {
            match self.peek() {
                None => {
                    self.errors.push(SyntaxDiagnostic::new(
                        "Unterminated string literal",
                        span_of(start, self.pos),
                    ));
                    break;
                }
                Some('\'') => {
                    self.bump();
                    // '' is an escaped quote inside the literal
                    if self.peek() == Some('\'') {
                        self.bump();
                        continue;
                    }
                    break;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        self.push(SyntaxKind::StringLit, start, Channel::Default);
    }

    fn quoted_ident(&mut self, start: usize) {
        self.bump();
        loop {
            match self.peek() {
                None => {
                    self.errors.push(SyntaxDiagnostic::new(
                        "Unterminated quoted identifier",
                        span_of(start, self.pos),
                    ));
                    break;
                }
                Some('"') => {
                    self.bump();
                    if self.peek() == Some('"') {
                        self.bump();
                        continue;
                    }
                    break;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        self.push(SyntaxKind::QuotedIdent, start, Channel::Default);
    }

    fn number(&mut self, start: usize) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if self.peek().is_some_and(|c| c == 'e' || c == 'E') {
            let mut lookahead = self.pos + 1;
            if self.input[lookahead..].starts_with(['+', '-']) {
                lookahead += 1;
            }
            if self.input[lookahead..].starts_with(|c: char| c.is_ascii_digit()) {
                self.pos = lookahead;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }
        self.push(SyntaxKind::NumberLit, start, Channel::Default);
    }

    fn punct(&mut self, start: usize) {
        let c = self.bump().expect("punct called with input left");
        let kind = match c {
            ',' => SyntaxKind::Comma,
            '.' => SyntaxKind::Dot,
            '#' => SyntaxKind::Hash,
            '(' => SyntaxKind::LParen,
            ')' => SyntaxKind::RParen,
            ';' => SyntaxKind::Semicolon,
            '*' => SyntaxKind::Star,
            '+' => SyntaxKind::Plus,
            '-' => SyntaxKind::Minus,
            '/' => SyntaxKind::Slash,
            '%' => SyntaxKind::Percent,
            '=' => SyntaxKind::Eq,
            '|' if self.peek() == Some('|') => {
                self.bump();
                SyntaxKind::Concat
            }
            '!' if self.peek() == Some('=') => {
                self.bump();
                SyntaxKind::Neq
            }
            '<' if self.peek() == Some('=') => {
                self.bump();
                SyntaxKind::LtEq
            }
            '<' if self.peek() == Some('>') => {
                self.bump();
                SyntaxKind::Neq
            }
            '<' => SyntaxKind::Lt,
            '>' if self.peek() == Some('=') => {
                self.bump();
                SyntaxKind::GtEq
            }
            '>' => SyntaxKind::Gt,
            _ => {
                self.errors.push(SyntaxDiagnostic::new(
                    format!("Unexpected character '{c}'"),
                    span_of(start, self.pos),
                ));
                SyntaxKind::ErrorToken
            }
        };
        self.push(kind, start, Channel::Default);
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn push(&mut self, kind: SyntaxKind, start: usize, channel: Channel) {
        self.tokens.push(Token {
            kind,
            text: self.input[start..self.pos].to_string(),
            span: span_of(start, self.pos),
            channel,
        });
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphanumeric()
}

fn span_of(start: usize, end: usize) -> TextRange {
    TextRange::new(
        TextSize::new(start as u32),
        TextSize::new(end as u32),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<SyntaxKind> {
        lex(input).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_a_simple_statement() {
        assert_eq!(
            kinds("select a.b from t;"),
            vec![
                SyntaxKind::Select,
                SyntaxKind::Whitespace,
                SyntaxKind::Ident,
                SyntaxKind::Dot,
                SyntaxKind::Ident,
                SyntaxKind::Whitespace,
                SyntaxKind::From,
                SyntaxKind::Whitespace,
                SyntaxKind::Ident,
                SyntaxKind::Semicolon,
            ]
        );
    }

    #[test]
    fn comments_and_whitespace_are_hidden() {
        let (tokens, errors) = lex("select -- line\n/* block */ 1");
        assert!(errors.is_empty());
        let hidden: Vec<SyntaxKind> = tokens
            .iter()
            .filter(|t| t.is_hidden())
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            hidden,
            vec![
                SyntaxKind::Whitespace,
                SyntaxKind::LineComment,
                SyntaxKind::Whitespace,
                SyntaxKind::BlockComment,
                SyntaxKind::Whitespace,
            ]
        );
    }

    #[test]
    fn unterminated_string_reports_one_error() {
        let (tokens, errors) = lex("select 'abc");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Unterminated string"));
        let last = tokens.last().unwrap();
        assert_eq!(last.kind, SyntaxKind::StringLit);
        assert_eq!(last.text, "'abc");
    }

    #[test]
    fn escaped_quote_stays_inside_the_literal() {
        let (tokens, errors) = lex("'it''s'");
        assert!(errors.is_empty());
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "'it''s'");
    }

    #[test]
    fn two_char_operators() {
        assert_eq!(
            kinds("a<>b<=c!=d||e"),
            vec![
                SyntaxKind::Ident,
                SyntaxKind::Neq,
                SyntaxKind::Ident,
                SyntaxKind::LtEq,
                SyntaxKind::Ident,
                SyntaxKind::Neq,
                SyntaxKind::Ident,
                SyntaxKind::Concat,
                SyntaxKind::Ident,
            ]
        );
    }

    #[test]
    fn spans_cover_the_input() {
        let (tokens, _) = lex("select 1");
        assert_eq!(tokens[0].span, TextRange::new(0.into(), 6.into()));
        assert_eq!(tokens[2].span, TextRange::new(7.into(), 8.into()));
    }
}
