use rustc_hash::{FxHashMap, FxHashSet};

use crate::SyntaxKind;
use crate::parser::Parser;
use crate::tree::{Parse, RuleKind};

/// Rules worth surfacing to completion: everything else the parser walks
/// through is too generic to suggest anything for.
pub const PREFERRED_RULES: &[RuleKind] = &[RuleKind::TableSource, RuleKind::ExprPrimary];

/// What could syntactically follow at a token position: viable grammar rules
/// (restricted to [`PREFERRED_RULES`]) and viable terminals, each with the
/// tokens that would have to follow it (e.g. `BY` after `GROUP`).
#[derive(Debug, Default)]
pub struct CandidateSet {
    rules: FxHashSet<RuleKind>,
    tokens: FxHashMap<SyntaxKind, Vec<SyntaxKind>>,
}

impl CandidateSet {
    pub fn has_rule(&self, rule: RuleKind) -> bool {
        self.rules.contains(&rule)
    }

    pub fn rules(&self) -> impl Iterator<Item = RuleKind> + '_ {
        self.rules.iter().copied()
    }

    pub fn tokens(&self) -> impl Iterator<Item = (SyntaxKind, &[SyntaxKind])> {
        self.tokens.iter().map(|(k, f)| (*k, f.as_slice()))
    }

    pub fn has_token(&self, kind: SyntaxKind) -> bool {
        self.tokens.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.tokens.is_empty()
    }

    pub(crate) fn record_token(&mut self, kind: SyntaxKind, follow: &[SyntaxKind]) {
        self.tokens.entry(kind).or_insert_with(|| follow.to_vec());
    }

    pub(crate) fn record_rule_if_preferred(&mut self, rule: RuleKind) {
        if PREFERRED_RULES.contains(&rule) {
            self.rules.insert(rule);
        }
    }
}

/// Simulates the parser forward and reports what could follow at
/// `token_index` (an index into `parse.tokens`, or `tokens.len()` for end of
/// input).
///
/// The simulation replays the recovering parser over the already-lexed token
/// stream; every alternative probed while the parser sits on the target
/// index is recorded, together with the preferred rules active at that
/// moment. An out-of-range index yields an empty set rather than an error.
/// `context_rule` is a fallback for unreliable (error-recovered) regions: it
/// is reported only when the simulation itself surfaced no rules.
pub fn collect(parse: &Parse, token_index: usize, context_rule: Option<RuleKind>) -> CandidateSet {
    if token_index > parse.tokens.len() {
        return CandidateSet::default();
    }
    let parser = Parser::new(&parse.tokens, parse.root.range().end(), Some(token_index));
    let (_, _, mut set) = parser.run();
    if set.rules.is_empty() {
        if let Some(rule) = context_rule {
            set.rules.insert(rule);
        }
    }
    set
}
