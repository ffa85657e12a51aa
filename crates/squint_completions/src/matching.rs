use crate::relevance;

/// Scores an item's ordered match-parts against the already-typed text.
///
/// The typed text is split on `.` and aligned right-to-left against the
/// parts, so typing `objects` or `sys.objects` both reach an item with parts
/// `["sys", "objects"]`, while `names.objects` does not. All pairs but the
/// deepest must match exactly (case-insensitively); the deepest typed part
/// may be a prefix or substring of its counterpart. Returns `None` when the
/// item does not match, otherwise the score bonus for the match quality.
pub fn match_score(parts: &[String], typed: &str) -> Option<i32> {
    if typed.is_empty() {
        return Some(0);
    }
    let typed_parts: Vec<&str> = typed.split('.').collect();
    if typed_parts.len() > parts.len() {
        return None;
    }

    let mut bonus = 0;
    for (depth, (part, typed_part)) in parts
        .iter()
        .rev()
        .zip(typed_parts.iter().rev())
        .enumerate()
    {
        if depth == 0 {
            if typed_part.is_empty() {
                continue;
            }
            let part = part.to_lowercase();
            let typed_part = typed_part.to_lowercase();
            if part.starts_with(&typed_part) {
                bonus += typed_part.len() as i32 * relevance::PREFIX_MATCH_PER_CHAR;
            } else if part.contains(&typed_part) {
                bonus += typed_part.len() as i32 * relevance::SUBSTRING_MATCH_PER_CHAR;
            } else {
                return None;
            }
        } else if !part.eq_ignore_ascii_case(typed_part) {
            return None;
        }
    }
    Some(bonus)
}
