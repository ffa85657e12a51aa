//! Base relevance per completion family, plus the bonuses the match filter
//! hands out. The absolute values only matter relative to each other: scoped
//! columns beat tables, tables beat functions, keywords come last unless the
//! user typed a prefix of one.

pub(crate) const TABLE: i32 = 20;
pub(crate) const COLUMN: i32 = 30;
pub(crate) const FUNCTION: i32 = 15;
pub(crate) const BUILTIN_FUNCTION: i32 = 10;
pub(crate) const KEYWORD: i32 = 5;

pub(crate) const PREFIX_MATCH_PER_CHAR: i32 = 10;
pub(crate) const SUBSTRING_MATCH_PER_CHAR: i32 = 4;
