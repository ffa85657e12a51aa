use serde::{Deserialize, Serialize};

/// Schema metadata as supplied by a catalog extension. Immutable once
/// returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMeta {
    /// Alias of the catalog this table belongs to.
    pub catalog: String,
    /// Qualified name parts, e.g. `["sys", "objects"]`.
    pub name_parts: Vec<String>,
    pub description: Option<String>,
    pub columns: Vec<ColumnMeta>,
}

impl TableMeta {
    pub fn qualified_name(&self) -> String {
        self.name_parts.join(".")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FunctionKind {
    Scalar,
    Table,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionMeta {
    pub name: String,
    pub kind: FunctionKind,
    pub description: Option<String>,
}

/// True iff every part of `reference`, compared right-to-left, equals the
/// corresponding part of `name` case-insensitively. `objects` matches
/// `sys.objects`; `sys` alone does not.
pub fn contains_suffix(name: &[String], reference: &[String]) -> bool {
    if reference.is_empty() || reference.len() > name.len() {
        return false;
    }
    name.iter()
        .rev()
        .zip(reference.iter().rev())
        .all(|(n, r)| n.eq_ignore_ascii_case(r))
}

#[cfg(test)]
mod tests {
    use super::contains_suffix;

    fn parts(s: &str) -> Vec<String> {
        s.split('.').map(str::to_string).collect()
    }

    #[test]
    fn matches_right_to_left() {
        assert!(contains_suffix(&parts("sys.objects"), &parts("objects")));
        assert!(contains_suffix(&parts("sys.objects"), &parts("sys.objects")));
        assert!(contains_suffix(&parts("a.sys.objects"), &parts("sys.objects")));
    }

    #[test]
    fn rejects_non_suffixes() {
        assert!(!contains_suffix(&parts("sys.objects"), &parts("sys")));
        assert!(!contains_suffix(&parts("sys.objects"), &parts("names")));
        assert!(!contains_suffix(
            &parts("objects"),
            &parts("sys.objects")
        ));
    }

    #[test]
    fn comparison_is_case_insensitive() {
        assert!(contains_suffix(&parts("SYS.Objects"), &parts("sys.OBJECTS")));
    }

    #[test]
    fn empty_reference_names_nothing() {
        assert!(!contains_suffix(&parts("sys.objects"), &[]));
    }
}
