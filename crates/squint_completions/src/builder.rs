use crate::item::CompletionItem;
use crate::matching::match_score;

/// Accumulates raw completion items, then filters them against the typed
/// text, folds the match bonus into each score, and emits a ranked,
/// deduplicated, bounded list.
pub struct CompletionBuilder {
    items: Vec<CompletionItem>,
    already_typed: String,
}

impl CompletionBuilder {
    pub fn new(already_typed: &str) -> Self {
        CompletionBuilder {
            items: Vec::new(),
            already_typed: already_typed.to_string(),
        }
    }

    pub fn add_item(&mut self, item: CompletionItem) {
        self.items.push(item);
    }

    pub fn add_items(&mut self, items: Vec<CompletionItem>) {
        self.items.extend(items);
    }

    pub fn finish(self) -> Vec<CompletionItem> {
        let typed = self.already_typed;
        let mut items: Vec<CompletionItem> = self
            .items
            .into_iter()
            .filter_map(|mut item| {
                let bonus = match_score(&item.match_parts, &typed)?;
                item.score += bonus;
                Some(item)
            })
            .collect();

        items.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.replacement.cmp(&b.replacement))
        });
        items.dedup_by(|a, b| a.replacement == b.replacement && a.kind == b.kind);
        items.truncate(crate::LIMIT);
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::CompletionItemKind;

    fn item(name: &str, score: i32) -> CompletionItem {
        CompletionItem {
            match_parts: vec![name.to_string()],
            replacement: name.to_string(),
            insertion: None,
            description: None,
            kind: CompletionItemKind::Table,
            score,
        }
    }

    #[test]
    fn ranks_by_score_then_name() {
        let mut builder = CompletionBuilder::new("");
        builder.add_item(item("zeta", 10));
        builder.add_item(item("beta", 20));
        builder.add_item(item("alpha", 10));

        let labels: Vec<String> = builder.finish().into_iter().map(|i| i.replacement).collect();
        assert_eq!(labels, vec!["beta", "alpha", "zeta"]);
    }

    #[test]
    fn filters_on_typed_text() {
        let mut builder = CompletionBuilder::new("al");
        builder.add_item(item("alpha", 0));
        builder.add_item(item("beta", 0));

        let labels: Vec<String> = builder.finish().into_iter().map(|i| i.replacement).collect();
        assert_eq!(labels, vec!["alpha"]);
    }

    #[test]
    fn deduplicates_and_truncates() {
        let mut builder = CompletionBuilder::new("");
        builder.add_item(item("alpha", 0));
        builder.add_item(item("alpha", 0));
        for i in 0..100 {
            builder.add_item(item(&format!("t{i:03}"), 0));
        }

        let items = builder.finish();
        assert_eq!(items.len(), crate::LIMIT);
        assert_eq!(
            items
                .iter()
                .filter(|i| i.replacement == "alpha")
                .count(),
            1
        );
    }
}
