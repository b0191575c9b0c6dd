use crate::{Document, SearchIndex};
use std::collections::HashSet;

/// Fraction of query words that occur as whole words in `text`.
pub fn calculate_relevance(query: &str, text: &str) -> f64 {
    let query = query.to_lowercase();
    let words: Vec<&str> = query.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let text = text.to_lowercase();
    let tokens: HashSet<&str> = text.split_whitespace().collect();
    let found = words.iter().filter(|w| tokens.contains(*w)).count();
    found as f64 / words.len() as f64
}

/// Completions for a partial query drawn from every string field of every
/// indexed document, shortest first.
pub fn suggest_queries<D: Document>(partial: &str, index: &SearchIndex<D>, limit: usize) -> Vec<String> {
    let prefix = partial.trim().to_lowercase();
    if prefix.is_empty() {
        return Vec::new();
    }
    let prefix_len = prefix.chars().count();

    let mut seen: HashSet<String> = HashSet::new();
    for (_, doc) in index.get_all() {
        for (_, text) in doc.string_fields() {
            for word in text.split_whitespace() {
                let word = word.to_lowercase();
                if word.starts_with(&prefix) && word.chars().count() > prefix_len {
                    seen.insert(word);
                }
            }
        }
    }

    let mut suggestions: Vec<String> = seen.into_iter().collect();
    suggestions.sort_by(|a, b| a.chars().count().cmp(&b.chars().count()).then_with(|| a.cmp(b)));
    suggestions.truncate(limit);
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn relevance_fraction() {
        assert_eq!(calculate_relevance("rust search", "Fast Rust code"), 0.5);
        assert_eq!(calculate_relevance("RUST", "rust"), 1.0);
        assert_eq!(calculate_relevance("   ", "rust"), 0.0);
        // whole words only
        assert_eq!(calculate_relevance("rus", "rust"), 0.0);
    }

    #[test]
    fn suggestions_are_prefix_matches_by_length() {
        let mut index: SearchIndex<Value> = SearchIndex::new();
        index.add(1, json!({"title": "Typed TypeScript types", "n": 5}));
        index.add(2, json!({"title": "Type systems", "body": "typography"}));
        let s = suggest_queries("typ", &index, 10);
        assert_eq!(s, vec!["type", "typed", "types", "typescript", "typography"]);
        assert_eq!(suggest_queries("typ", &index, 2), vec!["type", "typed"]);
        assert!(suggest_queries("type", &index, 10).iter().all(|w| w != "type"));
        assert!(suggest_queries("", &index, 10).is_empty());
    }
}
