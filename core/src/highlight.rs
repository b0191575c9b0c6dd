use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

/// Opening and closing strings wrapped around highlighted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markers {
    pub open: String,
    pub close: String,
}

impl Markers {
    pub fn new(open: &str, close: &str) -> Self {
        Self { open: open.to_string(), close: close.to_string() }
    }
}

impl Default for Markers {
    fn default() -> Self {
        Self::new("<mark>", "</mark>")
    }
}

#[derive(Debug, Clone)]
pub struct SnippetOptions {
    /// Character budget before markers are inserted.
    pub max_length: usize,
    pub context_words: usize,
    pub ellipsis: String,
    pub markers: Markers,
}

impl Default for SnippetOptions {
    fn default() -> Self {
        Self { max_length: 150, context_words: 10, ellipsis: "...".to_string(), markers: Markers::default() }
    }
}

/// Wrap each case-insensitive occurrence of any term in `markers`.
pub fn highlight_terms<S: AsRef<str>>(text: &str, terms: &[S], markers: &Markers) -> String {
    let mut terms: Vec<&str> = terms.iter().map(|t| t.as_ref().trim()).filter(|t| !t.is_empty()).collect();
    if terms.is_empty() {
        return text.to_string();
    }
    // longest first so a term wins over its own prefix
    terms.sort_by(|a, b| b.len().cmp(&a.len()));
    let alternation = terms.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
    let Ok(pat) = RegexBuilder::new(&alternation).case_insensitive(true).build() else {
        return text.to_string();
    };
    pat.replace_all(text, |caps: &regex::Captures| format!("{}{}{}", markers.open, &caps[0], markers.close))
        .into_owned()
}

/// Cut a window of words around the first term hit, then highlight it.
pub fn extract_snippet<S: AsRef<str>>(text: &str, terms: &[S], options: &SnippetOptions) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return String::new();
    }

    let lowered: Vec<String> = terms
        .iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    let hit = words.iter().position(|w| {
        let w = w.to_lowercase();
        lowered.iter().any(|t| w.contains(t.as_str()))
    });

    let ctx = options.context_words;
    let (start, end) = match hit {
        Some(pos) => (pos.saturating_sub(ctx), (pos + ctx + 1).min(words.len())),
        None => (0, (2 * ctx + 1).min(words.len())),
    };

    let mut snippet = words[start..end].join(" ");
    if start > 0 {
        snippet = format!("{}{}", options.ellipsis, snippet);
    }
    if end < words.len() {
        snippet.push_str(&options.ellipsis);
    }

    if snippet.chars().count() > options.max_length {
        let keep = options.max_length.saturating_sub(options.ellipsis.chars().count());
        snippet = snippet.chars().take(keep).collect::<String>();
        snippet.push_str(&options.ellipsis);
    }

    highlight_terms(&snippet, terms, &options.markers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_all_terms_case_insensitively() {
        let out = highlight_terms("Rust and RUST, rusty", &["rust"], &Markers::new("<em>", "</em>"));
        assert_eq!(out, "<em>Rust</em> and <em>RUST</em>, <em>rust</em>y");
    }

    #[test]
    fn longer_terms_win_and_specials_are_escaped() {
        let out = highlight_terms("c++ and c", &["c", "c++"], &Markers::default());
        assert_eq!(out, "<mark>c++</mark> and <mark>c</mark>");
        assert_eq!(highlight_terms("plain", &[" "], &Markers::default()), "plain");
    }

    #[test]
    fn snippet_windows_around_hit() {
        let text = "one two three four five six seven eight nine ten";
        let opts = SnippetOptions { context_words: 2, ..SnippetOptions::default() };
        assert_eq!(extract_snippet(text, &["six"], &opts), "...four five <mark>six</mark> seven eight...");
        assert_eq!(extract_snippet(text, &["missing"], &opts), "one two three four five...");
        assert_eq!(extract_snippet(text, &["ONE"], &opts), "<mark>one</mark> two three...");
    }

    #[test]
    fn snippet_truncates_to_max_length() {
        let text = "The quick brown fox jumps over the lazy dog near the riverbank at dawn";
        let opts = SnippetOptions { max_length: 30, ..SnippetOptions::default() };
        let out = extract_snippet(text, &["fox"], &opts);
        assert!(out.contains("..."));
        let plain = out.replace("<mark>", "").replace("</mark>", "");
        assert_eq!(plain.chars().count(), 30);
    }

    #[test]
    fn empty_text() {
        assert_eq!(extract_snippet("   ", &["x"], &SnippetOptions::default()), "");
    }
}
