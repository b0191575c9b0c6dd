use palette_core::{
    extract_snippet, fuzzy_match, load_manifest, suggest_queries, DocId, FuzzyOptions, ManifestEntry, SearchIndex,
    SearchOptions, SnippetOptions,
};
use serde_json::{json, Value};

fn ids(index: &SearchIndex<Value>, query: &str) -> Vec<DocId> {
    index.search(query, SearchOptions::default()).into_iter().map(|h| h.doc_id).collect()
}

#[test]
fn bm25_ranks_only_matching_documents() {
    let mut index: SearchIndex<Value> = SearchIndex::builder().fields(["content"]).build();
    index.add(1, json!({"content": "Learn JavaScript programming"}));
    index.add(2, json!({"content": "TypeScript is typed JavaScript"}));
    index.add(3, json!({"content": "Python basics"}));

    let hits = index.search("javascript", SearchOptions::default());
    let mut found: Vec<DocId> = hits.iter().map(|h| h.doc_id.clone()).collect();
    found.sort();
    assert_eq!(found, vec![DocId::Int(1), DocId::Int(2)]);
    assert!(hits.iter().all(|h| h.score > 0.0));
}

#[test]
fn title_scenario() {
    let mut index: SearchIndex<Value> = SearchIndex::builder().fields(["title"]).build();
    index.add_all(vec![
        (1, json!({"id": 1, "title": "Hello World"})),
        (2, json!({"id": 2, "title": "JavaScript Guide"})),
        (3, json!({"id": 3, "title": "TypeScript Tutorial"})),
    ]);
    let hits = index.search("typescript", SearchOptions::default());
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].doc_id, DocId::Int(3));
    assert_eq!(hits[0].doc["title"], "TypeScript Tutorial");
    assert!(hits[0].score > 0.0);
    assert!(index.search("", SearchOptions::default()).is_empty());
}

#[test]
fn add_then_remove_round_trip() {
    let mut index: SearchIndex<Value> = SearchIndex::new();
    index.add("intro", json!({"title": "Intro to search", "body": "inverted index basics"}));
    index.add("other", json!({"title": "Other page"}));
    assert!(index.remove(&DocId::from("intro")));
    assert!(index.get(&DocId::from("intro")).is_none());
    for term in ["intro", "search", "inverted", "index", "basics"] {
        assert!(ids(&index, term).is_empty(), "{term} still matches");
    }
    assert!(index.postings("inverted").is_empty());
    assert!(!index.remove(&DocId::from("intro")));
    assert_eq!(index.len(), 1);
}

#[test]
fn jquery_matches_first_two_characters() {
    let r = fuzzy_match("jq", "jQuery", &FuzzyOptions::default()).unwrap();
    assert_eq!(r.matches, vec![0, 1]);
}

#[test]
fn matched_indices_spell_the_query() {
    let cases = [("opf", "Open File"), ("tgth", "toggle-theme"), ("GS", "getStarted"), ("ürn", "Über den Rand")];
    for (q, t) in cases {
        let r = fuzzy_match(q, t, &FuzzyOptions::default()).unwrap();
        let chars: Vec<char> = t.chars().collect();
        let picked: String = r.matches.iter().map(|&i| chars[i]).collect();
        assert_eq!(picked.to_lowercase(), q.to_lowercase());
        assert!(r.matches.windows(2).all(|w| w[0] < w[1]));
        assert!((0.0..=1.0).contains(&r.score));
    }
}

#[test]
fn exact_match_outscores_gapped_and_separated_targets() {
    let exact = fuzzy_match("abcd", "abcd", &FuzzyOptions::default()).unwrap().score;
    for t in ["abdc", "xabc", "a-bcd", "ab_cd", "abcdx"] {
        if let Some(r) = fuzzy_match("abcd", t, &FuzzyOptions::default()) {
            assert!(exact > r.score, "{t}");
        }
    }
    // a camelCase boundary earns its own bonus on top of an otherwise exact match
    let camel = fuzzy_match("abcd", "aBcd", &FuzzyOptions::default()).unwrap().score;
    assert!((camel - 0.85).abs() < 1e-9);
    assert!(camel > exact);
}

#[test]
fn snippet_ellipsis_when_window_exceeds_max_length() {
    let long_text = "Search engines build an inverted index that maps every term to the documents \
        containing it, and ranking functions such as BM25 combine term frequency with document length.";
    let out = extract_snippet(long_text, &["ranking"], &SnippetOptions { max_length: 30, ..SnippetOptions::default() });
    assert!(out.contains("..."));
}

#[test]
fn manifest_entries_are_searchable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("search-manifest.json");
    std::fs::write(
        &path,
        r#"[
            {"id": "posts/bm25", "title": "Ranking with BM25", "description": "How scoring works", "category": "blog", "url": "/posts/bm25", "tags": ["search", "ranking"]},
            {"id": "about", "title": "About us", "description": "The team", "category": "page", "url": "/about", "tags": []}
        ]"#,
    )
    .unwrap();
    let entries = load_manifest(&path).unwrap();
    let mut index: SearchIndex<ManifestEntry> = SearchIndex::builder()
        .fields(["title", "description", "tags"])
        .field_weight("title", 2.0)
        .build();
    index.add_all(entries.into_iter().map(|e| (e.id.clone(), e)));

    let hits = index.search("ranking", SearchOptions::default());
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].doc.url.as_deref(), Some("/posts/bm25"));
    assert_eq!(suggest_queries("rank", &index, 5), vec!["ranking"]);
}
