//! BM25-ranked inverted index with per-field positional postings.

use crate::tokenizer::{default_stop_words, Analyzer, DefaultTokenizer, IdentityStemmer, Stemmer, Tokenizer};
use crate::{DocId, Document};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::marker::PhantomData;

pub const BM25_K1: f64 = 1.2;
pub const BM25_B: f64 = 0.75;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub field: String,
    /// Offsets into the field's analyzed token stream, strictly increasing.
    pub positions: Vec<usize>,
    /// `positions.len() / field length`
    pub tf: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub limit: usize,
    pub threshold: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { limit: 10, threshold: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<'a, D> {
    pub doc_id: DocId,
    pub doc: &'a D,
    pub score: f64,
}

pub struct SearchIndexBuilder<D> {
    fields: Option<Vec<String>>,
    field_weights: HashMap<String, f64>,
    tokenizer: Box<dyn Tokenizer + Send + Sync>,
    stemmer: Box<dyn Stemmer + Send + Sync>,
    stop_words: HashSet<String>,
    _doc: PhantomData<fn() -> D>,
}

impl<D: Document> SearchIndexBuilder<D> {
    /// Index only these fields. Without a field list every string field of each
    /// document is indexed. Repeated names are dropped, keeping the first.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let fields = fields
            .into_iter()
            .map(Into::into)
            .filter(|f: &String| seen.insert(f.clone()))
            .collect();
        self.fields = Some(fields);
        self
    }

    pub fn field_weight(mut self, field: &str, weight: f64) -> Self {
        self.field_weights.insert(field.to_string(), weight);
        self
    }

    pub fn field_weights(mut self, weights: HashMap<String, f64>) -> Self {
        self.field_weights.extend(weights);
        self
    }

    pub fn tokenizer<T: Tokenizer + Send + Sync + 'static>(mut self, tokenizer: T) -> Self {
        self.tokenizer = Box::new(tokenizer);
        self
    }

    pub fn stemmer<S: Stemmer + Send + Sync + 'static>(mut self, stemmer: S) -> Self {
        self.stemmer = Box::new(stemmer);
        self
    }

    pub fn stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_words = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> SearchIndex<D> {
        SearchIndex {
            fields: self.fields,
            field_weights: self.field_weights,
            analyzer: Analyzer::new(self.tokenizer, self.stemmer, self.stop_words),
            documents: BTreeMap::new(),
            postings: HashMap::new(),
            field_lengths: HashMap::new(),
            avg_field_lengths: HashMap::new(),
        }
    }
}

impl<D: Document> Default for SearchIndexBuilder<D> {
    fn default() -> Self {
        Self {
            fields: None,
            field_weights: HashMap::new(),
            tokenizer: Box::new(DefaultTokenizer),
            stemmer: Box::new(IdentityStemmer),
            stop_words: default_stop_words(),
            _doc: PhantomData,
        }
    }
}

/// Full-text index over caller documents keyed by [`DocId`].
///
/// Not synchronized: wrap it in [`crate::SharedIndex`] when several tasks need it.
/// Average field lengths are recomputed from the whole length table on each
/// mutation, which is linear in the document count.
#[derive(Debug)]
pub struct SearchIndex<D> {
    fields: Option<Vec<String>>,
    field_weights: HashMap<String, f64>,
    analyzer: Analyzer,
    documents: BTreeMap<DocId, D>,
    postings: HashMap<String, Vec<Posting>>,
    field_lengths: HashMap<String, HashMap<DocId, usize>>,
    avg_field_lengths: HashMap<String, f64>,
}

impl<D: Document> Default for SearchIndex<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Document> SearchIndex<D> {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> SearchIndexBuilder<D> {
        SearchIndexBuilder::default()
    }

    /// Index `doc` under `id`, replacing any document already stored there.
    pub fn add(&mut self, id: impl Into<DocId>, doc: D) {
        let id = id.into();
        if self.documents.contains_key(&id) {
            tracing::debug!(doc_id = %id, "replacing existing document");
            self.remove(&id);
        }

        let fields: Vec<String> = match &self.fields {
            Some(fields) => fields.clone(),
            None => doc.string_fields().into_iter().map(|(name, _)| name.to_string()).collect(),
        };

        for field in &fields {
            let Some(text) = doc.field(field) else { continue };
            let terms = self.analyzer.analyze(text);
            let len = terms.len();

            let mut positions: BTreeMap<String, Vec<usize>> = BTreeMap::new();
            for (pos, term) in terms.into_iter().enumerate() {
                positions.entry(term).or_default().push(pos);
            }
            for (term, positions) in positions {
                let tf = positions.len() as f64 / len as f64;
                self.postings.entry(term).or_default().push(Posting {
                    doc_id: id.clone(),
                    field: field.clone(),
                    positions,
                    tf,
                });
            }

            self.field_lengths.entry(field.clone()).or_default().insert(id.clone(), len);
            self.recompute_average(field);
        }

        tracing::debug!(doc_id = %id, fields = fields.len(), "indexed document");
        self.documents.insert(id, doc);
    }

    pub fn add_all<I, K>(&mut self, docs: I)
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<DocId>,
    {
        for (id, doc) in docs {
            self.add(id, doc);
        }
    }

    /// Drop a document with all of its postings. Returns false if `id` was unknown.
    pub fn remove(&mut self, id: &DocId) -> bool {
        if self.documents.remove(id).is_none() {
            return false;
        }

        self.postings.retain(|_, list| {
            list.retain(|p| &p.doc_id != id);
            !list.is_empty()
        });

        let mut touched = Vec::new();
        self.field_lengths.retain(|field, lengths| {
            if lengths.remove(id).is_some() {
                touched.push(field.clone());
            }
            !lengths.is_empty()
        });
        for field in &touched {
            self.recompute_average(field);
        }

        tracing::debug!(doc_id = %id, "removed document");
        true
    }

    pub fn search(&self, query: &str, options: SearchOptions) -> Vec<SearchHit<'_, D>> {
        let terms = self.analyzer.analyze(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let n = self.documents.len() as f64;
        let mut scores: HashMap<&DocId, f64> = HashMap::new();
        for term in &terms {
            let Some(postings) = self.postings.get(term) else { continue };
            let df = postings.iter().map(|p| &p.doc_id).collect::<HashSet<_>>().len() as f64;
            if df == 0.0 {
                continue;
            }
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();

            for p in postings {
                let field_len = self.field_length(&p.field, &p.doc_id).unwrap_or(0) as f64;
                let avg = self.average_field_length(&p.field);
                let norm = if avg > 0.0 { field_len / avg } else { 1.0 };
                let weight = self.field_weights.get(&p.field).copied().unwrap_or(1.0);
                let score = idf * (p.tf * (BM25_K1 + 1.0))
                    / (p.tf + BM25_K1 * (1.0 - BM25_B + BM25_B * norm))
                    * weight;
                *scores.entry(&p.doc_id).or_insert(0.0) += score;
            }
        }

        let mut ranked: Vec<(&DocId, f64)> = scores
            .into_iter()
            .filter(|(_, score)| *score > 0.0 && *score >= options.threshold)
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        ranked.truncate(options.limit);

        tracing::debug!(query, terms = terms.len(), hits = ranked.len(), "search");
        ranked
            .into_iter()
            .filter_map(|(id, score)| {
                self.documents.get(id).map(|doc| SearchHit { doc_id: id.clone(), doc, score })
            })
            .collect()
    }

    pub fn get(&self, id: &DocId) -> Option<&D> {
        self.documents.get(id)
    }

    /// All documents in id order.
    pub fn get_all(&self) -> Vec<(&DocId, &D)> {
        self.documents.iter().collect()
    }

    pub fn clear(&mut self) {
        self.documents.clear();
        self.postings.clear();
        self.field_lengths.clear();
        self.avg_field_lengths.clear();
        tracing::debug!("cleared index");
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    /// Postings for an already analyzed term.
    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn field_length(&self, field: &str, id: &DocId) -> Option<usize> {
        self.field_lengths.get(field).and_then(|lengths| lengths.get(id)).copied()
    }

    pub fn average_field_length(&self, field: &str) -> f64 {
        self.avg_field_lengths.get(field).copied().unwrap_or(0.0)
    }

    fn recompute_average(&mut self, field: &str) {
        match self.field_lengths.get(field) {
            Some(lengths) if !lengths.is_empty() => {
                let total: usize = lengths.values().sum();
                self.avg_field_lengths.insert(field.to_string(), total as f64 / lengths.len() as f64);
            }
            _ => {
                self.avg_field_lengths.remove(field);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn content_index() -> SearchIndex<Value> {
        let mut index = SearchIndex::builder().fields(["content"]).build();
        index.add(1, json!({"content": "Learn JavaScript programming"}));
        index.add(2, json!({"content": "TypeScript is typed JavaScript"}));
        index.add(3, json!({"content": "Python basics"}));
        index
    }

    #[test]
    fn positions_and_tf() {
        let mut index: SearchIndex<Value> = SearchIndex::new();
        index.add(1, json!({"body": "rust loves rust and speed"}));
        let postings = index.postings("rust");
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].positions, vec![0, 2]);
        // "and" is a stop word, leaving four tokens
        assert_eq!(index.field_length("body", &DocId::Int(1)), Some(4));
        assert!((postings[0].tf - 0.5).abs() < 1e-12);
    }

    #[test]
    fn averages_follow_mutation() {
        let mut index = content_index();
        // 3, 3 ("is" dropped), 2
        assert!((index.average_field_length("content") - 8.0 / 3.0).abs() < 1e-12);
        index.remove(&DocId::Int(3));
        assert!((index.average_field_length("content") - 3.0).abs() < 1e-12);
    }

    #[test]
    fn readd_replaces_postings() {
        let mut index = content_index();
        let scored = |index: &SearchIndex<Value>| -> Vec<(DocId, f64)> {
            index
                .search("javascript", SearchOptions::default())
                .into_iter()
                .map(|h| (h.doc_id, h.score))
                .collect()
        };
        let before = scored(&index);
        index.add(1, json!({"content": "Learn JavaScript programming"}));
        let after = scored(&index);
        assert_eq!(index.postings("javascript").len(), 2);
        assert_eq!(before, after);
    }

    #[test]
    fn ties_break_by_id() {
        let mut index: SearchIndex<Value> = SearchIndex::builder().fields(["t"]).build();
        index.add("b", json!({"t": "alpha beta"}));
        index.add("a", json!({"t": "alpha beta"}));
        index.add(7, json!({"t": "alpha beta"}));
        let ids: Vec<DocId> = index.search("alpha", SearchOptions::default()).into_iter().map(|h| h.doc_id).collect();
        assert_eq!(ids, vec![DocId::Int(7), DocId::from("a"), DocId::from("b")]);
    }

    #[test]
    fn field_weights_shift_ranking() {
        let mut index: SearchIndex<Value> = SearchIndex::builder()
            .fields(["title", "body"])
            .field_weight("title", 5.0)
            .field_weight("unknown", 100.0)
            .build();
        index.add(1, json!({"title": "Other", "body": "rust guide"}));
        index.add(2, json!({"title": "Rust", "body": "other guide"}));
        let hits = index.search("rust", SearchOptions::default());
        assert_eq!(hits[0].doc_id, DocId::Int(2));
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn repeated_fields_index_once() {
        let mut single: SearchIndex<Value> = SearchIndex::builder().fields(["t"]).build();
        let mut repeated: SearchIndex<Value> = SearchIndex::builder().fields(["t", "t"]).build();
        for index in [&mut single, &mut repeated] {
            index.add(1, json!({"t": "alpha beta"}));
            index.add(2, json!({"t": "gamma"}));
        }
        assert_eq!(repeated.postings("alpha").len(), 1);
        assert_eq!(repeated.field_length("t", &DocId::Int(1)), Some(2));
        let a = single.search("alpha", SearchOptions::default());
        let b = repeated.search("alpha", SearchOptions::default());
        assert!((a[0].score - b[0].score).abs() < 1e-12);
    }

    #[test]
    fn auto_detects_string_fields() {
        let mut index: SearchIndex<Value> = SearchIndex::new();
        index.add(1, json!({"name": "Widget", "count": 4, "note": "shiny gadget"}));
        assert_eq!(index.search("gadget", SearchOptions::default()).len(), 1);
        assert_eq!(index.field_length("count", &DocId::Int(1)), None);
    }

    #[test]
    fn threshold_and_limit() {
        let index = content_index();
        let all = index.search("javascript", SearchOptions::default());
        let top = index.search("javascript", SearchOptions { limit: 1, threshold: 0.0 });
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].doc_id, all[0].doc_id);
        let none = index.search("javascript", SearchOptions { limit: 10, threshold: 1e9 });
        assert!(none.is_empty());
    }

    #[test]
    fn stop_word_query_is_empty() {
        let index = content_index();
        assert!(index.search("the and of", SearchOptions::default()).is_empty());
    }

    #[test]
    fn clear_resets_everything() {
        let mut index = content_index();
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.term_count(), 0);
        assert_eq!(index.average_field_length("content"), 0.0);
        assert!(!index.remove(&DocId::Int(1)));
    }
}
