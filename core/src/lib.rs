//! In-process search for the site command palette: a BM25 inverted index over
//! site documents plus fuzzy matching for static command labels.

pub mod config;
pub mod document;
pub mod fuzzy;
pub mod highlight;
pub mod index;
pub mod manifest;
pub mod relevance;
pub mod sync;
pub mod tokenizer;

pub use config::IndexConfig;
pub use document::{DocId, Document};
pub use fuzzy::{
    fuzzy_match, fuzzy_search, fuzzy_search_by, fuzzy_search_multi_key, fuzzy_search_objects, FuzzyMatch,
    FuzzyOptions, FuzzySearchOptions, ObjectMatch,
};
pub use highlight::{extract_snippet, highlight_terms, Markers, SnippetOptions};
pub use index::{Posting, SearchHit, SearchIndex, SearchIndexBuilder, SearchOptions};
pub use manifest::{load_manifest, load_manifest_dir, ManifestEntry};
pub use relevance::{calculate_relevance, suggest_queries};
pub use sync::{OwnedHit, SharedIndex};
