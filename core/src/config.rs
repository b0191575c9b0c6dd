use crate::tokenizer::{EnglishStemmer, IdentityStemmer, NfkcTokenizer, DefaultTokenizer};
use crate::{Document, SearchIndex};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemmerKind {
    #[default]
    None,
    English,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerKind {
    #[default]
    Default,
    Nfkc,
}

/// Serializable index settings, e.g. loaded from `search.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Fields to index; `None` indexes every string field.
    pub fields: Option<Vec<String>>,
    pub field_weights: HashMap<String, f64>,
    /// Replaces the built-in stop-word list when set.
    pub stop_words: Option<Vec<String>>,
    pub stemmer: StemmerKind,
    pub tokenizer: TokenizerKind,
}

impl IndexConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading index config {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("parsing index config {}", path.display()))?;
        Ok(config)
    }

    pub fn build<D: Document>(&self) -> SearchIndex<D> {
        let mut builder = SearchIndex::builder().field_weights(self.field_weights.clone());
        if let Some(fields) = &self.fields {
            builder = builder.fields(fields.iter().cloned());
        }
        if let Some(words) = &self.stop_words {
            builder = builder.stop_words(words.iter().cloned());
        }
        builder = match self.stemmer {
            StemmerKind::None => builder.stemmer(IdentityStemmer),
            StemmerKind::English => builder.stemmer(EnglishStemmer),
        };
        builder = match self.tokenizer {
            TokenizerKind::Default => builder.tokenizer(DefaultTokenizer),
            TokenizerKind::Nfkc => builder.tokenizer(NfkcTokenizer),
        };
        builder.build()
    }
}
