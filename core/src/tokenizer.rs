use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer as SnowballStemmer};
use unicode_normalization::UnicodeNormalization;
use std::collections::HashSet;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"\W+").expect("valid regex");
    static ref ENGLISH: SnowballStemmer = SnowballStemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","an","and","are","as","at",
            "be","by",
            "for","from",
            "has","he",
            "in","is","it","its",
            "of","on","or",
            "that","the","to",
            "was","were","will","with",
        ];
        words.iter().copied().collect()
    };
}

/// Splits raw field text into tokens.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

impl<F> Tokenizer for F
where
    F: Fn(&str) -> Vec<String>,
{
    fn tokenize(&self, text: &str) -> Vec<String> {
        self(text)
    }
}

/// Reduces a token to its root form.
pub trait Stemmer {
    fn stem(&self, token: &str) -> String;
}

impl<F> Stemmer for F
where
    F: Fn(&str) -> String,
{
    fn stem(&self, token: &str) -> String {
        self(token)
    }
}

/// Lowercase, replace non-word characters with spaces, split on whitespace and
/// drop single-character tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTokenizer;

impl Tokenizer for DefaultTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        NON_WORD
            .replace_all(&lowered, " ")
            .split_whitespace()
            .filter(|t| t.chars().count() > 1)
            .map(str::to_string)
            .collect()
    }
}

/// Same rules as [`DefaultTokenizer`] after NFKC normalization, so ligatures and
/// full-width forms collapse onto their plain spellings.
#[derive(Debug, Clone, Copy, Default)]
pub struct NfkcTokenizer;

impl Tokenizer for NfkcTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = text.nfkc().collect::<String>();
        DefaultTokenizer.tokenize(&normalized)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityStemmer;

impl Stemmer for IdentityStemmer {
    fn stem(&self, token: &str) -> String {
        token.to_string()
    }
}

/// Snowball English stemmer.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishStemmer;

impl Stemmer for EnglishStemmer {
    fn stem(&self, token: &str) -> String {
        ENGLISH.stem(token).into_owned()
    }
}

pub fn default_stop_words() -> HashSet<String> {
    STOPWORDS.iter().map(|w| w.to_string()).collect()
}

/// Tokenize, drop stop words, then stem. Indexed text and queries both go
/// through the same analyzer.
pub struct Analyzer {
    tokenizer: Box<dyn Tokenizer + Send + Sync>,
    stemmer: Box<dyn Stemmer + Send + Sync>,
    stop_words: HashSet<String>,
}

impl Analyzer {
    pub fn new(
        tokenizer: Box<dyn Tokenizer + Send + Sync>,
        stemmer: Box<dyn Stemmer + Send + Sync>,
        stop_words: HashSet<String>,
    ) -> Self {
        Self { tokenizer, stemmer, stop_words }
    }

    pub fn analyze(&self, text: &str) -> Vec<String> {
        self.tokenizer
            .tokenize(text)
            .into_iter()
            .filter(|t| !self.stop_words.contains(t))
            .map(|t| self.stemmer.stem(&t))
            .collect()
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(Box::new(DefaultTokenizer), Box::new(IdentityStemmer), default_stop_words())
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("stop_words", &self.stop_words.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = DefaultTokenizer.tokenize("Hello, World! a-b c.d x");
        assert_eq!(t, vec!["hello", "world"]);
    }

    #[test]
    fn english_stemming() {
        assert_eq!(EnglishStemmer.stem("running"), "run");
    }

    #[test]
    fn closures_plug_in() {
        let analyzer = Analyzer::new(
            Box::new(|text: &str| text.split(',').map(|s| s.trim().to_string()).collect::<Vec<_>>()),
            Box::new(|t: &str| t.to_uppercase()),
            HashSet::new(),
        );
        assert_eq!(analyzer.analyze("ab, cd"), vec!["AB", "CD"]);
    }
}
