//! Subsequence fuzzy matching for short command-style queries.
//!
//! A query matches when its characters occur in the target in order. The score
//! blends five signals: coverage of the target, the longest consecutive run,
//! a prefix bonus, word-boundary hits and a penalty for widely spread matches.
//! All indices are character indices into the target.

use crate::highlight::Markers;
use crate::Document;
use serde::Serialize;

const COVERAGE_WEIGHT: f64 = 0.3;
const CONSECUTIVE_WEIGHT: f64 = 0.3;
const PREFIX_BONUS: f64 = 0.15;
const BOUNDARY_BONUS: f64 = 0.05;
const MAX_BOUNDARY_BONUS: f64 = 0.2;
const SPREAD_PENALTY: f64 = 0.01;
const MAX_SPREAD_PENALTY: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct FuzzyOptions {
    pub case_sensitive: bool,
    /// Minimum score a match needs to be reported.
    pub threshold: f64,
    pub markers: Markers,
}

impl Default for FuzzyOptions {
    fn default() -> Self {
        Self { case_sensitive: false, threshold: 0.0, markers: Markers::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzyMatch {
    pub item: String,
    pub score: f64,
    pub matches: Vec<usize>,
    pub highlighted: String,
}

#[derive(Debug, Clone)]
pub struct FuzzySearchOptions {
    pub fuzzy: FuzzyOptions,
    pub sort: bool,
    pub limit: Option<usize>,
}

impl Default for FuzzySearchOptions {
    fn default() -> Self {
        Self { fuzzy: FuzzyOptions::default(), sort: true, limit: None }
    }
}

impl FuzzySearchOptions {
    pub fn with_threshold(threshold: f64) -> Self {
        Self { fuzzy: FuzzyOptions { threshold, ..FuzzyOptions::default() }, ..Self::default() }
    }
}

/// A fuzzy match against one field of a caller item.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMatch<'a, T> {
    pub result: FuzzyMatch,
    /// Key that produced the best score, when several keys were searched.
    pub key: Option<String>,
    pub original: &'a T,
}

fn fold(c: char, case_sensitive: bool) -> char {
    if case_sensitive {
        c
    } else {
        c.to_lowercase().next().unwrap_or(c)
    }
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '_' | '.' | '/')
}

fn is_word_boundary(target: &[char], idx: usize) -> bool {
    if idx == 0 {
        return true;
    }
    let prev = target[idx - 1];
    is_separator(prev) || (target[idx].is_uppercase() && prev.is_lowercase())
}

fn score_matches(target: &[char], matches: &[usize], query_len: usize) -> f64 {
    let coverage = matches.len() as f64 / target.len() as f64;

    let mut longest = 1;
    let mut run = 1;
    for pair in matches.windows(2) {
        if pair[1] == pair[0] + 1 {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 1;
        }
    }
    let consecutive = longest as f64 / query_len as f64;

    let mut score = coverage * COVERAGE_WEIGHT + consecutive * CONSECUTIVE_WEIGHT;
    if matches[0] == 0 {
        score += PREFIX_BONUS;
    }

    let boundaries = matches.iter().filter(|&&i| is_word_boundary(target, i)).count();
    score += (boundaries as f64 * BOUNDARY_BONUS).min(MAX_BOUNDARY_BONUS);

    let spread = matches[matches.len() - 1] - matches[0];
    if spread > 2 * query_len {
        let excess = (spread - 2 * query_len) as f64;
        score -= (excess * SPREAD_PENALTY).min(MAX_SPREAD_PENALTY);
    }

    score.clamp(0.0, 1.0)
}

fn highlight(target: &[char], matches: &[usize], markers: &Markers) -> String {
    let mut out = String::with_capacity(target.len() + matches.len() * (markers.open.len() + markers.close.len()));
    let mut next = matches.iter().peekable();
    for (i, &c) in target.iter().enumerate() {
        if next.peek() == Some(&&i) {
            next.next();
            out.push_str(&markers.open);
            out.push(c);
            out.push_str(&markers.close);
        } else {
            out.push(c);
        }
    }
    out
}

/// Match `query` as a subsequence of `target`.
///
/// An empty query matches any non-empty target with score 1. `None` when the
/// target is empty, the query cannot be a subsequence, or the score falls
/// below `options.threshold`.
pub fn fuzzy_match(query: &str, target: &str, options: &FuzzyOptions) -> Option<FuzzyMatch> {
    let original: Vec<char> = target.chars().collect();
    if original.is_empty() {
        return None;
    }
    let q: Vec<char> = query.chars().map(|c| fold(c, options.case_sensitive)).collect();
    if q.is_empty() {
        return Some(FuzzyMatch {
            item: target.to_string(),
            score: 1.0,
            matches: Vec::new(),
            highlighted: target.to_string(),
        });
    }
    if q.len() > original.len() {
        return None;
    }

    let mut matches = Vec::with_capacity(q.len());
    let mut qi = 0;
    for (ti, &c) in original.iter().enumerate() {
        if fold(c, options.case_sensitive) == q[qi] {
            matches.push(ti);
            qi += 1;
            if qi == q.len() {
                break;
            }
        }
    }
    if qi < q.len() {
        return None;
    }

    let score = score_matches(&original, &matches, q.len());
    if score < options.threshold {
        return None;
    }

    let highlighted = highlight(&original, &matches, &options.markers);
    Some(FuzzyMatch { item: target.to_string(), score, matches, highlighted })
}

fn finish<R>(mut results: Vec<R>, options: &FuzzySearchOptions, score: impl Fn(&R) -> f64) -> Vec<R> {
    if options.sort {
        results.sort_by(|a, b| score(b).partial_cmp(&score(a)).unwrap_or(std::cmp::Ordering::Equal));
    }
    if let Some(limit) = options.limit {
        results.truncate(limit);
    }
    results
}

pub fn fuzzy_search<S: AsRef<str>>(query: &str, items: &[S], options: &FuzzySearchOptions) -> Vec<FuzzyMatch> {
    let results: Vec<FuzzyMatch> = items
        .iter()
        .filter_map(|item| fuzzy_match(query, item.as_ref(), &options.fuzzy))
        .collect();
    finish(results, options, |m: &FuzzyMatch| m.score)
}

/// Fuzzy search over items through a text accessor. Items without text are skipped.
pub fn fuzzy_search_by<'a, T, F>(
    query: &str,
    items: &'a [T],
    key: F,
    options: &FuzzySearchOptions,
) -> Vec<ObjectMatch<'a, T>>
where
    F: Fn(&T) -> Option<String>,
{
    let results: Vec<ObjectMatch<'a, T>> = items
        .iter()
        .filter_map(|item| {
            let text = key(item)?;
            let result = fuzzy_match(query, &text, &options.fuzzy)?;
            Some(ObjectMatch { result, key: None, original: item })
        })
        .collect();
    finish(results, options, |m: &ObjectMatch<'a, T>| m.result.score)
}

pub fn fuzzy_search_objects<'a, T: Document>(
    query: &str,
    items: &'a [T],
    key: &str,
    options: &FuzzySearchOptions,
) -> Vec<ObjectMatch<'a, T>> {
    fuzzy_search_by(query, items, |item| item.field(key).map(str::to_string), options)
}

/// Match every listed key and keep the best `score * weight` per item.
pub fn fuzzy_search_multi_key<'a, T: Document>(
    query: &str,
    items: &'a [T],
    keys: &[(&str, f64)],
    options: &FuzzySearchOptions,
) -> Vec<ObjectMatch<'a, T>> {
    let results: Vec<ObjectMatch<'a, T>> = items
        .iter()
        .filter_map(|item| {
            let mut best: Option<ObjectMatch<'a, T>> = None;
            for &(key, weight) in keys {
                let Some(text) = item.field(key) else { continue };
                let Some(mut result) = fuzzy_match(query, text, &options.fuzzy) else { continue };
                result.score *= weight;
                if best.as_ref().map_or(true, |b| result.score > b.result.score) {
                    best = Some(ObjectMatch { result, key: Some(key.to_string()), original: item });
                }
            }
            best
        })
        .collect();
    finish(results, options, |m: &ObjectMatch<'a, T>| m.result.score)
}
