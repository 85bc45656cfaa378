//! Unsupervised keyword extraction.
//!
//! Scores single terms from local text statistics and then ranks n-gram
//! candidates built from them, in the manner of YAKE. No corpus or model is
//! needed, which suits scoring one scraped page at a time.
//!
//! # Term features
//!
//! | Feature | Meaning |
//! |---------|---------|
//! | casing | how often the term is an acronym or capitalised mid-sentence |
//! | position | median index of the sentences containing it (earlier is better) |
//! | frequency | term frequency normalised by mean + standard deviation |
//! | relatedness | diversity of its left/right neighbours (high means generic) |
//! | spread | share of sentences the term appears in |
//!
//! Combined term weight (lower is more important):
//!
//! ```text
//! H = relatedness * position / (casing + frequency / relatedness + spread / relatedness)
//! ```
//!
//! A candidate of terms `t1..tn` occurring `tf` times scores
//! `prod(H) / (tf * (1 + sum(H)))` over its non-stopword terms. Candidates
//! are then walked best first, dropping any too similar to one already kept.

mod stopwords;

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use strsim::normalized_levenshtein;
use tracing::{debug, warn};

static SENTENCE_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+(?:\s+|$)|[\r\n]+").unwrap());

// Words start and end alphanumeric; any other non-space char is punctuation.
static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{L}\p{N}](?:[\p{L}\p{N}'’_-]*[\p{L}\p{N}])?|[^\p{L}\p{N}\s]").unwrap()
});

/// A ranked keyword; lower scores are more relevant.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    /// Lowercased keyword text, words separated by single spaces.
    pub text: String,
    pub score: f64,
}

/// Statistical keyword extractor.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    max_ngram: usize,
    dedup_threshold: f64,
    top: usize,
    stopwords: &'static HashSet<&'static str>,
}

struct Token {
    key: String,
    sentence: usize,
    first_in_sentence: bool,
    acronym: bool,
    capitalized: bool,
}

#[derive(Default)]
struct TermStats<'t> {
    tf: f64,
    tf_acronym: f64,
    tf_upper: f64,
    sentences: Vec<usize>,
    left: HashSet<&'t str>,
    left_total: f64,
    right: HashSet<&'t str>,
    right_total: f64,
}

struct Candidate<'t> {
    tf: f64,
    terms: Vec<&'t str>,
}

impl KeywordExtractor {
    /// Build an extractor.
    ///
    /// * `language` - stopword language; unknown languages fall back to English
    /// * `max_ngram` - longest keyword, in words (clamped to at least 1)
    /// * `dedup_threshold` - similarity above which a candidate counts as a
    ///   duplicate of a better one; `1.0` or more disables deduplication
    /// * `top` - maximum number of keywords returned
    pub fn new(language: &str, max_ngram: usize, dedup_threshold: f64, top: usize) -> Self {
        let stopwords = stopwords::for_language(language).unwrap_or_else(|| {
            warn!(%language, "No stopword list for language; falling back to English");
            stopwords::english()
        });
        Self {
            max_ngram: max_ngram.max(1),
            dedup_threshold,
            top,
            stopwords,
        }
    }

    /// Extract up to `top` keywords from `text`, most relevant first.
    pub fn extract(&self, text: &str) -> Vec<Keyword> {
        let (tokens, chunks, sentence_count) = tokenize(text);
        if tokens.is_empty() || self.top == 0 {
            return Vec::new();
        }

        let stats = term_stats(&tokens, &chunks);
        let weights = self.term_weights(&stats, sentence_count);

        let mut candidates: HashMap<String, Candidate<'_>> = HashMap::new();
        for chunk in &chunks {
            for start in 0..chunk.len() {
                let first = tokens[chunk[start]].key.as_str();
                if self.is_stopword(first) || is_number(first) {
                    continue;
                }
                for end in start + 1..=(start + self.max_ngram).min(chunk.len()) {
                    let last = tokens[chunk[end - 1]].key.as_str();
                    if is_number(last) {
                        break;
                    }
                    if self.is_stopword(last) {
                        continue;
                    }
                    let terms: Vec<&str> = chunk[start..end]
                        .iter()
                        .map(|&i| tokens[i].key.as_str())
                        .collect();
                    candidates
                        .entry(terms.join(" "))
                        .or_insert_with(|| Candidate { tf: 0.0, terms })
                        .tf += 1.0;
                }
            }
        }

        let mut ranked: Vec<Keyword> = candidates
            .into_iter()
            .map(|(text, candidate)| {
                let (product, sum) = candidate
                    .terms
                    .iter()
                    .filter(|term| !self.is_stopword(term))
                    .fold((1.0, 0.0), |(p, s), term| {
                        let h = weights.get(term).copied().unwrap_or(1.0);
                        (p * h, s + h)
                    });
                let score = product / (candidate.tf * (1.0 + sum));
                Keyword { text, score }
            })
            .collect();
        ranked.sort_by(|a, b| a.score.total_cmp(&b.score).then_with(|| a.text.cmp(&b.text)));

        debug!(
            tokens = tokens.len(),
            sentences = sentence_count,
            candidates = ranked.len(),
            "Scored keyword candidates"
        );
        dedup(ranked, self.dedup_threshold, self.top)
    }

    fn is_stopword(&self, key: &str) -> bool {
        key.chars().count() < 3 || self.stopwords.contains(key)
    }

    fn term_weights<'t>(
        &self,
        stats: &HashMap<&'t str, TermStats<'t>>,
        sentence_count: usize,
    ) -> HashMap<&'t str, f64> {
        let valid_tfs: Vec<f64> = stats
            .iter()
            .filter(|(term, _)| !self.is_stopword(term))
            .map(|(_, s)| s.tf)
            .collect();
        let (mean, std) = mean_std(&valid_tfs);
        let max_tf = stats.values().map(|s| s.tf).fold(1.0, f64::max);
        let sentence_count = sentence_count.max(1) as f64;

        stats
            .iter()
            .map(|(term, s)| {
                let casing = s.tf_acronym.max(s.tf_upper) / (1.0 + s.tf.ln());
                let position = (3.0 + median(&s.sentences)).ln().ln();
                let frequency = if mean + std > 0.0 { s.tf / (mean + std) } else { s.tf };
                let left = if s.left_total > 0.0 { s.left.len() as f64 / s.left_total } else { 0.0 };
                let right = if s.right_total > 0.0 { s.right.len() as f64 / s.right_total } else { 0.0 };
                let relatedness = 1.0 + (left + right) * (s.tf / max_tf);
                let distinct_sentences = s.sentences.iter().collect::<HashSet<_>>().len() as f64;
                let spread = distinct_sentences / sentence_count;

                let h = (relatedness * position)
                    / (casing + frequency / relatedness + spread / relatedness);
                (*term, h)
            })
            .collect()
    }
}

/// Split text into word tokens, chunks of adjacent words (broken by
/// punctuation and sentence ends), and count the sentences holding words.
fn tokenize(text: &str) -> (Vec<Token>, Vec<Vec<usize>>, usize) {
    let mut tokens = Vec::new();
    let mut chunks = Vec::new();
    let mut sentence_count = 0;

    for sentence in SENTENCE_SPLIT.split(text) {
        let mut current: Vec<usize> = Vec::new();
        let mut has_words = false;
        for m in TOKEN.find_iter(sentence) {
            let raw = m.as_str();
            if !raw.starts_with(|c: char| c.is_alphanumeric()) {
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                }
                continue;
            }
            current.push(tokens.len());
            tokens.push(Token {
                key: raw.to_lowercase(),
                sentence: sentence_count,
                first_in_sentence: !has_words,
                acronym: is_acronym(raw),
                capitalized: raw.starts_with(char::is_uppercase),
            });
            has_words = true;
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        if has_words {
            sentence_count += 1;
        }
    }
    (tokens, chunks, sentence_count)
}

fn term_stats<'t>(tokens: &'t [Token], chunks: &[Vec<usize>]) -> HashMap<&'t str, TermStats<'t>> {
    let mut stats: HashMap<&str, TermStats<'_>> = HashMap::new();
    for token in tokens {
        let entry = stats.entry(token.key.as_str()).or_default();
        entry.tf += 1.0;
        if token.acronym {
            entry.tf_acronym += 1.0;
        } else if token.capitalized && !token.first_in_sentence {
            entry.tf_upper += 1.0;
        }
        entry.sentences.push(token.sentence);
    }

    for chunk in chunks {
        for pair in chunk.windows(2) {
            let left = tokens[pair[0]].key.as_str();
            let right = tokens[pair[1]].key.as_str();
            if let Some(s) = stats.get_mut(right) {
                s.left.insert(left);
                s.left_total += 1.0;
            }
            if let Some(s) = stats.get_mut(left) {
                s.right.insert(right);
                s.right_total += 1.0;
            }
        }
    }
    stats
}

/// Walk `ranked` best first, keeping keywords not too similar to a kept one.
fn dedup(ranked: Vec<Keyword>, threshold: f64, top: usize) -> Vec<Keyword> {
    let mut kept: Vec<Keyword> = Vec::with_capacity(top);
    for candidate in ranked {
        if kept.len() >= top {
            break;
        }
        let duplicate = threshold < 1.0
            && kept
                .iter()
                .any(|k| normalized_levenshtein(&k.text, &candidate.text) > threshold);
        if !duplicate {
            kept.push(candidate);
        }
    }
    kept
}

fn is_acronym(raw: &str) -> bool {
    raw.chars().count() > 1
        && raw.chars().any(char::is_alphabetic)
        && !raw.chars().any(char::is_lowercase)
}

fn is_number(key: &str) -> bool {
    key.chars().all(|c| c.is_numeric() || c == ',' || c == '.')
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn median(values: &[usize]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    }
}
