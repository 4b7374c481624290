use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

use linfa::dataset::Records;
use log::debug;
use ndarray::Array1;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpamError};
use crate::stop_words::is_stop_word;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("static token pattern"))
}

/// Sparse feature vector: `(term index, weight)` pairs sorted by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dot(&self, dense: &Array1<f64>) -> f64 {
        self.entries
            .iter()
            .filter_map(|&(i, v)| dense.get(i).map(|w| w * v))
            .sum()
    }

    pub fn squared_norm(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v * v).sum()
    }
}

/// Rows of sparse vectors over a vocabulary of `dim` terms.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub rows: Vec<SparseVector>,
    pub dim: usize,
}

impl Records for FeatureMatrix {
    type Elem = f64;

    fn nsamples(&self) -> usize {
        self.rows.len()
    }

    fn nfeatures(&self) -> usize {
        self.dim
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerParams {
    pub min_df: usize,
    pub ngram_range: (usize, usize),
}

impl Default for VectorizerParams {
    fn default() -> Self {
        VectorizerParams {
            min_df: 2,
            ngram_range: (1, 2),
        }
    }
}

/// TF-IDF vectorizer over word n-grams with English stop words removed.
///
/// The vocabulary and IDF weights are fixed by [`TfidfVectorizer::fit`];
/// every later transform reuses them unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: BTreeMap<String, usize>,
    idf: Array1<f64>,
    params: VectorizerParams,
}

impl TfidfVectorizer {
    /// Learns the vocabulary and smoothed IDF from `texts`.
    pub fn fit<S: AsRef<str>>(texts: &[S], params: VectorizerParams) -> Result<Self> {
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            let terms: HashSet<String> = analyze(text.as_ref(), params.ngram_range).into_iter().collect();
            for term in terms {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let mut kept: Vec<(String, usize)> = doc_freq
            .into_iter()
            .filter(|(_, df)| *df >= params.min_df)
            .collect();
        if kept.is_empty() {
            return Err(SpamError::EmptyVocabulary);
        }
        kept.sort_by(|a, b| a.0.cmp(&b.0));

        let n_docs = texts.len() as f64;
        let idf = kept
            .iter()
            .map(|(_, df)| ((1.0 + n_docs) / (1.0 + *df as f64)).ln() + 1.0)
            .collect::<Array1<f64>>();
        let vocabulary = kept
            .into_iter()
            .enumerate()
            .map(|(i, (term, _))| (term, i))
            .collect::<BTreeMap<_, _>>();

        debug!("Fitted vocabulary of {} terms over {} documents", vocabulary.len(), texts.len());

        Ok(TfidfVectorizer {
            vocabulary,
            idf,
            params,
        })
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.vocabulary.contains_key(term)
    }

    pub fn transform<S: AsRef<str>>(&self, texts: &[S]) -> FeatureMatrix {
        FeatureMatrix {
            rows: texts.iter().map(|t| self.transform_one(t.as_ref())).collect(),
            dim: self.vocabulary.len(),
        }
    }

    /// Raw counts times IDF, L2-normalized. Unknown terms are ignored.
    pub fn transform_one(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in analyze(text, self.params.ngram_range) {
            if let Some(&i) = self.vocabulary.get(&term) {
                *counts.entry(i).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(i, tf)| (i, tf * self.idf[i]))
            .collect();
        let norm = entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, v) in &mut entries {
                *v /= norm;
            }
        }
        SparseVector { entries }
    }
}

/// Lowercases, tokenizes, drops stop words and emits n-grams in `range`.
pub fn analyze(text: &str, (lo, hi): (usize, usize)) -> Vec<String> {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = token_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !is_stop_word(t))
        .collect();

    let mut terms = Vec::new();
    for n in lo..=hi {
        if n == 0 || n > tokens.len() {
            continue;
        }
        terms.extend(tokens.windows(n).map(|w| w.join(" ")));
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<&'static str> {
        vec![
            "Free ticket to win now",
            "You won a free ticket",
            "Are we meeting tomorrow",
            "Meeting tomorrow at noon",
        ]
    }

    #[test]
    fn analyze_builds_unigrams_and_bigrams_without_stop_words() {
        let terms = analyze("You have WON a free ticket!", (1, 2));
        assert_eq!(terms, vec!["won", "free", "ticket", "won free", "free ticket"]);
    }

    #[test]
    fn analyze_skips_single_character_tokens() {
        assert_eq!(analyze("u r 2 good", (1, 1)), vec!["good"]);
    }

    #[test]
    fn fit_keeps_terms_above_min_df() {
        let v = TfidfVectorizer::fit(&corpus(), VectorizerParams::default()).unwrap();
        assert!(v.contains("free ticket"));
        assert!(v.contains("meeting tomorrow"));
        assert!(!v.contains("noon"));
        assert_eq!(v.vocabulary_len(), 6);
    }

    #[test]
    fn transform_is_l2_normalized_and_ignores_unknown_terms() {
        let v = TfidfVectorizer::fit(&corpus(), VectorizerParams::default()).unwrap();
        let x = v.transform_one("free ticket giveaway");
        assert_eq!(x.entries.len(), 3);
        assert!((x.squared_norm() - 1.0).abs() < 1e-9);

        assert!(v.transform_one("completely unrelated words").is_zero());
        assert!(v.transform_one("").is_zero());
    }

    #[test]
    fn transform_keeps_vocabulary_dimension() {
        let v = TfidfVectorizer::fit(&corpus(), VectorizerParams::default()).unwrap();
        let m = v.transform(&["free", "tomorrow"]);
        assert_eq!(m.nsamples(), 2);
        assert_eq!(m.nfeatures(), v.vocabulary_len());
    }

    #[test]
    fn empty_vocabulary_is_an_error() {
        let err = TfidfVectorizer::fit(&["alpha", "beta"], VectorizerParams::default()).unwrap_err();
        assert!(matches!(err, SpamError::EmptyVocabulary));
        let none: [&str; 0] = [];
        assert!(TfidfVectorizer::fit(&none, VectorizerParams::default()).is_err());
    }
}
