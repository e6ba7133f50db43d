//! Tokenization and the frequency-capped vocabulary.
//!
//! Tokens are maximal runs of alphanumeric or `_` characters that are at
//! least two characters long, lower-cased, with English stop words removed.
//! The vocabulary keeps the `max_features` most frequent tokens across the
//! whole corpus (ties broken alphabetically) and then stores them in
//! alphabetical order; that order defines the vector dimensions.

use crate::stop_words::is_stop_word;
use crate::vector::CountVector;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Split a tag string into countable tokens
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| word.chars().nth(1).is_some())
        .map(str::to_lowercase)
        .filter(|word| !is_stop_word(word))
}

/// Frozen term -> dimension mapping shared by every movie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, u32>,
}

impl Vocabulary {
    /// Count token frequencies over all documents and keep the top `max_features`
    pub fn build<'a, I>(documents: I, max_features: usize) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut frequencies: HashMap<String, u64> = HashMap::new();
        for document in documents {
            for token in tokenize(document) {
                *frequencies.entry(token).or_insert(0) += 1;
            }
        }
        let distinct = frequencies.len();

        let mut ranked: Vec<(String, u64)> = frequencies.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(max_features);

        let mut terms: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        terms.sort();

        debug!("Vocabulary keeps {} of {} distinct tokens", terms.len(), distinct);
        Self::from_terms(terms)
    }

    /// Rebuild a vocabulary from already-ordered terms (artifact loading)
    pub fn from_terms(terms: Vec<String>) -> Self {
        let index = terms
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i as u32))
            .collect();
        Self { terms, index }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn index_of(&self, term: &str) -> Option<u32> {
        self.index.get(term).copied()
    }

    /// Raw counts of `text` against this vocabulary; unknown tokens are ignored
    pub fn vectorize(&self, text: &str) -> CountVector {
        let mut counts: BTreeMap<u32, u32> = BTreeMap::new();
        for token in tokenize(text) {
            if let Some(i) = self.index_of(&token) {
                *counts.entry(i).or_insert(0) += 1;
            }
        }
        CountVector::new(self.len(), counts.into_iter().collect())
    }
}
