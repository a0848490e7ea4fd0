use std::collections::HashMap;

use rust_stemmers::{Algorithm, Stemmer};

use crate::lemma::particles::particle_kind;
use crate::lemma::Language;

/// Reduces words of two languages to their root forms
///
/// One instance is built at startup and shared by reference between the
/// indexer, the search engine and the snippet extractor. All methods take
/// `&self` and never mutate, so concurrent calls are safe.
pub struct Lemmatizer {
    english: Stemmer,
    russian: Stemmer,
}

impl Lemmatizer {
    pub fn new() -> Self {
        Self {
            english: Stemmer::create(Algorithm::English),
            russian: Stemmer::create(Algorithm::Russian),
        }
    }

    /// Splits text into lower-cased words made only of supported letters
    ///
    /// Everything that is neither a Latin/Cyrillic letter nor whitespace is
    /// treated as a separator, so "don't" yields "don" and "t".
    pub fn words_of(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !is_supported_letter(c))
            .filter(|word| !word.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Returns the root form of a word, or `None` when the word mixes
    /// alphabets, uses letters outside both, or stems to nothing.
    pub fn normalize(&self, word: &str) -> Option<String> {
        let word = word.to_lowercase();
        let stemmer = match detect_language(&word)? {
            Language::English => &self.english,
            Language::Russian => &self.russian,
        };

        let stem = stemmer.stem(&word);
        if stem.is_empty() {
            None
        } else {
            Some(stem.into_owned())
        }
    }

    /// True for grammatical function words of either language
    pub fn is_particle(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        detect_language(&word)
            .and_then(|language| particle_kind(language, &word))
            .is_some()
    }

    /// Counts root-form occurrences in plain text, skipping particles and
    /// words that fail to normalize.
    pub fn lemmas_of(&self, text: &str) -> HashMap<String, usize> {
        let mut lemmas = HashMap::new();

        for word in self.words_of(text) {
            if self.is_particle(&word) {
                continue;
            }
            if let Some(lemma) = self.normalize(&word) {
                *lemmas.entry(lemma).or_insert(0) += 1;
            }
        }

        lemmas
    }

    /// Visible text of an HTML document
    pub fn html_to_text(&self, html: &str) -> String {
        crate::crawler::html_to_text(html)
    }
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Lemmatizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lemmatizer").finish_non_exhaustive()
    }
}

fn is_english_letter(c: char) -> bool {
    c.is_ascii_lowercase()
}

fn is_russian_letter(c: char) -> bool {
    ('а'..='я').contains(&c) || c == 'ё'
}

pub(crate) fn is_supported_letter(c: char) -> bool {
    is_english_letter(c) || is_russian_letter(c)
}

/// Classifies a lower-cased word by alphabet
pub(crate) fn detect_language(word: &str) -> Option<Language> {
    if word.is_empty() {
        None
    } else if word.chars().all(is_english_letter) {
        Some(Language::English)
    } else if word.chars().all(is_russian_letter) {
        Some(Language::Russian)
    } else {
        None
    }
}
