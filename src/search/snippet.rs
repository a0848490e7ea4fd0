//! Bounded excerpts of page text around query matches

use std::collections::HashSet;
use std::sync::Arc;

use crate::lemma::{is_supported_letter, Lemmatizer};

const HIGHLIGHT_OPEN: &str = "<b>";
const HIGHLIGHT_CLOSE: &str = "</b>";

/// A matched word, in char offsets of the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WordMatch {
    start: usize,
    end: usize,
}

/// Cuts highlighted excerpts out of plain page text
///
/// Offsets and the window length are counted in characters, not bytes, so
/// Cyrillic text is windowed the same way as Latin text.
#[derive(Debug, Clone)]
pub struct SnippetExtractor {
    lemmatizer: Arc<Lemmatizer>,
    window: usize,
}

impl SnippetExtractor {
    pub fn new(lemmatizer: Arc<Lemmatizer>, window: usize) -> Self {
        Self { lemmatizer, window }
    }

    /// Returns one snippet per cluster of matches, in text order
    ///
    /// A word matches when its root form is in `lemmas`. Matches closer than
    /// the window length to the first match of a cluster join that cluster.
    /// Every match that falls inside a snippet is wrapped in `<b>` tags.
    pub fn snippets(&self, text: &str, lemmas: &HashSet<String>) -> Vec<String> {
        if lemmas.is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let matches = self.find_matches(&chars, lemmas);

        cluster(&matches, self.window)
            .into_iter()
            .map(|group| {
                let first = group[0].start;
                let last_end = group[group.len() - 1].end;
                let start = window_start(&chars, first, self.window);
                let end = window_end(&chars, last_end, self.window);
                highlight(&chars, &matches, start, end)
            })
            .collect()
    }

    fn find_matches(&self, chars: &[char], lemmas: &HashSet<String>) -> Vec<WordMatch> {
        let mut matches = Vec::new();
        let mut word = String::new();
        let mut start = 0;

        for (i, c) in chars.iter().enumerate() {
            match fold(*c) {
                Some(lower) => {
                    if word.is_empty() {
                        start = i;
                    }
                    word.push(lower);
                }
                None if !word.is_empty() => {
                    if self.matches(&word, lemmas) {
                        matches.push(WordMatch { start, end: i });
                    }
                    word.clear();
                }
                None => {}
            }
        }
        if !word.is_empty() && self.matches(&word, lemmas) {
            matches.push(WordMatch {
                start,
                end: chars.len(),
            });
        }

        matches
    }

    fn matches(&self, word: &str, lemmas: &HashSet<String>) -> bool {
        self.lemmatizer
            .normalize(word)
            .is_some_and(|lemma| lemmas.contains(&lemma))
    }
}

/// Lower-cases a char that is a supported letter
fn fold(c: char) -> Option<char> {
    let mut lower = c.to_lowercase();
    let first = lower.next()?;
    (lower.next().is_none() && is_supported_letter(first)).then_some(first)
}

fn cluster(matches: &[WordMatch], window: usize) -> Vec<&[WordMatch]> {
    let mut clusters = Vec::new();
    let mut begin = 0;

    for i in 1..matches.len() {
        if matches[i].start >= matches[begin].start + window {
            clusters.push(&matches[begin..i]);
            begin = i;
        }
    }
    if !matches.is_empty() {
        clusters.push(&matches[begin..]);
    }

    clusters
}

/// First char of the snippet: just past the first space after
/// `first - window`, never past `first`.
fn window_start(chars: &[char], first: usize, window: usize) -> usize {
    let from = first.saturating_sub(window);
    if from == 0 {
        return 0;
    }

    chars[from..first]
        .iter()
        .position(|c| c.is_whitespace())
        .map_or(first, |offset| from + offset + 1)
}

/// End of the snippet (exclusive): the last space before `last_end + window`,
/// never before `last_end`.
fn window_end(chars: &[char], last_end: usize, window: usize) -> usize {
    let to = (last_end + window).min(chars.len());
    if to == chars.len() {
        return to;
    }

    chars[last_end..=to]
        .iter()
        .rposition(|c| c.is_whitespace())
        .map_or(last_end, |offset| last_end + offset)
}

fn highlight(chars: &[char], matches: &[WordMatch], start: usize, end: usize) -> String {
    let mut snippet = String::new();
    let mut cursor = start;

    for m in matches.iter().filter(|m| m.start >= start && m.end <= end) {
        snippet.extend(&chars[cursor..m.start]);
        snippet.push_str(HIGHLIGHT_OPEN);
        snippet.extend(&chars[m.start..m.end]);
        snippet.push_str(HIGHLIGHT_CLOSE);
        cursor = m.end;
    }
    snippet.extend(&chars[cursor..end]);

    snippet.trim().to_string()
}
