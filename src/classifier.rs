//! Lexical mood classifier
//!
//! One rule table, one priority order. Categories are checked highest
//! priority first; within a category multi-word phrases are checked before
//! single keywords, and the first hit wins. There is no partial scoring.

mod lemma;
mod vocabulary;

#[cfg(test)]
mod proptests;

pub use lemma::{Lemmatizer, PartOfSpeech};

use crate::state::Mood;
use std::collections::{BTreeSet, HashMap, HashSet};
use vocabulary::{synonyms, CATEGORY_SEEDS, EXACT_FEELINGS, POSITIVE_WORDS, STOP_WORDS};

/// Which classifier configuration a stage uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifierMode {
    /// Phrase and keyword pipeline over free text
    #[default]
    Lexical,
    /// Exact match of a single short answer against a literal table
    ExactFeeling,
}

impl ClassifierMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "lexical" => Some(Self::Lexical),
            "exact" | "exact_feeling" => Some(Self::ExactFeeling),
            _ => None,
        }
    }
}

/// Matchers for one category
#[derive(Debug, Clone)]
struct CategoryRule {
    mood: Mood,
    /// Multi-word phrases, matched as substrings of the lowercased input
    phrases: Vec<String>,
    /// Normalized single words, matched against the lemmatized token stream
    keywords: HashSet<String>,
}

/// Rule-table classifier. Construction builds every vocabulary set once.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<CategoryRule>,
    positive: HashSet<String>,
    stop_words: HashSet<String>,
    exact: HashMap<&'static str, Mood>,
    lemmatizer: Lemmatizer,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    pub fn new() -> Self {
        let raw: Vec<(Mood, Vec<&'static str>)> = CATEGORY_SEEDS
            .iter()
            .map(|category| {
                let mut words: Vec<&'static str> = Vec::new();
                for seed in category.seeds {
                    words.push(seed);
                    words.extend(synonyms(seed));
                    if seed.contains(' ') {
                        words.extend(seed.split_whitespace());
                    }
                }
                words.extend(category.supplement);
                (category.mood, words)
            })
            .collect();

        let lexicon = raw
            .iter()
            .flat_map(|(_, words)| words.iter().copied())
            .filter(|w| !w.contains(' '))
            .chain(POSITIVE_WORDS.iter().copied());
        let lemmatizer = Lemmatizer::new(lexicon);

        let rules: Vec<CategoryRule> = raw
            .into_iter()
            .map(|(mood, words)| {
                let mut phrases = BTreeSet::new();
                let mut keywords = HashSet::new();
                for word in words {
                    if word.contains(' ') {
                        phrases.insert(word.to_string());
                    } else {
                        keywords.insert(word.to_string());
                        keywords.insert(lemmatizer.lemmatize(word, PartOfSpeech::Verb));
                        keywords.insert(lemmatizer.lemmatize(word, PartOfSpeech::Noun));
                    }
                }
                CategoryRule {
                    mood,
                    phrases: phrases.into_iter().collect(),
                    keywords,
                }
            })
            .collect();

        let positive = POSITIVE_WORDS
            .iter()
            .flat_map(|w| [(*w).to_string(), lemmatizer.lemmatize(w, PartOfSpeech::Verb)])
            .collect();
        let stop_words = STOP_WORDS.iter().map(|w| (*w).to_string()).collect();
        let exact = EXACT_FEELINGS.iter().copied().collect();

        tracing::debug!(
            categories = rules.len(),
            keywords = rules.iter().map(|r| r.keywords.len()).sum::<usize>(),
            phrases = rules.iter().map(|r| r.phrases.len()).sum::<usize>(),
            "Classifier vocabulary built"
        );

        Self {
            rules,
            positive,
            stop_words,
            exact,
            lemmatizer,
        }
    }

    /// Classify free text with the lexical pipeline
    pub fn classify(&self, text: &str) -> Mood {
        let text = normalize(text);
        let tokens = self.tokens(&text);

        for rule in &self.rules {
            if rule.phrases.iter().any(|p| text.contains(p.as_str())) {
                return rule.mood;
            }
            if tokens.iter().any(|t| rule.keywords.contains(t)) {
                return rule.mood;
            }
        }

        let all_positive = tokens
            .iter()
            .all(|t| self.positive.contains(t) && !self.stop_words.contains(t));
        if !tokens.is_empty() && all_positive {
            Mood::Positive
        } else {
            Mood::General
        }
    }

    /// Exact-match a single answer to a "how are you feeling" question.
    ///
    /// Anything outside the literal table is undetermined.
    pub fn classify_exact(&self, answer: &str) -> Option<Mood> {
        self.exact.get(normalize(answer).trim()).copied()
    }

    /// Classify with the given configuration
    pub fn classify_with(&self, mode: ClassifierMode, text: &str) -> Option<Mood> {
        match mode {
            ClassifierMode::Lexical => Some(self.classify(text)),
            ClassifierMode::ExactFeeling => self.classify_exact(text),
        }
    }

    /// Punctuation-stripped, verb-lemmatized tokens of `text`
    pub fn tokens(&self, text: &str) -> Vec<String> {
        normalize(text)
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation()))
            .filter(|w| !w.is_empty())
            .map(|w| self.lemmatizer.lemmatize(w, PartOfSpeech::Verb))
            .collect()
    }

    /// Tokens that no category, the positive vocabulary, or the stop list knows
    pub fn unrecognized_terms(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tokens(text)
            .into_iter()
            .filter(|t| {
                !self.stop_words.contains(t)
                    && !self.positive.contains(t)
                    && !self.rules.iter().any(|r| r.keywords.contains(t))
            })
            .filter(|t| seen.insert(t.clone()))
            .collect()
    }
}

/// Lowercase and fold typographic apostrophes
fn normalize(text: &str) -> String {
    text.to_lowercase().replace(['\u{2018}', '\u{2019}'], "'")
}
