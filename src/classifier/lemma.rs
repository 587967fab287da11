//! Dictionary-backed lemmatizer
//!
//! Suffix-detachment rules in the style of `WordNet`'s morphy: a candidate base
//! form only counts if the lexicon knows it, and the shortest known candidate
//! wins. Irregular forms are looked up first.

use std::collections::HashSet;

/// Part of speech to lemmatize as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartOfSpeech {
    Noun,
    Verb,
}

const NOUN_RULES: &[(&str, &str)] = &[
    ("s", ""),
    ("ses", "s"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("ies", "y"),
];

const VERB_RULES: &[(&str, &str)] = &[
    ("s", ""),
    ("ies", "y"),
    ("ied", "y"),
    ("es", "e"),
    ("es", ""),
    ("ed", "e"),
    ("ed", ""),
    ("ing", "e"),
    ("ing", ""),
];

const IRREGULAR_VERBS: &[(&str, &str)] = &[
    ("am", "be"),
    ("is", "be"),
    ("are", "be"),
    ("was", "be"),
    ("were", "be"),
    ("been", "be"),
    ("being", "be"),
    ("has", "have"),
    ("had", "have"),
    ("does", "do"),
    ("did", "do"),
    ("done", "do"),
    ("felt", "feel"),
    ("lost", "lose"),
    ("thought", "think"),
    ("went", "go"),
    ("gone", "go"),
    ("got", "get"),
    ("made", "make"),
    ("said", "say"),
    ("dying", "die"),
    ("lying", "lie"),
    ("slept", "sleep"),
    ("left", "leave"),
    ("broke", "break"),
    ("broken", "break"),
    ("fell", "fall"),
    ("fallen", "fall"),
];

const IRREGULAR_NOUNS: &[(&str, &str)] = &[
    ("children", "child"),
    ("people", "person"),
    ("lives", "life"),
    ("selves", "self"),
    ("thoughts", "thought"),
];

/// Base forms known regardless of the classifier vocabulary
const BASE_FORMS: &[&str] = &[
    "attack", "be", "break", "cry", "cut", "despair", "die", "do", "end", "fall", "fear",
    "feel", "get", "go", "harm", "hate", "have", "hope", "hurt", "kill", "leave", "lie",
    "life", "lose", "make", "overwhelm", "panic", "race", "say", "self", "sleep", "stress",
    "suicide", "think", "thought", "want", "work", "worry",
];

/// Lemmatizer over a fixed lexicon of known base forms
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    lexicon: HashSet<String>,
}

impl Lemmatizer {
    /// Build a lemmatizer that knows the built-in base forms plus `words`
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut lexicon: HashSet<String> = BASE_FORMS.iter().map(|w| (*w).to_string()).collect();
        lexicon.extend(words.into_iter().map(Into::into));
        Self { lexicon }
    }

    pub fn knows(&self, word: &str) -> bool {
        self.lexicon.contains(word)
    }

    /// Reduce `word` to its base form for the given part of speech.
    ///
    /// Returns the word unchanged when no known base form is found.
    pub fn lemmatize(&self, word: &str, pos: PartOfSpeech) -> String {
        let irregular = match pos {
            PartOfSpeech::Verb => IRREGULAR_VERBS,
            PartOfSpeech::Noun => IRREGULAR_NOUNS,
        };
        if let Some((_, base)) = irregular.iter().find(|(form, _)| *form == word) {
            return (*base).to_string();
        }

        let rules = match pos {
            PartOfSpeech::Verb => VERB_RULES,
            PartOfSpeech::Noun => NOUN_RULES,
        };

        let mut candidates: Vec<String> = Vec::new();
        if self.knows(word) {
            candidates.push(word.to_string());
        }
        for (suffix, replacement) in rules {
            let Some(stem) = word.strip_suffix(suffix) else {
                continue;
            };
            if stem.is_empty() {
                continue;
            }
            let candidate = format!("{stem}{replacement}");
            if self.knows(&candidate) {
                candidates.push(candidate);
            } else if pos == PartOfSpeech::Verb && replacement.is_empty() {
                // cutting -> cutt -> cut
                if let Some(undoubled) = undouble(stem) {
                    if self.knows(&undoubled) {
                        candidates.push(undoubled);
                    }
                }
            }
        }

        candidates
            .into_iter()
            .min_by_key(String::len)
            .unwrap_or_else(|| word.to_string())
    }
}

/// Drop a doubled final consonant ("stopp" -> "stop")
fn undouble(stem: &str) -> Option<String> {
    let mut chars = stem.chars().rev();
    let last = chars.next()?;
    let before = chars.next()?;
    if last == before && last.is_ascii_alphabetic() && !"aeiou".contains(last) {
        let mut out = stem.to_string();
        out.pop();
        Some(out)
    } else {
        None
    }
}
