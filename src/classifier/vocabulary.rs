//! Seed vocabulary for the lexical classifier
//!
//! Category tables are listed in priority order. Each category's keyword set
//! is the synonym expansion of its seeds plus a manual supplement.

use crate::state::Mood;

/// Seeds and manual supplement for one category
pub struct CategorySeeds {
    pub mood: Mood,
    pub seeds: &'static [&'static str],
    pub supplement: &'static [&'static str],
}

/// Negative categories, highest priority first
pub const CATEGORY_SEEDS: &[CategorySeeds] = &[
    CategorySeeds {
        mood: Mood::Crisis,
        seeds: &["suicide", "self-harm"],
        supplement: &[
            "kill myself",
            "end it all",
            "suicidal",
            "self harm",
            "hurt myself",
            "kill",
            "myself",
            "die",
            "want to die",
            "cutting",
        ],
    },
    CategorySeeds {
        mood: Mood::Anxiety,
        seeds: &["anxiety", "panic attack"],
        supplement: &[
            "stressed",
            "worried",
            "overwhelmed",
            "nervous",
            "panic",
            "racing thoughts",
            "anxious",
        ],
    },
    CategorySeeds {
        mood: Mood::Depression,
        seeds: &["depression", "hopelessness"],
        supplement: &[
            "sad",
            "empty",
            "numb",
            "lonely",
            "can't go on",
            "worthless",
            "depressed",
        ],
    },
];

/// Synonym lookup table used to expand seeds
const SYNONYMS: &[(&str, &[&str])] = &[
    ("suicide", &["suicide", "self-destruction", "self-annihilation"]),
    ("anxiety", &["anxiety", "anxiousness"]),
    (
        "depression",
        &[
            "depression",
            "clinical depression",
            "depressive disorder",
            "low",
            "slump",
        ],
    ),
    ("hopelessness", &["hopelessness", "despair"]),
];

/// Synonyms for `word`, including the word itself when it is in the table
pub fn synonyms(word: &str) -> &'static [&'static str] {
    match SYNONYMS.iter().find(|(w, _)| *w == word) {
        Some((_, syns)) => syns,
        None => &[],
    }
}

/// Words that count as a positive answer on their own
pub const POSITIVE_WORDS: &[&str] = &[
    "amazing",
    "awesome",
    "better",
    "blessed",
    "calm",
    "cheerful",
    "content",
    "delighted",
    "excited",
    "fantastic",
    "fine",
    "glad",
    "good",
    "grateful",
    "great",
    "happy",
    "hopeful",
    "joyful",
    "joyous",
    "ok",
    "okay",
    "optimistic",
    "peaceful",
    "pleased",
    "positive",
    "proud",
    "relaxed",
    "thankful",
    "well",
    "wonderful",
];

/// Literal answers recognised by the exact-match configuration
pub const EXACT_FEELINGS: &[(&str, Mood)] = &[
    ("anxious", Mood::Anxiety),
    ("depressed", Mood::Depression),
    ("suicidal", Mood::Crisis),
    ("happy", Mood::Positive),
];

pub const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
    "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will",
    "just", "don", "should", "now", "want",
];
