//! Signal rule table
//!
//! Every keyword heuristic in the engine goes through this table: each rule
//! tags a set of phrases with the signal they indicate and a weight. Coverage
//! uses the assumption/evidence signals, the pivot engine uses complexity,
//! uncertainty and risk.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("static regex"));

/// Words ignored when extracting keywords from requirements and constraints
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "into", "must", "should", "shall", "will", "are", "was",
    "were", "been", "have", "has", "had", "not", "but", "all", "any", "can", "each", "its", "our", "their", "they",
    "them", "then", "than", "when", "where", "which", "who", "why", "how", "what", "use", "used", "using", "via",
    "per", "out", "off", "able", "also", "only", "such", "may", "might", "does", "did", "doing", "you", "your",
    "his", "her", "she", "him", "more", "most", "less", "very", "over", "under", "about", "there", "these",
    "those", "would", "could", "every", "some", "other", "make", "made", "need", "needs", "being",
];

/// What a matched phrase indicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Signal {
    /// An unverified assumption is being made
    Assumption,
    /// Something was validated, measured or confirmed
    Evidence,
    /// The design is getting complicated
    Complexity,
    /// The author is unsure
    Uncertainty,
    /// An explicit risk or blocker is named
    Risk,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Assumption => write!(f, "assumption"),
            Self::Evidence => write!(f, "evidence"),
            Self::Complexity => write!(f, "complexity"),
            Self::Uncertainty => write!(f, "uncertainty"),
            Self::Risk => write!(f, "risk"),
        }
    }
}

/// One row of the table
#[derive(Debug, Clone, Copy)]
pub struct SignalRule {
    pub signal: Signal,
    /// Lowercase words or phrases; matched on word boundaries
    pub phrases: &'static [&'static str],
    /// Weight of each match for scoring signals
    pub weight: f64,
}

/// The builtin rule table
pub const SIGNAL_RULES: &[SignalRule] = &[
    SignalRule {
        signal: Signal::Assumption,
        phrases: &["assume", "assumes", "assuming", "assumption", "assumptions", "presumably", "we expect", "likely"],
        weight: 1.0,
    },
    SignalRule {
        signal: Signal::Evidence,
        phrases: &[
            "validated", "verified", "confirmed", "measured", "benchmarked", "tested", "prototype", "spike",
            "evidence",
        ],
        weight: 1.0,
    },
    SignalRule {
        signal: Signal::Complexity,
        phrases: &[
            "complex", "complexity", "complicated", "tightly coupled", "distributed transaction", "rewrite",
            "legacy", "migration", "many dependencies", "cross-team",
        ],
        weight: 1.0,
    },
    SignalRule {
        signal: Signal::Uncertainty,
        phrases: &[
            "unclear", "unknown", "unknowns", "not sure", "uncertain", "uncertainty", "tbd", "undecided",
            "open question", "maybe", "unsure",
        ],
        weight: 1.0,
    },
    SignalRule {
        signal: Signal::Risk,
        phrases: &["risk", "risky", "blocker", "blocked", "infeasible", "show-stopper", "showstopper", "deadline slip"],
        weight: 1.5,
    },
];

/// Lowercased, tokenized view of a piece of text
#[derive(Debug, Clone)]
pub struct NormalizedText {
    words: Vec<String>,
    set: HashSet<String>,
}

impl NormalizedText {
    pub fn new(text: &str) -> Self {
        let words = tokenize(text);
        let set = words.iter().cloned().collect();
        Self { words, set }
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Whether `keyword` appears as a word, or as the stem of a longer word
    pub fn has_keyword(&self, keyword: &str) -> bool {
        if self.set.contains(keyword) {
            return true;
        }
        keyword.len() >= 4 && self.words.iter().any(|w| w.starts_with(keyword))
    }

    /// Number of word-boundary occurrences of a phrase
    pub fn count_phrase(&self, phrase: &str) -> usize {
        let needle = tokenize(phrase);
        if needle.is_empty() {
            return 0;
        }
        self.words.windows(needle.len()).filter(|w| *w == needle.as_slice()).count()
    }
}

/// Split text into lowercase words of letters and digits in any script
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD_RE.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}

/// Significant, de-duplicated keywords of a short statement
///
/// A statement made only of short or common words ("UI", "Go") keeps all of
/// its words instead.
pub fn keywords(statement: &str) -> Vec<String> {
    let tokens = tokenize(statement);
    let mut seen = HashSet::new();
    let significant: Vec<String> = tokens
        .iter()
        .filter(|w| w.chars().count() >= 3 && !STOPWORDS.contains(&w.as_str()) && !w.chars().all(char::is_numeric))
        .filter(|w| seen.insert(w.to_string()))
        .cloned()
        .collect();
    if !significant.is_empty() {
        return significant;
    }

    let mut seen = HashSet::new();
    tokens.into_iter().filter(|w| seen.insert(w.clone())).collect()
}

/// Whether enough of a statement's keywords appear in the text
///
/// Empty statements never match.
pub fn statement_covered(text: &NormalizedText, statement: &str, min_ratio: f64) -> bool {
    let kws = keywords(statement);
    if kws.is_empty() {
        return false;
    }
    let hits = kws.iter().filter(|k| text.has_keyword(k)).count();
    (hits as f64 / kws.len() as f64) >= min_ratio
}

/// One signal found in a text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalHit {
    pub signal: Signal,
    pub phrase: String,
    pub count: usize,
    pub weight: f64,
}

/// Result of running the rule table over a text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalScan {
    pub hits: Vec<SignalHit>,
}

impl SignalScan {
    /// Total match count for a signal
    pub fn count(&self, signal: Signal) -> usize {
        self.hits.iter().filter(|h| h.signal == signal).map(|h| h.count).sum()
    }

    /// Sum of weight * count for a signal
    pub fn weight(&self, signal: Signal) -> f64 {
        self.hits
            .iter()
            .filter(|h| h.signal == signal)
            .map(|h| h.weight * h.count as f64)
            .sum()
    }

    /// Matched phrases grouped by signal, in table order
    pub fn phrases_by_signal(&self) -> BTreeMap<Signal, Vec<String>> {
        let mut map: BTreeMap<Signal, Vec<String>> = BTreeMap::new();
        for hit in &self.hits {
            map.entry(hit.signal).or_default().push(hit.phrase.clone());
        }
        map
    }
}

/// Run every rule in the table over `text`
pub fn scan(text: &NormalizedText) -> SignalScan {
    scan_with(SIGNAL_RULES, text)
}

/// Run a specific rule table over `text`
pub fn scan_with(rules: &[SignalRule], text: &NormalizedText) -> SignalScan {
    let mut hits = Vec::new();
    for rule in rules {
        for phrase in rule.phrases {
            let count = text.count_phrase(phrase);
            if count > 0 {
                hits.push(SignalHit {
                    signal: rule.signal,
                    phrase: phrase.to_string(),
                    count,
                    weight: rule.weight,
                });
            }
        }
    }
    debug!(hit_count = hits.len(), "scan_with: complete");
    SignalScan { hits }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("OAuth 2.0, Login!"), vec!["oauth", "2", "0", "login"]);
        assert!(tokenize("  ").is_empty());
    }

    #[test]
    fn test_keywords_drop_stopwords_and_duplicates() {
        let kws = keywords("The system must support OAuth login and OAuth refresh");
        assert_eq!(kws, vec!["system", "support", "oauth", "login", "refresh"]);
    }

    #[test]
    fn test_has_keyword_matches_stems() {
        let text = NormalizedText::new("Users can log in with logins backed by caching");
        assert!(text.has_keyword("logins"));
        assert!(text.has_keyword("login"));
        assert!(text.has_keyword("cach"));
        // Short keywords must match whole words
        assert!(!text.has_keyword("lo"));
    }

    #[test]
    fn test_count_phrase_word_boundaries() {
        let text = NormalizedText::new("Not sure. Really not sure about the risk; risky too");
        assert_eq!(text.count_phrase("not sure"), 2);
        assert_eq!(text.count_phrase("risk"), 1);
        assert_eq!(text.count_phrase("risky"), 1);
        assert_eq!(text.count_phrase(""), 0);
    }

    #[test]
    fn test_statement_covered() {
        let text = NormalizedText::new("We will support OAuth login for all partners");
        assert!(statement_covered(&text, "Support OAuth login", 0.5));
        assert!(!statement_covered(&text, "Export monthly invoices as PDF", 0.5));
        assert!(!statement_covered(&text, "the and", 0.5));
        assert!(!statement_covered(&text, "  ", 0.5));
    }

    #[test]
    fn test_tokenize_non_latin_scripts() {
        assert_eq!(tokenize("決済処理 is done"), vec!["決済処理", "is", "done"]);
        assert_eq!(tokenize("Über café"), vec!["über", "café"]);
    }

    #[test]
    fn test_short_statement_keeps_its_words() {
        assert_eq!(keywords("UI"), vec!["ui"]);
        assert_eq!(keywords("Go go"), vec!["go"]);
        assert_eq!(keywords("UI for admins"), vec!["admins"]);
        let text = NormalizedText::new("The UI is done");
        assert!(statement_covered(&text, "UI", 0.5));
    }

    #[test]
    fn test_scan_counts_signals() {
        let text = NormalizedText::new(
            "We assume traffic is low. This is complex and unclear; the legacy migration is a risk.",
        );
        let scan = scan(&text);
        assert_eq!(scan.count(Signal::Assumption), 1);
        assert_eq!(scan.count(Signal::Complexity), 3);
        assert_eq!(scan.count(Signal::Uncertainty), 1);
        assert_eq!(scan.count(Signal::Risk), 1);
        assert_eq!(scan.weight(Signal::Risk), 1.5);
        assert_eq!(scan.count(Signal::Evidence), 0);
    }

    #[test]
    fn test_rule_table_phrases_are_normalized() {
        // Every phrase must survive tokenization, otherwise it can never match
        for rule in SIGNAL_RULES {
            for phrase in rule.phrases {
                assert!(!tokenize(phrase).is_empty(), "phrase '{}' tokenizes to nothing", phrase);
            }
        }
    }
}
