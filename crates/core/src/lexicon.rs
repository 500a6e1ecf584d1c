//! Keyword data driving intent detection and location extraction.
//!
//! The built-in lexicon is compiled in from `data/lexicon.json`; deployments
//! can swap it for a file with the same shape. Once loaded it is shared
//! read-only between requests.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;

const BUILTIN_LEXICON: &str = include_str!("../data/lexicon.json");

static BUILTIN: Lazy<Arc<Lexicon>> = Lazy::new(|| {
    Arc::new(Lexicon::from_json_str(BUILTIN_LEXICON).expect("embedded lexicon is valid"))
});

#[derive(Debug, Deserialize)]
struct LexiconFile {
    version: u32,
    prepositions: Vec<String>,
    travel_verbs: Vec<String>,
    skip_words: Vec<String>,
    weather_keywords: Vec<String>,
    places_keywords: Vec<String>,
    starter_capitals: Vec<String>,
    sentence_starters: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Lexicon {
    pub version: u32,
    /// Ordered: earlier entries are tried first.
    pub prepositions: Vec<String>,
    /// Ordered: earlier entries are tried first.
    pub travel_verbs: Vec<String>,
    pub weather_keywords: Vec<String>,
    pub places_keywords: Vec<String>,
    skip_words: HashSet<String>,
    verb_set: HashSet<String>,
    starter_capitals: HashSet<String>,
    sentence_starters: HashSet<String>,
}

impl Lexicon {
    pub fn builtin() -> Arc<Self> {
        BUILTIN.clone()
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed reading lexicon at {}", path.as_ref().display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("invalid lexicon at {}", path.as_ref().display()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: LexiconFile = serde_json::from_str(raw).context("lexicon is not valid json")?;
        if file.prepositions.is_empty() {
            anyhow::bail!("lexicon must list at least one preposition");
        }

        let lower = |words: Vec<String>| -> Vec<String> {
            words.into_iter().map(|word| word.to_lowercase()).collect()
        };

        let travel_verbs = lower(file.travel_verbs);
        Ok(Self {
            version: file.version,
            prepositions: lower(file.prepositions),
            verb_set: travel_verbs.iter().cloned().collect(),
            travel_verbs,
            weather_keywords: lower(file.weather_keywords),
            places_keywords: lower(file.places_keywords),
            skip_words: lower(file.skip_words).into_iter().collect(),
            starter_capitals: file.starter_capitals.into_iter().collect(),
            sentence_starters: file.sentence_starters.into_iter().collect(),
        })
    }

    pub fn is_skip_word(&self, word: &str) -> bool {
        self.skip_words.contains(&word.to_lowercase())
    }

    pub fn is_travel_verb(&self, word: &str) -> bool {
        self.verb_set.contains(&word.to_lowercase())
    }

    /// Exact (case-insensitive) membership in either keyword list.
    pub fn is_keyword(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        self.weather_keywords.iter().any(|kw| *kw == lower)
            || self.places_keywords.iter().any(|kw| *kw == lower)
    }

    /// True when any keyword occurs inside `word`.
    pub fn contains_keyword(&self, word: &str) -> bool {
        self.weather_keywords
            .iter()
            .chain(self.places_keywords.iter())
            .any(|kw| word.contains(kw.as_str()))
    }

    /// Case-sensitive: only the capitalised forms are listed.
    pub fn is_starter_capital(&self, word: &str) -> bool {
        self.starter_capitals.contains(word)
    }

    /// Case-sensitive.
    pub fn is_sentence_starter(&self, word: &str) -> bool {
        self.sentence_starters.contains(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lexicon_loads() {
        let lexicon = Lexicon::builtin();
        assert_eq!(lexicon.version, 1);
        assert_eq!(lexicon.prepositions.first().map(String::as_str), Some("to"));
        assert!(lexicon.is_skip_word("I'm"));
        assert!(lexicon.is_travel_verb("Exploring"));
        assert!(lexicon.is_keyword("Forecast"));
        assert!(lexicon.is_sentence_starter("Please"));
        assert!(!lexicon.is_sentence_starter("please"));
    }

    #[test]
    fn rejects_lexicon_without_prepositions() {
        let raw = r#"{"version":2,"prepositions":[],"travel_verbs":[],"skip_words":[],
            "weather_keywords":[],"places_keywords":[],"starter_capitals":[],"sentence_starters":[]}"#;
        assert!(Lexicon::from_json_str(raw).is_err());
    }
}
