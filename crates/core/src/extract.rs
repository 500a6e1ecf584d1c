//! Heuristic location extraction.
//!
//! Extraction is an ordered cascade of [`LocationStrategy`] units. Each unit
//! either returns a location that already passed [`is_valid_location`] or
//! nothing; the first unit that returns something wins. The default order is
//! preposition pattern, verb pattern, proper-noun scan, lowercase fallback.

use std::sync::Arc;

use regex::Regex;

use crate::intent::classify_intent;
use crate::lexicon::Lexicon;
use crate::models::QueryAnalysis;
use crate::text::{normalize_text, strip_punctuation, title_case, trim_edge_punctuation};

pub trait LocationStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn locate(&self, text: &str, lexicon: &Lexicon) -> Option<String>;
}

pub fn is_valid_location(lexicon: &Lexicon, candidate: &str) -> bool {
    let clean = trim_edge_punctuation(candidate);
    if clean.chars().count() < 2 {
        return false;
    }

    !lexicon.is_skip_word(clean) && !lexicon.is_keyword(clean) && !lexicon.is_starter_capital(clean)
}

struct Anchor {
    capitalized: Regex,
    lowercase: Regex,
}

impl Anchor {
    fn new(word: &str) -> Self {
        let word = regex::escape(word);
        Self {
            capitalized: Regex::new(&format!(
                r"\b{word}\s+([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)*)"
            ))
            .expect("valid capitalized anchor regex"),
            lowercase: Regex::new(&format!(r"\b{word}\s+([a-z][a-z]+(?:\s+[a-z]+)*)"))
                .expect("valid lowercase anchor regex"),
        }
    }
}

/// "anchor word + place" matching, shared by the preposition and verb units.
///
/// For each anchor the capitalised form is tried on the original text, then
/// the lowercase form on the lowercased text. A lowercase capture that starts
/// with a skip-word (or, when `strip_verbs` is set, a travel verb) loses that
/// first word; if nothing is left the anchor is abandoned.
pub struct AnchoredPattern {
    name: &'static str,
    anchors: Vec<Anchor>,
    strip_verbs: bool,
}

impl AnchoredPattern {
    pub fn prepositions(lexicon: &Lexicon) -> Self {
        Self {
            name: "preposition",
            anchors: lexicon.prepositions.iter().map(|w| Anchor::new(w)).collect(),
            strip_verbs: true,
        }
    }

    pub fn travel_verbs(lexicon: &Lexicon) -> Self {
        Self {
            name: "verb",
            anchors: lexicon.travel_verbs.iter().map(|w| Anchor::new(w)).collect(),
            strip_verbs: false,
        }
    }

    fn lowercase_capture(&self, capture: &str, lexicon: &Lexicon) -> Option<String> {
        let words = capture.split_whitespace().collect::<Vec<_>>();
        let first = words.first()?;

        let strip = lexicon.is_skip_word(first) || (self.strip_verbs && lexicon.is_travel_verb(first));
        let kept = if strip { &words[1..] } else { &words[..] };
        if kept.is_empty() {
            return None;
        }

        Some(title_case(&kept.join(" ")))
    }
}

impl LocationStrategy for AnchoredPattern {
    fn name(&self) -> &'static str {
        self.name
    }

    fn locate(&self, text: &str, lexicon: &Lexicon) -> Option<String> {
        let lower = text.to_lowercase();

        for anchor in &self.anchors {
            if let Some(found) = anchor.capitalized.captures(text).and_then(|c| c.get(1)) {
                let location = found.as_str().trim();
                if is_valid_location(lexicon, location) {
                    return Some(location.to_string());
                }
            }

            let Some(found) = anchor.lowercase.captures(&lower).and_then(|c| c.get(1)) else {
                continue;
            };
            let Some(location) = self.lowercase_capture(found.as_str(), lexicon) else {
                continue;
            };
            if is_valid_location(lexicon, &location) {
                return Some(location);
            }
        }

        None
    }
}

/// First capitalised token longer than two chars. A sentence-starter word is
/// only rejected in first position.
pub struct ProperNounScan;

impl LocationStrategy for ProperNounScan {
    fn name(&self) -> &'static str {
        "proper_noun"
    }

    fn locate(&self, text: &str, lexicon: &Lexicon) -> Option<String> {
        for (index, word) in text.split_whitespace().enumerate() {
            let clean = strip_punctuation(word);
            if clean.chars().count() <= 2 {
                continue;
            }

            let capitalized = clean.chars().next().is_some_and(char::is_uppercase);
            if !capitalized || lexicon.is_skip_word(&clean) {
                continue;
            }
            if index == 0 && lexicon.is_sentence_starter(&clean) {
                continue;
            }

            if is_valid_location(lexicon, &clean) {
                return Some(clean);
            }
        }

        None
    }
}

/// Last resort for all-lowercase input: first token that is not a skip-word
/// and has no keyword inside it, title-cased.
pub struct LowercaseFallback;

impl LocationStrategy for LowercaseFallback {
    fn name(&self) -> &'static str {
        "lowercase_fallback"
    }

    fn locate(&self, text: &str, lexicon: &Lexicon) -> Option<String> {
        text.to_lowercase()
            .split_whitespace()
            .map(strip_punctuation)
            .filter(|clean| clean.chars().count() > 2)
            .filter(|clean| !lexicon.is_skip_word(clean) && !lexicon.contains_keyword(clean))
            .map(|clean| title_case(&clean))
            .find(|location| is_valid_location(lexicon, location))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub location: String,
    pub strategy: &'static str,
}

/// The heuristic extractor: intent keywords plus the location cascade.
#[derive(Clone)]
pub struct HeuristicParser {
    lexicon: Arc<Lexicon>,
    strategies: Arc<Vec<Box<dyn LocationStrategy>>>,
}

impl HeuristicParser {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        let strategies: Vec<Box<dyn LocationStrategy>> = vec![
            Box::new(AnchoredPattern::prepositions(&lexicon)),
            Box::new(AnchoredPattern::travel_verbs(&lexicon)),
            Box::new(ProperNounScan),
            Box::new(LowercaseFallback),
        ];
        Self::with_strategies(lexicon, strategies)
    }

    pub fn with_strategies(lexicon: Arc<Lexicon>, strategies: Vec<Box<dyn LocationStrategy>>) -> Self {
        Self {
            lexicon,
            strategies: Arc::new(strategies),
        }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn locate(&self, text: &str) -> Option<Located> {
        let text = normalize_text(text);
        self.strategies.iter().find_map(|strategy| {
            strategy
                .locate(&text, &self.lexicon)
                .map(|location| Located {
                    location,
                    strategy: strategy.name(),
                })
        })
    }

    pub fn parse(&self, text: &str) -> QueryAnalysis {
        QueryAnalysis {
            location: self.locate(text).map(|found| found.location),
            intent: classify_intent(&self.lexicon, text),
        }
    }
}

impl Default for HeuristicParser {
    fn default() -> Self {
        Self::new(Lexicon::builtin())
    }
}
