mod heuristic;
mod llm;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use wayfinder_core::{ConciergeConfig, ConciergeError, ExtractorKind, Lexicon, QueryAnalysis};

pub use heuristic::HeuristicExtractor;
pub use llm::{extract_output_text, parse_llm_reply, LlmExtractor, EXTRACTION_PROMPT};

/// What an extractor understood from one user message.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub analysis: QueryAnalysis,
    /// Which strategy produced the location, if any did.
    pub strategy: Option<&'static str>,
}

impl Extraction {
    pub fn empty() -> Self {
        Self {
            analysis: QueryAnalysis {
                location: None,
                intent: wayfinder_core::Intent::Both,
            },
            strategy: None,
        }
    }
}

/// Turns free text into a location mention and an intent.
///
/// Only configuration problems are errors. Anything else, a flaky upstream
/// included, degrades to an [`Extraction`] without a location.
#[async_trait]
pub trait QueryExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(&self, text: &str) -> Result<Extraction, ConciergeError>;
}

#[derive(Clone)]
pub struct ExtractorStack {
    pub extractor: Arc<dyn QueryExtractor>,
    pub kind: ExtractorKind,
}

impl ExtractorStack {
    pub fn load(config: &ConciergeConfig, lexicon: Arc<Lexicon>) -> Result<Self> {
        let extractor: Arc<dyn QueryExtractor> = match config.extractor {
            ExtractorKind::Heuristic => Arc::new(HeuristicExtractor::new(lexicon)),
            ExtractorKind::Llm => {
                if config.llm.api_key.is_none() {
                    tracing::warn!("language-model extractor selected without an API key");
                }
                Arc::new(LlmExtractor::new(&config.llm)?)
            }
        };

        Ok(Self {
            extractor,
            kind: config.extractor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_heuristic_by_default() {
        let stack = ExtractorStack::load(&ConciergeConfig::default(), Lexicon::builtin()).unwrap();
        assert_eq!(stack.kind, ExtractorKind::Heuristic);
        assert_eq!(stack.extractor.name(), "heuristic");
    }

    #[test]
    fn loads_llm_even_without_key() {
        let mut config = ConciergeConfig::default();
        config.extractor = ExtractorKind::Llm;
        let stack = ExtractorStack::load(&config, Lexicon::builtin()).unwrap();
        assert_eq!(stack.extractor.name(), "llm");
    }
}
