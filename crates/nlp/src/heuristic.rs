use std::sync::Arc;

use async_trait::async_trait;
use wayfinder_core::{classify_intent, ConciergeError, HeuristicParser, Lexicon, QueryAnalysis};

use crate::{Extraction, QueryExtractor};

pub struct HeuristicExtractor {
    parser: HeuristicParser,
}

impl HeuristicExtractor {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self {
            parser: HeuristicParser::new(lexicon),
        }
    }

    pub fn parser(&self) -> &HeuristicParser {
        &self.parser
    }

    pub fn extract_now(&self, text: &str) -> Extraction {
        let located = self.parser.locate(text);
        Extraction {
            strategy: located.as_ref().map(|found| found.strategy),
            analysis: QueryAnalysis {
                location: located.map(|found| found.location),
                intent: classify_intent(self.parser.lexicon(), text),
            },
        }
    }
}

#[async_trait]
impl QueryExtractor for HeuristicExtractor {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn extract(&self, text: &str) -> Result<Extraction, ConciergeError> {
        Ok(self.extract_now(text))
    }
}
