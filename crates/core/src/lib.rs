pub mod area;
pub mod compose;
pub mod config;
pub mod error;
pub mod extract;
pub mod intent;
pub mod lexicon;
pub mod models;
pub mod ranking;
pub mod text;

pub use area::{area_id, SearchScope, DEFAULT_SEARCH_RADIUS_M};
pub use compose::{compose_response, places_section, weather_section, weather_unavailable_section};
pub use config::{ConciergeConfig, ExtractorKind, LlmConfig, ProviderConfig, RateLimitConfig};
pub use error::{ConciergeError, NO_LOCATION_MESSAGE};
pub use extract::{HeuristicParser, Located, LocationStrategy};
pub use intent::classify_intent;
pub use lexicon::Lexicon;
pub use models::*;
pub use ranking::{Ranker, ScoringWeights};
pub use text::{normalize_text, title_case};
