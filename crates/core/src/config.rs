//! Runtime configuration, read from `WAYFINDER_*` environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::area::DEFAULT_SEARCH_RADIUS_M;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    #[default]
    Heuristic,
    Llm,
}

impl ExtractorKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "heuristic" | "rules" | "regex" => Some(Self::Heuristic),
            "llm" | "openai" => Some(Self::Llm),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heuristic => "heuristic",
            Self::Llm => "llm",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub nominatim_url: String,
    pub open_meteo_url: String,
    pub overpass_url: String,
    pub user_agent: String,
    pub geocode_limit: u8,
    pub places_radius_m: u32,
    pub geocode_timeout_seconds: u64,
    pub weather_timeout_seconds: u64,
    pub places_timeout_seconds: u64,
}

impl ProviderConfig {
    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_secs(self.geocode_timeout_seconds)
    }

    pub fn weather_timeout(&self) -> Duration {
        Duration::from_secs(self.weather_timeout_seconds)
    }

    pub fn places_timeout(&self) -> Duration {
        Duration::from_secs(self.places_timeout_seconds)
    }
}

/// Per-client sliding window on the chat endpoint. `max_requests == 0`
/// turns limiting off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window_seconds: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }

    pub fn enabled(&self) -> bool {
        self.max_requests > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConciergeConfig {
    pub extractor: ExtractorKind,
    pub llm: LlmConfig,
    pub providers: ProviderConfig,
    pub lexicon_path: Option<PathBuf>,
    pub scoring_path: Option<PathBuf>,
    pub diagnostics_path: Option<PathBuf>,
    pub rate_limit: RateLimitConfig,
    pub bind: String,
}

impl Default for ConciergeConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ConciergeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset or unparsable values fall
    /// back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let optional = |key: &str| -> Option<String> {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let seconds = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(default)
        };

        let extractor = lookup("WAYFINDER_EXTRACTOR")
            .and_then(|value| ExtractorKind::parse(&value))
            .unwrap_or_default();

        Self {
            extractor,
            llm: LlmConfig {
                api_key: optional("WAYFINDER_OPENAI_API_KEY"),
                model: text("WAYFINDER_OPENAI_MODEL", "gpt-4o-mini"),
                base_url: text("WAYFINDER_OPENAI_BASE_URL", "https://api.openai.com/v1"),
                timeout_seconds: seconds("WAYFINDER_LLM_TIMEOUT_SECONDS", 20),
            },
            providers: ProviderConfig {
                nominatim_url: text(
                    "WAYFINDER_NOMINATIM_URL",
                    "https://nominatim.openstreetmap.org",
                ),
                open_meteo_url: text("WAYFINDER_OPEN_METEO_URL", "https://api.open-meteo.com/v1"),
                overpass_url: text(
                    "WAYFINDER_OVERPASS_URL",
                    "https://overpass-api.de/api/interpreter",
                ),
                user_agent: text(
                    "WAYFINDER_USER_AGENT",
                    concat!("wayfinder/", env!("CARGO_PKG_VERSION")),
                ),
                geocode_limit: lookup("WAYFINDER_GEOCODE_LIMIT")
                    .and_then(|value| value.trim().parse::<u8>().ok())
                    .map(|value| value.clamp(1, 50))
                    .unwrap_or(5),
                places_radius_m: lookup("WAYFINDER_PLACES_RADIUS_M")
                    .and_then(|value| value.trim().parse::<u32>().ok())
                    .filter(|value| *value > 0)
                    .unwrap_or(DEFAULT_SEARCH_RADIUS_M),
                geocode_timeout_seconds: seconds("WAYFINDER_GEOCODE_TIMEOUT_SECONDS", 10),
                weather_timeout_seconds: seconds("WAYFINDER_WEATHER_TIMEOUT_SECONDS", 10),
                places_timeout_seconds: seconds("WAYFINDER_PLACES_TIMEOUT_SECONDS", 20),
            },
            lexicon_path: optional("WAYFINDER_LEXICON_PATH").map(PathBuf::from),
            scoring_path: optional("WAYFINDER_SCORING_PATH").map(PathBuf::from),
            diagnostics_path: optional("WAYFINDER_DIAGNOSTICS_PATH").map(PathBuf::from),
            rate_limit: RateLimitConfig {
                max_requests: lookup("WAYFINDER_RATE_LIMIT_MAX")
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(30),
                window_seconds: seconds("WAYFINDER_RATE_LIMIT_WINDOW_SECONDS", 60),
            },
            bind: text("WAYFINDER_BIND", "0.0.0.0:8080"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> ConciergeConfig {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        ConciergeConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_collaborator_contracts() {
        let config = ConciergeConfig::default();
        assert_eq!(config.extractor, ExtractorKind::Heuristic);
        assert_eq!(config.providers.geocode_timeout_seconds, 10);
        assert_eq!(config.providers.weather_timeout_seconds, 10);
        assert_eq!(config.providers.places_timeout_seconds, 20);
        assert_eq!(config.providers.places_radius_m, 5_000);
        assert!(config.llm.api_key.is_none());
        assert!(config.diagnostics_path.is_none());
        assert_eq!(config.rate_limit.max_requests, 30);
        assert_eq!(config.rate_limit.window(), Duration::from_secs(60));
    }

    #[test]
    fn reads_overrides_and_ignores_garbage() {
        let config = config_from(&[
            ("WAYFINDER_EXTRACTOR", "LLM"),
            ("WAYFINDER_OPENAI_API_KEY", "  sk-test "),
            ("WAYFINDER_PLACES_RADIUS_M", "abc"),
            ("WAYFINDER_GEOCODE_LIMIT", "3"),
            ("WAYFINDER_WEATHER_TIMEOUT_SECONDS", "0"),
        ]);
        assert_eq!(config.extractor, ExtractorKind::Llm);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.providers.places_radius_m, 5_000);
        assert_eq!(config.providers.geocode_limit, 3);
        assert_eq!(config.providers.weather_timeout_seconds, 10);
    }

    #[test]
    fn zero_rate_limit_disables_limiting() {
        let config = config_from(&[("WAYFINDER_RATE_LIMIT_MAX", "0")]);
        assert!(!config.rate_limit.enabled());
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let config = config_from(&[("WAYFINDER_OPENAI_API_KEY", "   ")]);
        assert!(config.llm.api_key.is_none());
    }
}
