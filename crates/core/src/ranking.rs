//! Disambiguation between several geocoder hits for the same mention.
//!
//! Every term of the score defaults to zero when its field is absent. The
//! weights are data: the compiled-in defaults live in `data/scoring.json`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::models::{GeocodeCandidate, OsmType};

const BUILTIN_SCORING: &str = include_str!("../data/scoring.json");

static BUILTIN: Lazy<ScoringWeights> =
    Lazy::new(|| serde_json::from_str(BUILTIN_SCORING).expect("embedded scoring weights are valid"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryBias {
    pub codes: Vec<String>,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub version: u32,
    /// First matching group wins.
    pub country_bias: Vec<CountryBias>,
    /// Keyed by `node`, `way`, `relation`.
    pub type_weights: HashMap<String, f64>,
    pub admin_level_ceiling: i32,
    pub admin_level_step: f64,
    pub population_divisor: f64,
    pub population_cap: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        BUILTIN.clone()
    }
}

impl ScoringWeights {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("failed reading scoring weights at {}", path.as_ref().display())
        })?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid scoring weights at {}", path.as_ref().display()))
    }

    fn country_term(&self, code: Option<&str>) -> f64 {
        let Some(code) = code else {
            return 0.0;
        };
        self.country_bias
            .iter()
            .find(|bias| bias.codes.iter().any(|c| c.eq_ignore_ascii_case(code)))
            .map(|bias| bias.weight)
            .unwrap_or(0.0)
    }

    fn type_term(&self, osm_type: Option<OsmType>) -> f64 {
        osm_type
            .and_then(|kind| self.type_weights.get(kind.as_str()))
            .copied()
            .unwrap_or(0.0)
    }

    fn admin_term(&self, admin_level: Option<i32>) -> f64 {
        admin_level
            .map(|level| {
                (i64::from(self.admin_level_ceiling) - i64::from(level)) as f64
                    * self.admin_level_step
            })
            .unwrap_or(0.0)
    }

    fn population_term(&self, population: Option<u64>) -> f64 {
        match population {
            Some(count) if self.population_divisor > 0.0 => {
                (count as f64 / self.population_divisor).min(self.population_cap)
            }
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ranker {
    weights: ScoringWeights,
}

impl Ranker {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn score(&self, candidate: &GeocodeCandidate) -> f64 {
        self.weights.country_term(candidate.country_code.as_deref())
            + self.weights.type_term(candidate.osm_type)
            + self.weights.admin_term(candidate.admin_level)
            + self.weights.population_term(candidate.population)
    }

    /// Highest score wins; on a tie the earlier candidate is kept.
    pub fn select<'a>(&self, candidates: &'a [GeocodeCandidate]) -> Option<&'a GeocodeCandidate> {
        let mut best: Option<(&GeocodeCandidate, f64)> = None;

        for candidate in candidates {
            let score = self.score(candidate);
            tracing::debug!(
                display_name = candidate.display_name.as_deref().unwrap_or_default(),
                score,
                "scored geocode candidate"
            );
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((candidate, score)),
            }
        }

        best.map(|(candidate, _)| candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(
        country: Option<&str>,
        osm_type: Option<OsmType>,
        admin_level: Option<i32>,
        population: Option<u64>,
    ) -> GeocodeCandidate {
        GeocodeCandidate {
            country_code: country.map(str::to_string),
            osm_type,
            admin_level,
            population,
            ..GeocodeCandidate::at(0.0, 0.0)
        }
    }

    #[test]
    fn scores_each_term() {
        let ranker = Ranker::default();
        let full = candidate(Some("IN"), Some(OsmType::Relation), Some(8), Some(500_000));
        // 10000 + 300 + (20 - 8) * 10 + 50
        assert_eq!(ranker.score(&full), 10_470.0);

        let empty = candidate(None, None, None, None);
        assert_eq!(ranker.score(&empty), 0.0);
    }

    #[test]
    fn country_groups() {
        let ranker = Ranker::default();
        assert_eq!(ranker.score(&candidate(Some("gb"), None, None, None)), 5_000.0);
        assert_eq!(ranker.score(&candidate(Some("NZ"), None, None, None)), -5_000.0);
        assert_eq!(ranker.score(&candidate(Some("SE"), None, None, None)), 0.0);
    }

    #[test]
    fn population_contribution_is_capped() {
        let ranker = Ranker::default();
        let huge = candidate(None, None, None, Some(20_000_000));
        assert_eq!(ranker.score(&huge), 100.0);
    }

    #[test]
    fn prefers_indian_match_over_australian() {
        let ranker = Ranker::default();
        let candidates = vec![
            candidate(Some("AU"), Some(OsmType::Relation), Some(4), Some(5_000_000)),
            candidate(Some("IN"), Some(OsmType::Node), None, None),
        ];
        let chosen = ranker.select(&candidates).unwrap();
        assert_eq!(chosen.country_code.as_deref(), Some("IN"));
    }

    #[test]
    fn extreme_admin_levels_score_without_overflow() {
        let ranker = Ranker::default();
        let lowest = candidate(None, None, Some(i32::MIN), None);
        let highest = candidate(None, None, Some(i32::MAX), None);

        assert_eq!(ranker.score(&lowest), (20.0 - f64::from(i32::MIN)) * 10.0);
        assert_eq!(ranker.score(&highest), (20.0 - f64::from(i32::MAX)) * 10.0);

        let candidates = vec![highest, lowest];
        let chosen = ranker.select(&candidates).unwrap();
        assert_eq!(chosen.admin_level, Some(i32::MIN));
    }

    #[test]
    fn ties_keep_input_order() {
        let ranker = Ranker::default();
        let mut first = candidate(Some("FR"), Some(OsmType::Way), None, None);
        first.display_name = Some("first".to_string());
        let mut second = first.clone();
        second.display_name = Some("second".to_string());

        let candidates = vec![first, second];
        let chosen = ranker.select(&candidates).unwrap();
        assert_eq!(chosen.display_name.as_deref(), Some("first"));
    }

    #[test]
    fn selected_score_dominates() {
        let ranker = Ranker::default();
        let candidates = vec![
            candidate(Some("US"), Some(OsmType::Node), Some(10), Some(10_000)),
            candidate(None, Some(OsmType::Relation), Some(2), None),
            candidate(Some("DE"), Some(OsmType::Way), Some(6), Some(3_000_000)),
            candidate(Some("AU"), None, None, None),
        ];
        let chosen = ranker.select(&candidates).unwrap();
        let top = ranker.score(chosen);
        assert!(candidates.iter().all(|c| ranker.score(c) <= top));
    }

    #[test]
    fn empty_slice_selects_nothing() {
        assert!(Ranker::default().select(&[]).is_none());
    }

    #[test]
    fn custom_weights_remove_bias() {
        let mut weights = ScoringWeights::default();
        weights.country_bias.clear();
        let ranker = Ranker::new(weights);
        assert_eq!(ranker.score(&candidate(Some("IN"), None, None, None)), 0.0);
    }
}
