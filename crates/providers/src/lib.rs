//! Outbound collaborators of the concierge: geocoding, weather and
//! points-of-interest.
//!
//! Every trait method returns an empty sentinel (`None` or an empty list)
//! instead of an error. Implementations log the underlying failure and never
//! retry.

mod nominatim;
mod open_meteo;
mod overpass;

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use wayfinder_core::{GeocodeCandidate, Ranker, ResolvedLocation};

pub use nominatim::{candidates_from_payload, NominatimGeocoder};
pub use open_meteo::{descriptor_from_payload, OpenMeteoWeather};
pub use overpass::{build_query, place_names_from_payload, OverpassPlaces, MAX_PLACES};

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Best match for a place name, or `None` when nothing matched or the
    /// lookup failed.
    async fn geocode(&self, place: &str) -> Option<ResolvedLocation>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Human-readable current conditions, e.g.
    /// `currently 29.4°C with a chance of 10% to rain`.
    async fn current_conditions(&self, latitude: f64, longitude: f64) -> Option<String>;
}

#[async_trait]
pub trait PlacesProvider: Send + Sync {
    /// Up to ten deduplicated attraction names, best first.
    async fn attractions(&self, location: &ResolvedLocation, radius_m: u32) -> Vec<String>;
}

/// A single candidate is taken as is; several go through the ranker.
pub fn choose_candidate(ranker: &Ranker, candidates: &[GeocodeCandidate]) -> Option<ResolvedLocation> {
    match candidates {
        [] => None,
        [only] => Some(only.resolve()),
        many => ranker.select(many).map(GeocodeCandidate::resolve),
    }
}

pub(crate) fn http_client(user_agent: &str, timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(6).min(timeout))
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")
}

/// Reads a JSON number or a numeric string.
pub(crate) fn json_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|number| number.is_finite())
}
