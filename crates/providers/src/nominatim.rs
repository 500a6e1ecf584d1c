use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use wayfinder_core::{GeocodeCandidate, OsmType, ProviderConfig, Ranker, ResolvedLocation};

use crate::{choose_candidate, http_client, json_number, Geocoder};

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: Value,
    lon: Value,
    #[serde(default)]
    osm_id: Option<Value>,
    #[serde(default)]
    osm_type: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: Option<NominatimAddress>,
    #[serde(default)]
    extratags: Option<HashMap<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    #[serde(default)]
    country_code: Option<String>,
}

impl NominatimPlace {
    fn into_candidate(self) -> Option<GeocodeCandidate> {
        let latitude = json_number(&self.lat)?;
        let longitude = json_number(&self.lon)?;
        let extratag = |key: &str| {
            self.extratags
                .as_ref()
                .and_then(|tags| tags.get(key))
                .and_then(json_number)
        };

        Some(GeocodeCandidate {
            latitude,
            longitude,
            osm_id: self
                .osm_id
                .as_ref()
                .and_then(json_number)
                .filter(|id| *id >= 0.0 && id.fract() == 0.0)
                .map(|id| id as u64),
            osm_type: self.osm_type.as_deref().and_then(OsmType::parse),
            country_code: self
                .address
                .as_ref()
                .and_then(|address| address.country_code.as_deref())
                .map(str::to_ascii_uppercase),
            admin_level: extratag("admin_level")
                .filter(|level| level.fract() == 0.0)
                .map(|level| level as i32),
            population: extratag("population")
                .filter(|population| *population >= 0.0)
                .map(|population| population as u64),
            display_name: self.display_name.clone(),
        })
    }
}

/// Candidates from a Nominatim `/search` payload, in service order.
/// Entries without usable coordinates are dropped.
pub fn candidates_from_payload(payload: &Value) -> Vec<GeocodeCandidate> {
    let Some(entries) = payload.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| serde_json::from_value::<NominatimPlace>(entry.clone()).ok())
        .filter_map(NominatimPlace::into_candidate)
        .collect()
}

pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    limit: u8,
    ranker: Ranker,
}

impl NominatimGeocoder {
    pub fn new(config: &ProviderConfig, ranker: Ranker) -> Result<Self> {
        Ok(Self {
            client: http_client(&config.user_agent, config.geocode_timeout())?,
            base_url: config.nominatim_url.trim_end_matches('/').to_string(),
            limit: config.geocode_limit.max(1),
            ranker,
        })
    }

    pub async fn search(&self, place: &str) -> Result<Vec<GeocodeCandidate>> {
        let limit = self.limit.to_string();
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", place),
                ("format", "json"),
                ("limit", limit.as_str()),
                ("addressdetails", "1"),
                ("extratags", "1"),
            ])
            .send()
            .await
            .context("geocoding request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("geocoding non-success status {}", status.as_u16());
        }

        let body: Value = response.json().await.context("geocoding parse failed")?;
        Ok(candidates_from_payload(&body))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, place: &str) -> Option<ResolvedLocation> {
        match self.search(place).await {
            Ok(candidates) => {
                debug!(place, candidates = candidates.len(), "geocoding candidates");
                choose_candidate(&self.ranker, &candidates)
            }
            Err(err) => {
                warn!(place, error = %err, "geocoding failed");
                None
            }
        }
    }
}
