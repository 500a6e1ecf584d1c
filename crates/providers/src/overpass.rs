use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use wayfinder_core::{title_case, ProviderConfig, ResolvedLocation, SearchScope};

use crate::{http_client, PlacesProvider};

pub const MAX_PLACES: usize = 10;

const SELECTORS: [&str; 4] = [
    r#"node["tourism"="attraction"]"#,
    r#"way["tourism"="attraction"]"#,
    r#"relation["tourism"="attraction"]"#,
    r#"node["leisure"="park"]"#,
];

/// Overpass QL for attractions and parks inside an area, or around a point
/// when the location has no area.
pub fn build_query(scope: SearchScope) -> String {
    let (header, filter) = match scope {
        SearchScope::Area(area) => (
            format!("area({area})->.searchArea;\n"),
            "(area.searchArea)".to_string(),
        ),
        SearchScope::Radius {
            latitude,
            longitude,
            meters,
        } => (
            String::new(),
            format!("(around:{meters},{latitude},{longitude})"),
        ),
    };

    let mut query = format!("[out:json];\n{header}(\n");
    for selector in SELECTORS {
        query.push_str(&format!("  {selector}{filter};\n"));
    }
    query.push_str(&format!(");\nout center {MAX_PLACES};\n"));
    query
}

/// Display names from an Overpass payload: English name preferred, title
/// cased, first occurrence kept, at most [`MAX_PLACES`].
pub fn place_names_from_payload(payload: &Value) -> Vec<String> {
    let Some(elements) = payload.get("elements").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut names: Vec<String> = Vec::new();
    for element in elements {
        let Some(tags) = element.get("tags") else {
            continue;
        };
        let raw = ["name:en", "name"]
            .iter()
            .filter_map(|key| tags.get(*key).and_then(Value::as_str))
            .find(|name| !name.trim().is_empty());
        let Some(raw) = raw else {
            continue;
        };

        let name = title_case(raw.trim());
        if !names.contains(&name) {
            names.push(name);
        }
        if names.len() == MAX_PLACES {
            break;
        }
    }
    names
}

pub struct OverpassPlaces {
    client: Client,
    endpoint: String,
}

impl OverpassPlaces {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(&config.user_agent, config.places_timeout())?,
            endpoint: config.overpass_url.clone(),
        })
    }

    pub async fn run(&self, query: String) -> Result<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .body(query)
            .send()
            .await
            .context("points-of-interest request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("points-of-interest non-success status {}", status.as_u16());
        }

        response
            .json()
            .await
            .context("points-of-interest parse failed")
    }
}

#[async_trait]
impl PlacesProvider for OverpassPlaces {
    async fn attractions(&self, location: &ResolvedLocation, radius_m: u32) -> Vec<String> {
        let scope = SearchScope::for_location(location, radius_m);
        debug!(?scope, "points-of-interest scope");

        match self.run(build_query(scope)).await {
            Ok(payload) => place_names_from_payload(&payload),
            Err(err) => {
                warn!(?scope, error = %err, "points-of-interest lookup failed");
                Vec::new()
            }
        }
    }
}
