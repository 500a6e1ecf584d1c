use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::warn;
use wayfinder_core::ProviderConfig;

use crate::{http_client, WeatherProvider};

/// `currently {t}°C with a chance of {p}% to rain`, or `None` when the
/// payload has no current temperature. A missing probability reads as 0.
pub fn descriptor_from_payload(payload: &Value) -> Option<String> {
    let current = payload.get("current")?;
    let temperature = current.get("temperature_2m").filter(|value| value.is_number())?;
    let probability = current
        .get("precipitation_probability")
        .filter(|value| value.is_number())
        .map(format_number)
        .unwrap_or_else(|| "0".to_string());

    Some(format!(
        "currently {}°C with a chance of {}% to rain",
        format_number(temperature),
        probability
    ))
}

/// Integers render bare; floats keep at least one decimal, so `29.0` stays `29.0`.
fn format_number(value: &Value) -> String {
    if let Some(whole) = value.as_i64() {
        return whole.to_string();
    }
    match value.as_f64() {
        Some(number) if number.is_finite() && number.fract() == 0.0 => format!("{number:.1}"),
        Some(number) => number.to_string(),
        None => String::new(),
    }
}

pub struct OpenMeteoWeather {
    client: Client,
    base_url: String,
}

impl OpenMeteoWeather {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(&config.user_agent, config.weather_timeout())?,
            base_url: config.open_meteo_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn forecast(&self, latitude: f64, longitude: f64) -> Result<Value> {
        let response = self
            .client
            .get(format!("{}/forecast", self.base_url))
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                (
                    "current",
                    "temperature_2m,precipitation_probability".to_string(),
                ),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await
            .context("weather request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("weather non-success status {}", status.as_u16());
        }

        response.json().await.context("weather parse failed")
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoWeather {
    async fn current_conditions(&self, latitude: f64, longitude: f64) -> Option<String> {
        match self.forecast(latitude, longitude).await {
            Ok(payload) => descriptor_from_payload(&payload),
            Err(err) => {
                warn!(latitude, longitude, error = %err, "weather lookup failed");
                None
            }
        }
    }
}
