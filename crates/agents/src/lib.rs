use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;
use wayfinder_core::{
    compose_response, weather_unavailable_section, ConciergeConfig, ConciergeError,
    ConciergeReply, Lexicon, QueryAnalysis, Ranker, ReplyOutcome, Response, ScoringWeights,
    DEFAULT_SEARCH_RADIUS_M,
};
use wayfinder_nlp::{Extraction, ExtractorStack, QueryExtractor};
use wayfinder_observability::{
    AppMetrics, DiagnosticEvent, DiagnosticSink, JsonlFileSink, NullSink,
};
use wayfinder_providers::{
    Geocoder, NominatimGeocoder, OpenMeteoWeather, OverpassPlaces, PlacesProvider,
    WeatherProvider,
};

/// Drives one message through extraction, geocoding, the per-intent fetches
/// and composition. Collaborators are shared read-only across requests.
#[derive(Clone)]
pub struct ConciergeAgent {
    extractor: Arc<dyn QueryExtractor>,
    geocoder: Arc<dyn Geocoder>,
    weather: Arc<dyn WeatherProvider>,
    places: Arc<dyn PlacesProvider>,
    diagnostics: Arc<dyn DiagnosticSink>,
    metrics: Arc<AppMetrics>,
    places_radius_m: u32,
}

impl ConciergeAgent {
    pub fn new(
        extractor: Arc<dyn QueryExtractor>,
        geocoder: Arc<dyn Geocoder>,
        weather: Arc<dyn WeatherProvider>,
        places: Arc<dyn PlacesProvider>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            extractor,
            geocoder,
            weather,
            places,
            diagnostics: Arc::new(NullSink),
            metrics,
            places_radius_m: DEFAULT_SEARCH_RADIUS_M,
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_places_radius(mut self, meters: u32) -> Self {
        self.places_radius_m = meters;
        self
    }

    /// Wires the HTTP-backed collaborators described by `config`.
    pub fn from_config(config: &ConciergeConfig, metrics: Arc<AppMetrics>) -> Result<Self> {
        let lexicon = match &config.lexicon_path {
            Some(path) => Arc::new(Lexicon::from_path(path)?),
            None => Lexicon::builtin(),
        };
        let weights = match &config.scoring_path {
            Some(path) => ScoringWeights::from_path(path)?,
            None => ScoringWeights::default(),
        };
        info!(
            lexicon_version = lexicon.version,
            scoring_version = weights.version,
            extractor = config.extractor.as_str(),
            "concierge data loaded"
        );

        let stack = ExtractorStack::load(config, lexicon)?;
        let providers = &config.providers;
        let diagnostics: Arc<dyn DiagnosticSink> = match &config.diagnostics_path {
            Some(path) => Arc::new(JsonlFileSink::open(path)?),
            None => Arc::new(NullSink),
        };

        Ok(Self::new(
            stack.extractor,
            Arc::new(NominatimGeocoder::new(providers, Ranker::new(weights))?),
            Arc::new(OpenMeteoWeather::new(providers)?),
            Arc::new(OverpassPlaces::new(providers)?),
            metrics,
        )
        .with_diagnostics(diagnostics)
        .with_places_radius(providers.places_radius_m))
    }

    pub fn extractor_name(&self) -> &'static str {
        self.extractor.name()
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    /// Always produces exactly one reply; failures become apology text.
    #[instrument(skip(self, text))]
    pub async fn handle_message(&self, text: &str) -> ConciergeReply {
        let started = Instant::now();
        let request_id = Uuid::new_v4();
        self.metrics.inc_request();
        self.record(
            request_id,
            "received",
            json!({ "chars": text.chars().count(), "extractor": self.extractor.name() }),
        );

        let reply = match self.extract(request_id, text).await {
            Ok(analysis) => {
                let intent = analysis.intent;
                let location = analysis.location.clone();
                match self.answer(request_id, analysis).await {
                    Ok(response) => ConciergeReply {
                        reply_text: response.render(),
                        outcome: ReplyOutcome::Answered,
                        intent: Some(intent),
                        location,
                    },
                    Err(err) => failure_reply(&err, Some(intent), location),
                }
            }
            Err(err) => failure_reply(&err, None, None),
        };

        self.count_outcome(reply.outcome);
        self.metrics.observe_latency(started.elapsed());
        self.record(
            request_id,
            "completed",
            json!({ "outcome": reply.outcome, "elapsed_ms": started.elapsed().as_millis() as u64 }),
        );
        info!(
            request_id = %request_id,
            outcome = reply.outcome.as_str(),
            intent = ?reply.intent,
            location = reply.location.as_deref().unwrap_or(""),
            "message handled"
        );

        reply
    }

    pub async fn extract(&self, request_id: Uuid, text: &str) -> Result<QueryAnalysis, ConciergeError> {
        let Extraction { analysis, strategy } = self.extractor.extract(text).await?;
        self.record(
            request_id,
            "extract",
            json!({
                "location": analysis.location,
                "intent": analysis.intent,
                "strategy": strategy,
            }),
        );
        Ok(analysis)
    }

    /// Geocodes the mention and runs the fetches the intent asks for, weather
    /// first. Each collaborator is called at most once. A resolved location
    /// always yields at least one section.
    pub async fn answer(&self, request_id: Uuid, analysis: QueryAnalysis) -> Result<Response, ConciergeError> {
        let location = analysis
            .location
            .ok_or(ConciergeError::NoLocationFound)?;

        let resolved = self.geocoder.geocode(&location).await;
        self.record(
            request_id,
            "geocode",
            json!({
                "location": location,
                "resolved": resolved.is_some(),
                "osm_type": resolved.and_then(|found| found.osm_type),
                "osm_id": resolved.and_then(|found| found.osm_id),
            }),
        );
        let resolved = resolved.ok_or_else(|| ConciergeError::geocode_miss(&location))?;

        let weather = if analysis.intent.wants_weather() {
            let descriptor = self
                .weather
                .current_conditions(resolved.latitude, resolved.longitude)
                .await;
            if descriptor.is_none() {
                self.metrics.inc_weather_soft_miss();
            }
            self.record(request_id, "weather", json!({ "descriptor": descriptor }));
            descriptor
        } else {
            None
        };

        let places = if analysis.intent.wants_places() {
            let names = self.places.attractions(&resolved, self.places_radius_m).await;
            if names.is_empty() {
                self.metrics.inc_places_empty();
            }
            self.record(request_id, "places", json!({ "count": names.len() }));
            Some(names)
        } else {
            None
        };

        let mut response = compose_response(&location, weather.as_deref(), places.as_deref());
        if response.is_empty() {
            response.sections.push(weather_unavailable_section(&location));
        }
        Ok(response)
    }

    fn count_outcome(&self, outcome: ReplyOutcome) {
        match outcome {
            ReplyOutcome::Answered => self.metrics.inc_answered(),
            ReplyOutcome::NoLocation => self.metrics.inc_no_location(),
            ReplyOutcome::GeocodeMiss => self.metrics.inc_geocode_miss(),
            ReplyOutcome::ConfigurationError => self.metrics.inc_configuration_error(),
        }
    }

    fn record(&self, request_id: Uuid, stage: &str, detail: serde_json::Value) {
        self.diagnostics
            .record(DiagnosticEvent::new(request_id, stage, detail));
    }
}

fn failure_reply(
    err: &ConciergeError,
    intent: Option<wayfinder_core::Intent>,
    location: Option<String>,
) -> ConciergeReply {
    ConciergeReply {
        reply_text: err.user_message(),
        outcome: err.outcome(),
        intent,
        location,
    }
}
