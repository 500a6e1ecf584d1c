use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::json;
use tower::ServiceExt;
use wayfinder_agents::ConciergeAgent;
use wayfinder_api::{
    build_app, build_router, ApiState, ChatResponse, ClientRateLimiter, HealthResponse,
    EMPTY_MESSAGE_REPLY,
};
use wayfinder_core::{ConciergeConfig, Intent, Lexicon, OsmType, ReplyOutcome, ResolvedLocation};
use wayfinder_nlp::HeuristicExtractor;
use wayfinder_observability::AppMetrics;
use wayfinder_providers::{Geocoder, PlacesProvider, WeatherProvider};

struct KnownCities;

#[async_trait]
impl Geocoder for KnownCities {
    async fn geocode(&self, place: &str) -> Option<ResolvedLocation> {
        match place {
            "Mumbai" => Some(ResolvedLocation {
                latitude: 19.07,
                longitude: 72.87,
                osm_id: Some(7888990),
                osm_type: Some(OsmType::Relation),
            }),
            "Bangalore" => Some(ResolvedLocation {
                latitude: 12.97,
                longitude: 77.59,
                osm_id: Some(7902476),
                osm_type: Some(OsmType::Relation),
            }),
            _ => None,
        }
    }
}

struct FixedWeather;

#[async_trait]
impl WeatherProvider for FixedWeather {
    async fn current_conditions(&self, _latitude: f64, _longitude: f64) -> Option<String> {
        Some("currently 29°C with a chance of 10% to rain".to_string())
    }
}

struct FixedPlaces;

#[async_trait]
impl PlacesProvider for FixedPlaces {
    async fn attractions(&self, _location: &ResolvedLocation, _radius_m: u32) -> Vec<String> {
        vec!["Lalbagh Botanical Garden".to_string(), "Cubbon Park".to_string()]
    }
}

fn fake_agent() -> ConciergeAgent {
    ConciergeAgent::new(
        Arc::new(HeuristicExtractor::new(Lexicon::builtin())),
        Arc::new(KnownCities),
        Arc::new(FixedWeather),
        Arc::new(FixedPlaces),
        AppMetrics::shared(),
    )
}

fn app() -> Router {
    build_router(ApiState::new(fake_agent()))
}

fn chat_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_reports_extractor_and_metrics() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let health: HealthResponse = json_body(response).await;
    assert_eq!(health.status, "ok");
    assert_eq!(health.extractor, "heuristic");
    assert_eq!(health.metrics.requests_total, 0);
}

#[tokio::test]
async fn chat_answers_weather_question() {
    let response = app()
        .oneshot(chat_request(
            "/v1/chat",
            json!({ "message": "What's the weather in Mumbai?" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let reply: ChatResponse = json_body(response).await;
    assert_eq!(reply.outcome, ReplyOutcome::Answered);
    assert_eq!(reply.intent, Some(Intent::Weather));
    assert_eq!(
        reply.response,
        "In Mumbai it's currently 29°C with a chance of 10% to rain."
    );
}

#[tokio::test]
async fn lowercase_single_word_lists_places() {
    let response = app()
        .oneshot(chat_request("/chat", json!({ "message": "bangalore" })))
        .await
        .unwrap();

    let reply: ChatResponse = json_body(response).await;
    assert_eq!(reply.location.as_deref(), Some("Bangalore"));
    assert_eq!(reply.intent, Some(Intent::Places));
    assert_eq!(
        reply.response,
        "In Bangalore these are the places you can go:\nLalbagh Botanical Garden\nCubbon Park"
    );
}

#[tokio::test]
async fn unknown_place_gets_apology() {
    let response = app()
        .oneshot(chat_request(
            "/v1/chat",
            json!({ "message": "Show me places in Zzzxyplace" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let reply: ChatResponse = json_body(response).await;
    assert_eq!(reply.outcome, ReplyOutcome::GeocodeMiss);
    assert!(reply.response.contains("'Zzzxyplace'"));
}

#[tokio::test]
async fn empty_message_is_rejected() {
    for body in [json!({ "message": "   " }), json!({}), json!({ "message": 42 })] {
        let response = app()
            .oneshot(chat_request("/v1/chat", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let parsed: serde_json::Value = json_body(response).await;
        assert_eq!(parsed["response"], EMPTY_MESSAGE_REPLY);
    }
}

#[tokio::test]
async fn oversized_body_is_refused() {
    let message = "a".repeat(32 * 1024);
    let response = app()
        .oneshot(chat_request("/v1/chat", json!({ "message": message })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn rate_limit_applies_to_chat_only() {
    let state = ApiState::new(fake_agent())
        .with_limiter(Some(ClientRateLimiter::new(Duration::from_secs(60), 1)));
    let app = build_router(state);

    let first = app
        .clone()
        .oneshot(chat_request("/v1/chat", json!({ "message": "bangalore" })))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .clone()
        .oneshot(chat_request("/v1/chat", json!({ "message": "bangalore" })))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key("retry-after"));

    let health = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn index_serves_chat_page() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&body).contains("/v1/chat"));
}

#[tokio::test]
async fn default_config_builds_without_network() {
    let app = build_app(&ConciergeConfig::default())
        .await
        .expect("app should build");

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
