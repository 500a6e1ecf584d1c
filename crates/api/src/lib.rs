mod rate_limit;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use wayfinder_agents::ConciergeAgent;
use wayfinder_core::{ConciergeConfig, ConciergeReply, Intent, ReplyOutcome};
use wayfinder_observability::{AppMetrics, MetricsSnapshot};

pub use rate_limit::ClientRateLimiter;

pub const EMPTY_MESSAGE_REPLY: &str = "Please enter a message.";
pub const RATE_LIMITED_REPLY: &str = "You're sending messages too quickly. Please wait a moment.";
const MAX_BODY_BYTES: usize = 16 * 1024;
const INDEX_HTML: &str = include_str!("../assets/index.html");

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<ConciergeAgent>,
    pub metrics: Arc<AppMetrics>,
    pub limiter: Option<ClientRateLimiter>,
}

impl ApiState {
    pub fn new(agent: ConciergeAgent) -> Self {
        Self {
            metrics: agent.metrics().clone(),
            agent: Arc::new(agent),
            limiter: None,
        }
    }

    pub fn with_limiter(mut self, limiter: Option<ClientRateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp_utc: String,
    pub extractor: String,
    pub metrics: MetricsSnapshot,
}

#[derive(Debug, Default, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub outcome: ReplyOutcome,
    pub intent: Option<Intent>,
    pub location: Option<String>,
}

impl From<ConciergeReply> for ChatResponse {
    fn from(reply: ConciergeReply) -> Self {
        Self {
            response: reply.reply_text,
            outcome: reply.outcome,
            intent: reply.intent,
            location: reply.location,
        }
    }
}

pub async fn build_app(config: &ConciergeConfig) -> Result<Router> {
    let metrics = AppMetrics::shared();
    let agent = ConciergeAgent::from_config(config, metrics)
        .context("failed to initialize concierge agent")?;
    let state = ApiState::new(agent)
        .with_limiter(ClientRateLimiter::from_config(&config.rate_limit));

    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/v1/chat", post(chat))
        .route("/chat", post(chat))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(build_cors_layer())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

/// Binds `config.bind` and serves until ctrl-c.
pub async fn serve(config: &ConciergeConfig) -> Result<()> {
    let app = build_app(config).await?;
    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(
        bind = %config.bind,
        extractor = config.extractor.as_str(),
        "wayfinder api started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok".to_string(),
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        extractor: state.agent.extractor_name().to_string(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn chat(
    State(state): State<ApiState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return rejection.into_response();
        }
        Err(rejection) => {
            tracing::debug!(error = %rejection, "chat body rejected");
            ChatRequest::default()
        }
    };

    let Some(message) = request.message.filter(|text| !text.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "response": EMPTY_MESSAGE_REPLY })),
        )
            .into_response();
    };

    let reply = state.agent.handle_message(&message).await;
    (StatusCode::OK, Json(ChatResponse::from(reply))).into_response()
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(limiter) = state.limiter.as_ref() else {
        return next.run(request).await;
    };
    if request.method() != Method::POST || !is_chat_path(request.uri().path()) {
        return next.run(request).await;
    }

    let client = request_ip(&request);
    match limiter.check(&client) {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            tracing::warn!(client = %client, "chat rate limited");
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "response": RATE_LIMITED_REPLY,
                    "error": "rate_limited"
                })),
            )
                .into_response();
            let seconds = retry_after.as_secs().max(1).to_string();
            if let Ok(value) = HeaderValue::from_str(&seconds) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
    }
}

fn is_chat_path(path: &str) -> bool {
    matches!(path, "/v1/chat" | "/chat")
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "local".to_string())
}

fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
