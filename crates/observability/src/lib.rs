mod diagnostics;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

pub use diagnostics::{DiagnosticEvent, DiagnosticSink, JsonlFileSink, MemorySink, NullSink};

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    answered_total: AtomicU64,
    no_location_total: AtomicU64,
    geocode_miss_total: AtomicU64,
    configuration_error_total: AtomicU64,
    weather_soft_miss_total: AtomicU64,
    places_empty_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub answered_total: u64,
    pub no_location_total: u64,
    pub geocode_miss_total: u64,
    pub configuration_error_total: u64,
    pub weather_soft_miss_total: u64,
    pub places_empty_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_answered(&self) {
        self.answered_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_no_location(&self) {
        self.no_location_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_geocode_miss(&self) {
        self.geocode_miss_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_configuration_error(&self) {
        self.configuration_error_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_weather_soft_miss(&self) {
        self.weather_soft_miss_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_places_empty(&self) {
        self.places_empty_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            answered_total: self.answered_total.load(Ordering::Relaxed),
            no_location_total: self.no_location_total.load(Ordering::Relaxed),
            geocode_miss_total: self.geocode_miss_total.load(Ordering::Relaxed),
            configuration_error_total: self.configuration_error_total.load(Ordering::Relaxed),
            weather_soft_miss_total: self.weather_soft_miss_total.load(Ordering::Relaxed),
            places_empty_total: self.places_empty_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,wayfinder_api=info,wayfinder_agents=info,wayfinder_providers=warn,wayfinder_nlp=warn",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_averages_latency() {
        let metrics = AppMetrics::default();
        metrics.inc_request();
        metrics.inc_request();
        metrics.inc_answered();
        metrics.inc_places_empty();
        metrics.observe_latency(Duration::from_millis(30));
        metrics.observe_latency(Duration::from_millis(10));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 2);
        assert_eq!(snapshot.answered_total, 1);
        assert_eq!(snapshot.places_empty_total, 1);
        assert_eq!(snapshot.avg_latency_millis, 20.0);
    }

    #[test]
    fn empty_snapshot_has_zero_latency() {
        assert_eq!(AppMetrics::default().snapshot().avg_latency_millis, 0.0);
    }
}
