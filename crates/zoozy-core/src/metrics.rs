use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::OnceLock;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tower::{Layer, Service};

pub const SYNC_RESULT_SUCCESS: &str = "success";
pub const SYNC_RESULT_ERROR: &str = "error";
pub const SYNC_RESULT_CANCELLED: &str = "cancelled";

struct Metrics {
    registry: Registry,
    zoozy_up: IntGaugeVec,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    sync_runs_total: IntCounterVec,
    sync_changes_total: IntCounterVec,
    notifications_created_total: IntCounterVec,
    auth_events_total: IntCounterVec,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

fn metrics() -> &'static Metrics {
    METRICS.get_or_init(|| {
        let registry = Registry::new();

        let zoozy_up = IntGaugeVec::new(Opts::new("zoozy_up", "Service health"), &["service"])
            .expect("zoozy_up metric");

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "HTTP request count"),
            &["service", "route", "method", "status"],
        )
        .expect("http_requests_total metric");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["service", "route", "method", "status"],
        )
        .expect("http_request_duration_seconds metric");

        let sync_runs_total = IntCounterVec::new(
            Opts::new("sync_runs_total", "Reconciliation sync invocations"),
            &["service", "result"],
        )
        .expect("sync_runs_total metric");

        let sync_changes_total = IntCounterVec::new(
            Opts::new("sync_changes_total", "Rows created or updated by sync"),
            &["service", "entity", "change"],
        )
        .expect("sync_changes_total metric");

        let notifications_created_total = IntCounterVec::new(
            Opts::new("notifications_created_total", "Notifications inserted"),
            &["service", "kind"],
        )
        .expect("notifications_created_total metric");

        let auth_events_total = IntCounterVec::new(
            Opts::new("auth_events_total", "Authentication outcomes"),
            &["service", "action", "result"],
        )
        .expect("auth_events_total metric");

        registry
            .register(Box::new(zoozy_up.clone()))
            .expect("register zoozy_up");
        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("register http_requests_total");
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("register http_request_duration_seconds");
        registry
            .register(Box::new(sync_runs_total.clone()))
            .expect("register sync_runs_total");
        registry
            .register(Box::new(sync_changes_total.clone()))
            .expect("register sync_changes_total");
        registry
            .register(Box::new(notifications_created_total.clone()))
            .expect("register notifications_created_total");
        registry
            .register(Box::new(auth_events_total.clone()))
            .expect("register auth_events_total");

        Metrics {
            registry,
            zoozy_up,
            http_requests_total,
            http_request_duration_seconds,
            sync_runs_total,
            sync_changes_total,
            notifications_created_total,
            auth_events_total,
        }
    })
}

pub fn init(service_name: &'static str) {
    metrics().zoozy_up.with_label_values(&[service_name]).set(1);
}

pub fn record_http_request(
    service_name: &'static str,
    method: &str,
    route: &str,
    status: u16,
    duration: Duration,
) {
    let status_str = status.to_string();
    let labels = &[service_name, route, method, status_str.as_str()];
    let metrics = metrics();
    metrics.http_requests_total.with_label_values(labels).inc();
    metrics
        .http_request_duration_seconds
        .with_label_values(labels)
        .observe(duration.as_secs_f64());
}

pub fn inc_sync_run(service_name: &'static str, result: &'static str) {
    metrics()
        .sync_runs_total
        .with_label_values(&[service_name, result])
        .inc();
}

pub fn add_sync_changes(service_name: &'static str, entity: &str, change: &str, count: u64) {
    if count == 0 {
        return;
    }
    metrics()
        .sync_changes_total
        .with_label_values(&[service_name, entity, change])
        .inc_by(count);
}

pub fn add_notifications(service_name: &'static str, kind: &str, count: u64) {
    if count == 0 {
        return;
    }
    metrics()
        .notifications_created_total
        .with_label_values(&[service_name, kind])
        .inc_by(count);
}

pub fn inc_auth_event(service_name: &'static str, action: &str, result: &str) {
    metrics()
        .auth_events_total
        .with_label_values(&[service_name, action, result])
        .inc();
}

pub fn metrics_response(service_name: &'static str) -> impl IntoResponse {
    init(service_name);
    let metrics = metrics();
    let metric_families = metrics.registry.gather();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            HeaderMap::new(),
            "failed to encode metrics".to_string(),
        );
    }

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    (
        StatusCode::OK,
        headers,
        String::from_utf8_lossy(&buffer).to_string(),
    )
}

#[derive(Clone)]
pub struct MetricsLayer {
    service_name: &'static str,
}

impl MetricsLayer {
    pub fn new(service_name: &'static str) -> Self {
        Self { service_name }
    }
}

#[derive(Clone)]
pub struct MetricsService<S> {
    inner: S,
    service_name: &'static str,
}

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService {
            inner,
            service_name: self.service_name,
        }
    }
}

impl<S, ReqBody, ResBody> Service<axum::http::Request<ReqBody>> for MetricsService<S>
where
    S: Service<axum::http::Request<ReqBody>, Response = axum::response::Response<ResBody>>
        + Send
        + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = axum::response::Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: axum::http::Request<ReqBody>) -> Self::Future {
        let service_name = self.service_name;
        let method = request.method().to_string();
        let route = route_label(request.uri().path());
        let start = Instant::now();
        let fut = self.inner.call(request);
        Box::pin(async move {
            match fut.await {
                Ok(response) => {
                    record_http_request(
                        service_name,
                        &method,
                        &route,
                        response.status().as_u16(),
                        start.elapsed(),
                    );
                    Ok(response)
                }
                Err(err) => {
                    record_http_request(service_name, &method, &route, 500, start.elapsed());
                    Err(err)
                }
            }
        })
    }
}

/// Collapses numeric and uuid path segments so ids do not explode label cardinality.
fn route_label(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            let is_id = !segment.is_empty()
                && (segment.chars().all(|c| c.is_ascii_digit())
                    || (segment.len() == 36 && segment.chars().all(|c| c.is_ascii_hexdigit() || c == '-')));
            if is_id {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::response::IntoResponse;

    #[test]
    fn route_label_masks_identifiers() {
        assert_eq!(route_label("/api/userrequests/42"), "/api/userrequests/:id");
        assert_eq!(
            route_label("/api/petprofiles/6f1c1f3e-8a5e-4f7b-9a31-0c5f3b2d9e11"),
            "/api/petprofiles/:id"
        );
        assert_eq!(route_label("/api/firebase/sync"), "/api/firebase/sync");
    }

    #[tokio::test]
    async fn metrics_response_renders_sync_counters() {
        inc_sync_run("zoozy-test", SYNC_RESULT_SUCCESS);
        add_sync_changes("zoozy-test", "pet", "created", 2);

        let response = metrics_response("zoozy-test").into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
        assert_eq!(content_type, "text/plain; version=0.0.4");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("sync_runs_total"));
        assert!(text.contains("zoozy_up"));
    }
}
