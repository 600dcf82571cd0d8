//! # API Server
//!
//! An `axum` server exposing the lookup services as JSON:
//!
//! - `GET /api/suggestions?q=` - autocomplete suggestions
//! - `GET /api/top-domains?count=` - most looked-up domains
//! - `GET /api/lookup/{domain}/certs` - merged certificate history; also
//!   records the lookup in the background
//! - `GET /metrics` - Prometheus exposition, when a handle is supplied
//!
//! The server shuts down gracefully when the watch channel it is given changes.

use crate::{
    analytics::AnalyticsError,
    certs::{CertificateError, CertificateResultSet},
    core::LookupRequest,
    domain,
    recorder::is_bot_user_agent,
    services::Services,
};
use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, sync::watch};
use tracing::{error, info, trace};

const DEFAULT_TOP_DOMAINS: usize = 10;
const MAX_TOP_DOMAINS: usize = 100;

#[derive(Debug)]
pub enum ApiError {
    InvalidDomain(String),
    Certificates(CertificateError),
    Analytics(AnalyticsError),
}

impl From<CertificateError> for ApiError {
    fn from(e: CertificateError) -> Self {
        Self::Certificates(e)
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(e: AnalyticsError) -> Self {
        Self::Analytics(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidDomain(domain) => (
                StatusCode::BAD_REQUEST,
                format!("'{}' is not a domain name", domain),
            ),
            ApiError::Certificates(e) => {
                error!(error = %e, "Certificate lookup failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "certificate search is unavailable".to_string(),
                )
            }
            ApiError::Analytics(e) => {
                error!(error = %e, "Analytics query failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "suggestions are unavailable".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

struct ApiState {
    services: Services,
    prometheus: Option<PrometheusHandle>,
}

#[derive(Debug, Deserialize)]
struct SuggestParams {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Deserialize)]
struct TopParams {
    count: Option<usize>,
}

/// Builds the API router.
pub fn router(services: Services, prometheus: Option<PrometheusHandle>) -> Router {
    let with_metrics = prometheus.is_some();
    let state = Arc::new(ApiState {
        services,
        prometheus,
    });

    let mut router = Router::new()
        .route("/api/suggestions", get(suggestions_handler))
        .route("/api/top-domains", get(top_domains_handler))
        .route("/api/lookup/{domain}/certs", get(certificates_handler));
    if with_metrics {
        router = router.route("/metrics", get(metrics_handler));
    }
    router.with_state(state)
}

async fn suggestions_handler(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<SuggestParams>,
) -> Result<Json<Vec<String>>, ApiError> {
    let suggestions = state.services.suggestions.suggest(&params.q).await?;
    Ok(Json(suggestions))
}

async fn top_domains_handler(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<TopParams>,
) -> Result<Json<Vec<String>>, ApiError> {
    let count = params
        .count
        .unwrap_or(DEFAULT_TOP_DOMAINS)
        .min(MAX_TOP_DOMAINS);
    let domains = state.services.suggestions.top_domains(count).await?;
    Ok(Json(domains))
}

async fn certificates_handler(
    State(state): State<Arc<ApiState>>,
    Path(domain): Path<String>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<CertificateResultSet>, ApiError> {
    if domain::labels(&domain).is_empty() {
        return Err(ApiError::InvalidDomain(domain));
    }

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    // Dropping the handle leaves the write running in the background.
    let _ = state.services.recorder.record(LookupRequest {
        domain: domain.clone(),
        ip: client_ip(&headers, peer),
        is_bot: is_bot_user_agent(user_agent.as_deref()),
        user_agent,
    });

    let certificates = state.services.certificates.lookup(&domain).await?;
    Ok(Json(certificates))
}

async fn metrics_handler(State(state): State<Arc<ApiState>>) -> String {
    state
        .prometheus
        .as_ref()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// The first `x-forwarded-for` hop when behind a proxy, else the peer address.
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| peer.ip().to_string())
}

/// Serves the API on `listener` until `shutdown_rx` changes.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown_rx: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    info!(addr = ?listener.local_addr().ok(), "API server listening");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_rx.changed().await.ok();
        trace!("API server received shutdown signal.");
    })
    .await?;
    trace!("API server task finished.");
    Ok(())
}
