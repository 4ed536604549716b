//! HTTP query surface (axum).
//!
//! Each statistics endpoint reads the latest batch exactly once and derives
//! every figure of its response from that one snapshot.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{error, warn};

use quotefeed_aggregator::{average, quote_lines, slippage};
use quotefeed_common::{age_of, Batch, QuoteFeedError};
use quotefeed_store::BatchStore;

use crate::metrics::{MetricsSnapshot, SharedMetrics};
use crate::state::ServiceState;

/// Shared state of the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BatchStore>,
    pub metrics: SharedMetrics,
    pub state: Arc<RwLock<ServiceState>>,
}

/// Create the HTTP router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/quotes", get(get_quotes))
        .route("/average", get(get_average))
        .route("/slippage", get(get_slippage))
        .route("/health", get(health))
        .route("/metrics", get(prometheus))
        .with_state(state)
}

/// JSON body rendered with two-space indentation.
pub struct PrettyJson<T>(pub T);

impl<T: Serialize> IntoResponse for PrettyJson<T> {
    fn into_response(self) -> Response {
        match serde_json::to_string_pretty(&self.0) {
            Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
            Err(e) => {
                error!(error = %e, "Failed to serialize response");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Error response: `404` when no batch exists, `500` otherwise.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Map a failure to a response, using `failure` as the public message
    /// for anything but the no-data condition.
    fn from_error(err: QuoteFeedError, failure: &str) -> Self {
        match err {
            QuoteFeedError::NoData => Self {
                status: StatusCode::NOT_FOUND,
                message: QuoteFeedError::NoData.to_string(),
            },
            other => {
                error!(error = %other, code = other.error_code(), "Request failed");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: failure.to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = PrettyJson(ErrorBody {
            error: self.message,
        })
        .into_response();
        *response.status_mut() = self.status;
        response
    }
}

async fn latest(store: &dyn BatchStore) -> Result<Batch, QuoteFeedError> {
    store.latest_batch().await?.ok_or(QuoteFeedError::NoData)
}

async fn index() -> Html<&'static str> {
    Html(
        r#"<div style="font-family: Arial, sans-serif; padding: 20px;">
    <h1>Currency API is running!</h1>
    <p>Welcome to the ARS Currency Exchange API. Here are the available endpoints:</p>
    <ul>
        <li><a href="/quotes">GET /quotes</a></li>
        <li><a href="/average">GET /average</a></li>
        <li><a href="/slippage">GET /slippage</a></li>
    </ul>
</div>"#,
    )
}

async fn get_quotes(State(app): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    const FAILURE: &str = "Failed to fetch quotes";

    let batch = latest(app.store.as_ref())
        .await
        .map_err(|e| ApiError::from_error(e, FAILURE))?;
    let report = quote_lines(&batch).map_err(|e| ApiError::from_error(e.into(), FAILURE))?;

    Ok(PrettyJson(report))
}

async fn get_average(State(app): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    const FAILURE: &str = "Failed to calculate average";

    let batch = latest(app.store.as_ref())
        .await
        .map_err(|e| ApiError::from_error(e, FAILURE))?;
    let report = average(&batch).map_err(|e| ApiError::from_error(e.into(), FAILURE))?;

    Ok(PrettyJson(report))
}

async fn get_slippage(State(app): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    const FAILURE: &str = "Failed to calculate slippage";

    let batch = latest(app.store.as_ref())
        .await
        .map_err(|e| ApiError::from_error(e, FAILURE))?;
    let report = slippage(&batch).map_err(|e| ApiError::from_error(e.into(), FAILURE))?;

    Ok(PrettyJson(report))
}

#[derive(Serialize)]
struct HealthReport {
    state: ServiceState,
    store_ok: bool,
    latest_batch_id: Option<i64>,
    latest_batch_age_secs: Option<i64>,
    metrics: MetricsSnapshot,
}

async fn health(State(app): State<AppState>) -> Response {
    let state = *app.state.read();

    let (store_ok, latest) = match app.store.latest_batch().await {
        Ok(batch) => (true, batch),
        Err(e) => {
            warn!(error = %e, "Health check could not read the store");
            (false, None)
        }
    };

    let report = HealthReport {
        state,
        store_ok,
        latest_batch_id: latest.as_ref().map(|b| b.id.value()),
        latest_batch_age_secs: latest.as_ref().map(|b| age_of(b.created_at).num_seconds()),
        metrics: app.metrics.snapshot(),
    };

    let status = if store_ok && !state.is_terminal() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, PrettyJson(report)).into_response()
}

async fn prometheus(State(app): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        app.metrics.to_prometheus(),
    )
}
