// GET /api/trends: run the trend pipeline (or reuse a cached report).
//
// 200 with the report JSON on success. Failures map by kind:
//   upstream_fetch, empty_corpus -> 502 Bad Gateway
//   inference, schema_validation -> 500 Internal Server Error
// `?refresh=true` skips the cache.

use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::{error, info};

use crate::pipeline::error::{ErrorKind, PipelineError};
use crate::web::AppState;

/// Response header carrying when the returned report was produced.
pub const GENERATED_AT_HEADER: &str = "x-report-generated-at";

#[derive(Deserialize, Default)]
pub struct TrendsQuery {
    /// Bypass the report cache
    #[serde(default)]
    pub refresh: bool,
}

/// GET /api/trends: produce a trend report.
pub async fn get_trends(
    State(state): State<AppState>,
    Query(params): Query<TrendsQuery>,
) -> Response {
    if !params.refresh {
        if let Some(cached) = state.cache.get().await {
            info!(generated_at = %cached.generated_at, "Serving cached trend report");
            return report_response(&cached.report, &cached.generated_at.to_rfc3339());
        }
    }

    match state.pipeline.produce_trend_report().await {
        Ok(report) => {
            let entry = state.cache.put(report).await;
            report_response(&entry.report, &entry.generated_at.to_rfc3339())
        }
        Err(e) => {
            error!(kind = e.kind().as_str(), error = %e, "Trend pipeline failed");
            pipeline_error_response(&e)
        }
    }
}

/// HTTP status for each failure kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::UpstreamFetch | ErrorKind::EmptyCorpus => StatusCode::BAD_GATEWAY,
        ErrorKind::Inference | ErrorKind::SchemaValidation => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON error body: `{ error, kind, details?, payload? }`.
pub fn pipeline_error_response(error: &PipelineError) -> Response {
    let mut body = serde_json::json!({
        "error": error.message(),
        "kind": error.kind().as_str(),
    });
    if let Some(details) = error.details() {
        body["details"] = serde_json::Value::from(details);
    }
    if let Some(payload) = error.payload() {
        body["payload"] = payload.clone();
    }
    (status_for(error.kind()), Json(body)).into_response()
}

fn report_response(report: &crate::report::schema::TrendReport, generated_at: &str) -> Response {
    let mut response = Json(report).into_response();
    if let Ok(value) = HeaderValue::from_str(generated_at) {
        response.headers_mut().insert(GENERATED_AT_HEADER, value);
    }
    response
}
