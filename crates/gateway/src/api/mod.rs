pub mod cors;
pub mod health;
pub mod pull;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::runtime::PullError;
use crate::state::AppState;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/pull/1", post(pull::pull_one))
        .route("/pull/10", post(pull::pull_ten))
}

/// Build a standardized JSON error response: `{ "error": "<message>" }`.
pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

impl IntoResponse for PullError {
    fn into_response(self) -> Response {
        match self {
            PullError::MissingToken => {
                api_error(StatusCode::BAD_REQUEST, "missing challenge token")
            }
            PullError::MissingUid => api_error(StatusCode::BAD_REQUEST, "missing uid"),
            PullError::VerificationRejected { .. } => api_error(
                StatusCode::BAD_REQUEST,
                "challenge verification failed, please retry the challenge",
            ),
            PullError::UpstreamUnavailable(_) => api_error(
                StatusCode::BAD_GATEWAY,
                "challenge verification is unavailable, try again later",
            ),
            PullError::QuotaExceeded { retry_after, .. } => {
                let mut resp = api_error(
                    StatusCode::TOO_MANY_REQUESTS,
                    "too many pulls, slow down",
                );
                // Round up so clients never retry inside the window.
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                resp.headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
                resp
            }
        }
    }
}
