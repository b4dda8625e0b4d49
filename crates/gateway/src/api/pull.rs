//! Pull endpoints.
//!
//! - `POST /pull/1?uid=…`: one draw: ticket id, tier label, or `null`
//! - `POST /pull/10?uid=…`: ten draws, in trial order
//!
//! The challenge token comes from the configured header (default
//! `x-turnstile-token`) and the anti-bot fingerprint from a cookie.  The
//! caller IP is the TCP peer unless `server.client_ip_header` names a header
//! set by a trusted proxy.

use std::net::SocketAddr;

use axum::extract::rejection::QueryRejection;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use gacha_domain::config::Config;

use super::api_error;
use crate::runtime::PullRequest;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PullQuery {
    #[serde(default)]
    pub uid: Option<String>,
}

/// `POST /pull/1`
pub async fn pull_one(
    State(state): State<AppState>,
    query: Result<Query<PullQuery>, QueryRejection>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return bad_query(e),
    };
    let req = pull_request(&state.config, query, &headers, peer.map(|c| c.0));
    match state.pipeline.pull_one(&req).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => e.into_response(),
    }
}

/// `POST /pull/10`
pub async fn pull_ten(
    State(state): State<AppState>,
    query: Result<Query<PullQuery>, QueryRejection>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return bad_query(e),
    };
    let req = pull_request(&state.config, query, &headers, peer.map(|c| c.0));
    match state.pipeline.pull_ten(&req).await {
        Ok(outcomes) => Json(outcomes).into_response(),
        Err(e) => e.into_response(),
    }
}

// ── Extraction helpers ───────────────────────────────────────────────

fn bad_query(rejection: QueryRejection) -> Response {
    api_error(
        StatusCode::BAD_REQUEST,
        format!("invalid query string: {}", rejection.body_text()),
    )
}

fn pull_request(
    config: &Config,
    query: PullQuery,
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
) -> PullRequest {
    PullRequest {
        session_id: query.uid,
        caller_ip: client_ip(headers, config.server.client_ip_header.as_deref(), peer),
        bot_cookie: cookie_value(headers, &config.limits.bot_cookie).map(str::to_owned),
        challenge_token: header_str(headers, &config.challenge.token_header).map(str::to_owned),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// First address in the trusted client-IP header (which may be a
/// comma-separated forwarding chain), else the TCP peer.  With no header
/// configured the peer is the only source.
fn client_ip(
    headers: &HeaderMap,
    trusted_header: Option<&str>,
    peer: Option<SocketAddr>,
) -> Option<String> {
    trusted_header
        .and_then(|name| header_str(headers, name))
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .or_else(|| peer.map(|p| p.ip().to_string()))
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}
