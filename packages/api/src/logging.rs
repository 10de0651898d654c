// ABOUTME: Request logging middleware
// ABOUTME: One line in, one line out, with the resolved username

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::info;

use crate::state::AppState;

pub async fn log_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let username = resolve_username(&state, &request);

    info!(
        target: "taskhive::request",
        "Incoming request: {} {} | user={}", method, path, username
    );

    let start = Instant::now();
    let response = next.run(request).await;
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

    info!(
        target: "taskhive::request",
        "Outgoing response: {} {} -> {} in {:.2}ms",
        method,
        path,
        response.status().as_u16(),
        duration_ms,
    );

    response
}

/// Best-effort username for the log line: `anonymous` without a bearer
/// token, `invalid-token` when one is present but does not verify.
fn resolve_username(state: &AppState, request: &Request) -> String {
    let header = match request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        Some(value) => value,
        None => return "anonymous".to_string(),
    };

    if header.len() <= 7 || !header[..7].eq_ignore_ascii_case("bearer ") {
        return "anonymous".to_string();
    }
    let token = header[7..].trim();
    if token.is_empty() {
        return "anonymous".to_string();
    }

    match state.tokens.resolve(token) {
        Ok(claims) => claims.sub,
        Err(_) => "invalid-token".to_string(),
    }
}
