//! Request ID middleware.
//!
//! Assigns a UUID v4 `x-request-id` to requests that arrive without one and
//! echoes it on the response, so one ID correlates gateway logs with
//! upstream logs.

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Read the request ID off an already-tagged request.
pub fn request_id(request: &Request<Body>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Middleware: tag the request, run it, echo the ID on the response.
pub async fn propagate_request_id(mut request: Request<Body>, next: Next) -> Response {
    if !request.headers().contains_key(X_REQUEST_ID) {
        if let Ok(value) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
            request.headers_mut().insert(X_REQUEST_ID, value);
        }
    }
    let id = request.headers().get(X_REQUEST_ID).cloned();

    let mut response = next.run(request).await;
    if let Some(id) = id {
        response.headers_mut().entry(X_REQUEST_ID).or_insert(id);
    }
    response
}
