//! Request forwarding to the classified upstream.
//!
//! # Responsibilities
//! - Rewrite the request URI to the upstream authority, preserving the
//!   full original path and query
//! - Inject the service credential toward the backend; pass headers
//!   through toward the web UI (host rewritten for both)
//! - Stream request and response bodies end to end
//! - Hand off protocol-upgrade requests to the tunnel

use std::time::Duration;

use axum::body::Body;
use axum::http::uri::PathAndQuery;
use axum::http::{header, Request, Response, StatusCode, Uri};
use hyper_util::client::legacy::{connect::HttpConnector, Client};

use crate::http::error_response;
use crate::proxy::router::{RoutingTable, UpstreamKind};
use crate::proxy::upgrade;

/// Forwarding client type shared across requests.
pub type ForwardClient = Client<HttpConnector, Body>;

/// Build the forwarding client.
pub fn build_client() -> ForwardClient {
    Client::builder(hyper_util::rt::TokioExecutor::new()).build(HttpConnector::new())
}

/// Forward one request to its classified upstream and return the upstream
/// response. Failures surface as a 502 and a stalled upstream as a 504;
/// retry is the caller's responsibility, not the gateway's.
pub async fn forward(
    client: &ForwardClient,
    table: &RoutingTable,
    kind: UpstreamKind,
    timeout: Duration,
    mut request: Request<Body>,
) -> Response<Body> {
    let target = table.target(kind);

    // Capture the client side of a potential protocol upgrade before the
    // request is consumed.
    let client_upgrade = request.extensions_mut().remove::<hyper::upgrade::OnUpgrade>();

    // The upstream receives the same logical path it would without the
    // gateway: full original path and query, new scheme and authority.
    let path_and_query = request
        .uri()
        .path_and_query()
        .cloned()
        .unwrap_or_else(|| PathAndQuery::from_static("/"));
    let uri = match Uri::builder()
        .scheme(target.scheme.clone())
        .authority(target.authority.clone())
        .path_and_query(path_and_query)
        .build()
    {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(error = %e, "failed to build upstream URI");
            return error_response(StatusCode::BAD_GATEWAY, "Upstream request failed");
        }
    };
    *request.uri_mut() = uri;

    // Host rewritten to the target for both upstreams.
    if let Ok(host) = header::HeaderValue::from_str(target.authority.as_str()) {
        request.headers_mut().insert(header::HOST, host);
    }

    // The caller's own token must never reach the backend; the service
    // credential overwrites whatever Authorization header was sent.
    if kind == UpstreamKind::Api {
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, table.service_credential().clone());
    }

    match tokio::time::timeout(timeout, client.request(request)).await {
        Ok(Ok(mut response)) => {
            if response.status() == StatusCode::SWITCHING_PROTOCOLS {
                if let Some(client_upgrade) = client_upgrade {
                    let upstream_upgrade = hyper::upgrade::on(&mut response);
                    upgrade::spawn_tunnel(client_upgrade, upstream_upgrade);
                }
                response.map(|_| Body::empty())
            } else {
                response.map(Body::new)
            }
        }
        Ok(Err(e)) => {
            tracing::error!(
                upstream = kind.label(),
                authority = %target.authority,
                error = %e,
                "upstream request failed"
            );
            error_response(StatusCode::BAD_GATEWAY, "Upstream request failed")
        }
        Err(_) => {
            tracing::error!(
                upstream = kind.label(),
                authority = %target.authority,
                timeout_secs = timeout.as_secs(),
                "upstream request timed out"
            );
            error_response(StatusCode::GATEWAY_TIMEOUT, "Upstream request timed out")
        }
    }
}
