//! HTTP server setup and the request-decision pipeline.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all gateway handler
//! - Wire up middleware (CORS, request ID, tracing)
//! - Spawn the bootstrap installer once the listener is bound
//! - Run the ordered pipeline per request:
//!   identity → entitlement → route authorization → forwarding
//!
//! Each stage may short-circuit with a terminal response (401/402/403);
//! otherwise control passes to the next stage with the same resolved
//! caller. Identity is resolved exactly once per request.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::http::error_response;
use crate::http::request::{propagate_request_id, request_id};
use crate::identity::{AccountStore, HttpAccountStore, IdentityResolver};
use crate::installer::{HttpExtensionBackend, Installer, TokioClock};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::policy::{AdminDecision, BillingDecision, EntitlementGate, RouteAuthorizer};
use crate::proxy::{build_client, forward, ForwardClient, RoutingTable};

/// Application state injected into the handler. Everything here is
/// immutable after construction and shared without locks.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<IdentityResolver>,
    pub gate: Arc<EntitlementGate>,
    pub authorizer: Arc<RouteAuthorizer>,
    pub table: Arc<RoutingTable>,
    pub client: ForwardClient,
    pub upstream_timeout: Duration,
}

/// The gateway HTTP server.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    table: Arc<RoutingTable>,
}

impl HttpServer {
    /// Create a server talking to the real identity store.
    pub fn new(config: GatewayConfig) -> Result<Self, String> {
        let store: Arc<dyn AccountStore> = Arc::new(HttpAccountStore::new(config.identity.clone()));
        Self::with_store(config, store)
    }

    /// Create a server with an injected account store (the test seam).
    pub fn with_store(config: GatewayConfig, store: Arc<dyn AccountStore>) -> Result<Self, String> {
        if config.identity.url.is_empty() || config.identity.anon_key.is_empty() {
            tracing::warn!("identity store not configured, every caller will resolve anonymous");
        }

        let table = Arc::new(RoutingTable::from_config(
            &config.upstreams,
            &config.service_auth,
        )?);

        let state = AppState {
            resolver: Arc::new(IdentityResolver::new(store.clone())),
            gate: Arc::new(EntitlementGate::new(store)),
            authorizer: Arc::new(RouteAuthorizer::new(config.policy.restricted_paths.clone())),
            table: table.clone(),
            client: build_client(),
            upstream_timeout: Duration::from_secs(config.timeouts.request_secs),
        };

        let router = Self::build_router(state);
        Ok(Self {
            router,
            config,
            table,
        })
    }

    /// Build the Axum router with all middleware layers. The upstream
    /// timeout lives at the forwarding call, not as a router layer, so a
    /// stalled upstream surfaces as a gateway error (504) rather than a
    /// client-attributed 408.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(axum::middleware::from_fn(propagate_request_id))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }

    /// Run the server, accepting connections on the given listener. The
    /// bootstrap installer is spawned here, after the listener is bound,
    /// and never blocks request handling.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "gateway listening");

        if self.config.installer.enabled {
            self.spawn_installer(&shutdown);
        }

        let mut shutdown_rx = shutdown.subscribe();
        let app = self.router;

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        tracing::info!("gateway stopped");
        Ok(())
    }

    /// Background, best-effort: a failed or timed-out installer never
    /// affects the serving path.
    fn spawn_installer(&self, shutdown: &Shutdown) {
        let credential = self
            .table
            .service_credential()
            .to_str()
            .unwrap_or_default()
            .to_string();
        let backend = HttpExtensionBackend::new(
            self.config.upstreams.backend_url.clone(),
            self.config.installer.health_path.clone(),
            credential,
        );
        let installer = Installer::new(backend, TokioClock, self.config.installer.clone());
        let mut shutdown_rx = shutdown.subscribe();

        tokio::spawn(async move {
            tokio::select! {
                phase = installer.run() => {
                    tracing::info!(phase = ?phase, "extension installer finished");
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("extension installer cancelled by shutdown");
                }
            }
        });
    }
}

/// The request-decision pipeline.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id(&request).to_string();
    let path = request.uri().path().to_string();
    let method = request.method().to_string();

    // 1. Identity: resolved once, shared by every later stage.
    let caller = state.resolver.resolve(request.headers()).await;

    // 2. Entitlement: only chapter-page paths are metered.
    match state.gate.authorize(&caller, &path).await {
        BillingDecision::Allow | BillingDecision::Consumed => {}
        BillingDecision::DenyUnauthenticated => {
            metrics::record_denial("unauthenticated");
            metrics::record_request(&method, 401, "none", start);
            return error_response(StatusCode::UNAUTHORIZED, "Login required to view chapters");
        }
        BillingDecision::DenyInsufficientCredit => {
            metrics::record_denial("insufficient_credit");
            metrics::record_request(&method, 402, "none", start);
            return error_response(
                StatusCode::PAYMENT_REQUIRED,
                "Payment Required: Insufficient Credits",
            );
        }
    }

    // 3. Route authorization: restricted administrative prefixes.
    if state.authorizer.check(&caller, &path) == AdminDecision::DenyForbidden {
        metrics::record_denial("forbidden");
        metrics::record_request(&method, 403, "none", start);
        return error_response(StatusCode::FORBIDDEN, "Forbidden: Admin access required");
    }

    // 4. Forwarding.
    let kind = state.table.classify(&path);
    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        upstream = kind.label(),
        "forwarding request"
    );

    let response = forward(
        &state.client,
        &state.table,
        kind,
        state.upstream_timeout,
        request,
    )
    .await;
    metrics::record_request(&method, response.status().as_u16(), kind.label(), start);
    response
}
