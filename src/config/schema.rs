//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files, and
//! every section has defaults so a minimal (or empty) config is runnable.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream targets (API backend and web UI).
    pub upstreams: UpstreamConfig,

    /// External identity/profile store connection.
    pub identity: IdentityConfig,

    /// Service-level credential injected toward the API backend.
    pub service_auth: ServiceAuthConfig,

    /// Access policy (restricted administrative paths).
    pub policy: PolicyConfig,

    /// Bootstrap extension installer.
    pub installer: InstallerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream target configuration.
///
/// Exactly two destinations exist: API-prefixed paths go to the backend,
/// everything else goes to the web UI.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the API backend (e.g., "http://localhost:4567").
    pub backend_url: String,

    /// Base URL of the web UI server.
    pub webui_url: String,

    /// Path prefix routed to the backend. The prefix is preserved in the
    /// upstream path; the backend sees the same logical path it would
    /// without the gateway.
    pub api_prefix: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:4567".to_string(),
            webui_url: "http://suwayomi-webui:3000".to_string(),
            api_prefix: "/api".to_string(),
        }
    }
}

/// External identity/profile store connection parameters.
///
/// When `url` or `anon_key` is empty the gateway still runs; every caller
/// then resolves as anonymous.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Base URL of the identity service.
    pub url: String,

    /// Public (anon) API key sent with every store call.
    pub anon_key: String,

    /// Timeout for identity/profile calls in seconds.
    pub timeout_secs: u64,

    /// Name of the server-side atomic decrement function.
    pub decrement_fn: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            timeout_secs: 5,
            decrement_fn: "decrement_credit".to_string(),
        }
    }
}

/// Fixed service credential the API backend requires.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceAuthConfig {
    pub username: String,
    pub password: String,
}

impl Default for ServiceAuthConfig {
    fn default() -> Self {
        Self {
            username: "suwayomi".to_string(),
            password: "suwayomi".to_string(),
        }
    }
}

/// Access policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Path prefixes reachable only by admin-role callers.
    pub restricted_paths: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            restricted_paths: vec![
                "/api/v1/extension/install".to_string(),
                "/api/v1/extension/uninstall".to_string(),
                "/api/v1/extension/update".to_string(),
                "/api/v1/settings".to_string(),
                "/api/v1/download".to_string(),
            ],
        }
    }
}

/// Bootstrap extension installer configuration.
///
/// Defaults bound the whole wait at 300 polls x 2s = 10 minutes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InstallerConfig {
    /// Enable the startup installer task.
    pub enabled: bool,

    /// Extension package identifiers, installed in list order.
    pub extensions: Vec<String>,

    /// Readiness probe path on the backend.
    pub health_path: String,

    /// Seconds between readiness polls.
    pub poll_interval_secs: u64,

    /// Maximum number of readiness polls before giving up.
    pub max_polls: u32,

    /// Settle delay after the first successful poll, allowing the
    /// backend's extension repositories to sync.
    pub settle_delay_secs: u64,

    /// Install attempts per extension.
    pub install_attempts: u32,

    /// Seconds between attempts when the package is not found yet.
    pub retry_delay_secs: u64,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            extensions: Vec::new(),
            health_path: "/api/v1/settings/about".to_string(),
            poll_interval_secs: 2,
            max_polls: 300,
            settle_delay_secs: 15,
            install_attempts: 12,
            retry_delay_secs: 5,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed for an upstream to produce a response, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
