//! Upstream classification.
//!
//! # Responsibilities
//! - Hold the two upstream targets and the injected service credential
//! - Classify each request path into exactly one upstream
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - API prefix matching follows mount semantics: the prefix itself or a
//!   `/`-delimited sub-path, so `/apiary` never routes to the backend
//! - The service credential is pre-encoded once at startup

use axum::http::uri::{Authority, Scheme};
use axum::http::{HeaderValue, Uri};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::config::{ServiceAuthConfig, UpstreamConfig};

/// Which of the two upstreams a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    /// API backend; receives the service credential.
    Api,
    /// Web UI; headers pass through.
    WebUi,
}

impl UpstreamKind {
    /// Label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            UpstreamKind::Api => "backend",
            UpstreamKind::WebUi => "webui",
        }
    }
}

/// One upstream destination: scheme + authority to rewrite requests with.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    pub scheme: Scheme,
    pub authority: Authority,
}

impl UpstreamTarget {
    fn from_url(url: &str) -> Result<Self, String> {
        let uri: Uri = url
            .parse()
            .map_err(|e| format!("invalid upstream URL {}: {}", url, e))?;
        let scheme = uri.scheme().cloned().unwrap_or(Scheme::HTTP);
        let authority = uri
            .authority()
            .cloned()
            .ok_or_else(|| format!("upstream URL {} has no authority", url))?;
        Ok(Self { scheme, authority })
    }
}

/// Process-wide routing table: API prefix → backend with injected service
/// credential, catch-all → web UI with passthrough. Built once at startup.
pub struct RoutingTable {
    api_prefix: String,
    backend: UpstreamTarget,
    webui: UpstreamTarget,
    service_credential: HeaderValue,
}

impl RoutingTable {
    pub fn from_config(
        upstreams: &UpstreamConfig,
        service_auth: &ServiceAuthConfig,
    ) -> Result<Self, String> {
        let encoded = STANDARD.encode(format!(
            "{}:{}",
            service_auth.username, service_auth.password
        ));
        let service_credential = HeaderValue::from_str(&format!("Basic {}", encoded))
            .map_err(|e| format!("invalid service credential: {}", e))?;

        Ok(Self {
            api_prefix: upstreams.api_prefix.trim_end_matches('/').to_string(),
            backend: UpstreamTarget::from_url(&upstreams.backend_url)?,
            webui: UpstreamTarget::from_url(&upstreams.webui_url)?,
            service_credential,
        })
    }

    /// Classify a request path. Exactly one of two outcomes.
    pub fn classify(&self, path: &str) -> UpstreamKind {
        if path == self.api_prefix
            || (path.starts_with(&self.api_prefix)
                && path.as_bytes().get(self.api_prefix.len()) == Some(&b'/'))
        {
            UpstreamKind::Api
        } else {
            UpstreamKind::WebUi
        }
    }

    /// The destination for a classified request.
    pub fn target(&self, kind: UpstreamKind) -> &UpstreamTarget {
        match kind {
            UpstreamKind::Api => &self.backend,
            UpstreamKind::WebUi => &self.webui,
        }
    }

    /// The pre-encoded `Basic` credential the backend requires.
    pub fn service_credential(&self) -> &HeaderValue {
        &self.service_credential
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RoutingTable {
        RoutingTable::from_config(&UpstreamConfig::default(), &ServiceAuthConfig::default())
            .unwrap()
    }

    #[test]
    fn api_paths_route_to_backend() {
        let table = table();
        assert_eq!(table.classify("/api"), UpstreamKind::Api);
        assert_eq!(table.classify("/api/v1/manga/1"), UpstreamKind::Api);
        assert_eq!(table.classify("/api/v1/settings/about"), UpstreamKind::Api);
    }

    #[test]
    fn everything_else_routes_to_webui() {
        let table = table();
        assert_eq!(table.classify("/"), UpstreamKind::WebUi);
        assert_eq!(table.classify("/library"), UpstreamKind::WebUi);
        assert_eq!(table.classify("/apiary"), UpstreamKind::WebUi);
        assert_eq!(table.classify("/static/app.js"), UpstreamKind::WebUi);
    }

    #[test]
    fn service_credential_is_preencoded_basic_auth() {
        let table = table();
        // "suwayomi:suwayomi" base64-encoded.
        assert_eq!(
            table.service_credential().to_str().unwrap(),
            "Basic c3V3YXlvbWk6c3V3YXlvbWk="
        );
    }

    #[test]
    fn upstream_targets_parse() {
        let table = table();
        assert_eq!(
            table.target(UpstreamKind::Api).authority.as_str(),
            "localhost:4567"
        );
        assert_eq!(
            table.target(UpstreamKind::WebUi).authority.as_str(),
            "suwayomi-webui:3000"
        );
    }
}
