//! Semantic configuration checks, run after deserialization.

use crate::config::schema::GatewayConfig;

/// A single validation failure.
#[derive(Debug)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the assembled configuration. Collects all failures rather than
/// stopping at the first one.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listener.bind_address",
            message: format!("not a valid socket address: {}", config.listener.bind_address),
        });
    }

    for (field, url) in [
        ("upstreams.backend_url", &config.upstreams.backend_url),
        ("upstreams.webui_url", &config.upstreams.webui_url),
    ] {
        match url.parse::<axum::http::Uri>() {
            Ok(uri) if uri.authority().is_some() => {}
            _ => errors.push(ValidationError {
                field,
                message: format!("not a valid absolute URL: {}", url),
            }),
        }
    }

    if !config.upstreams.api_prefix.starts_with('/') {
        errors.push(ValidationError {
            field: "upstreams.api_prefix",
            message: "must start with '/'".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
