//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration: optional TOML file, then environment overrides,
/// then validation.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply deployment-facing environment variables on top of the file config.
///
/// Variable names follow the original deployment contract (PORT,
/// SUWAYOMI_URL, WEBUI_URL, SUPABASE_URL, SUPABASE_ANON_KEY).
fn apply_env_overrides(config: &mut GatewayConfig) {
    if let Ok(port) = std::env::var("PORT") {
        // PORT replaces only the port component of the bind address.
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(h, _)| h.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{}:{}", host, port);
    }
    if let Ok(url) = std::env::var("SUWAYOMI_URL") {
        config.upstreams.backend_url = url;
    }
    if let Ok(url) = std::env::var("WEBUI_URL") {
        config.upstreams.webui_url = url;
    }
    if let Ok(url) = std::env::var("SUPABASE_URL") {
        config.identity.url = url;
    }
    if let Ok(key) = std::env::var("SUPABASE_ANON_KEY") {
        config.identity.anon_key = key;
    }
    if let Ok(user) = std::env::var("SERVICE_AUTH_USER") {
        config.service_auth.username = user;
    }
    if let Ok(pass) = std::env::var("SERVICE_AUTH_PASS") {
        config.service_auth.password = pass;
    }
}
