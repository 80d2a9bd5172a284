//! HTTP client for the backend's readiness and install endpoints.

use crate::installer::machine::{ExtensionBackend, InstallOutcome};
use async_trait::async_trait;

const INSTALL_PATH: &str = "/api/v1/extension/install";

/// Talks to the real backend with the fixed service credential.
pub struct HttpExtensionBackend {
    client: reqwest::Client,
    base_url: String,
    health_path: String,
    credential: String,
}

impl HttpExtensionBackend {
    pub fn new(base_url: String, health_path: String, credential: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            health_path,
            credential,
        }
    }
}

#[async_trait]
impl ExtensionBackend for HttpExtensionBackend {
    async fn is_ready(&self) -> bool {
        let url = format!("{}{}", self.base_url, self.health_path);
        match self
            .client
            .get(&url)
            .header("Authorization", &self.credential)
            .send()
            .await
        {
            Ok(res) => res.status().is_success(),
            // Connection refused while the backend boots; not a failure.
            Err(_) => false,
        }
    }

    async fn install(&self, pkg: &str) -> InstallOutcome {
        let url = format!("{}{}/{}", self.base_url, INSTALL_PATH, pkg);
        match self
            .client
            .get(&url)
            .header("Authorization", &self.credential)
            .send()
            .await
        {
            Ok(res) if res.status().is_success() => InstallOutcome::Installed,
            Ok(res) if res.status().as_u16() == 404 => InstallOutcome::NotFoundYet,
            Ok(res) => InstallOutcome::Failed(format!("status {}", res.status())),
            Err(e) => InstallOutcome::Failed(e.to_string()),
        }
    }
}
