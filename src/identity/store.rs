//! External identity/profile store client.
//!
//! The gateway never owns account data; it verifies bearer tokens, reads
//! profile rows, and conditionally decrements the credit balance — all
//! against a Supabase-style REST service. The [`AccountStore`] trait is the
//! seam tests use to inject an in-memory store.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::IdentityConfig;

/// Caller role as stored in the profile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Premium,
    #[default]
    Free,
}

/// Profile fields consumed by the gateway. Every field defaults when the
/// store omits it; a verified identity with no profile row behaves like an
/// unprivileged caller, not an error.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Profile {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub credits: u32,
    #[serde(default)]
    pub is_premium: bool,
}

/// Error from a store call. Policy code treats these as "degrade to the
/// safe default", never as request failures.
#[derive(Debug)]
pub enum StoreError {
    /// Transport-level failure (connect, timeout, body).
    Transport(reqwest::Error),
    /// The store answered with an unexpected status.
    Status(u16),
    /// The store is not configured (no URL / key).
    Unconfigured,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Transport(e) => write!(f, "transport error: {}", e),
            StoreError::Status(code) => write!(f, "unexpected status: {}", code),
            StoreError::Unconfigured => write!(f, "identity store not configured"),
        }
    }
}

impl std::error::Error for StoreError {}

impl StoreError {
    /// True when the atomic decrement path cannot be used at all —
    /// transport failure, unconfigured store, missing server-side function,
    /// or a server-side fault. A 4xx other than 404 is the store refusing
    /// the operation, not the path being unavailable.
    pub fn is_unavailable(&self) -> bool {
        match self {
            StoreError::Transport(_) | StoreError::Unconfigured => true,
            StoreError::Status(code) => *code == 404 || *code >= 500,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Transport(e)
    }
}

/// Operations the gateway needs from the identity/profile store.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Exchange a bearer token for a verified account id.
    /// `Ok(None)` means the token was rejected (invalid or expired).
    async fn verify_token(&self, token: &str) -> Result<Option<String>, StoreError>;

    /// Read the profile row for an account. `Ok(None)` means no row exists.
    async fn fetch_profile(&self, account_id: &str) -> Result<Option<Profile>, StoreError>;

    /// Atomically decrement the account's credit balance by one,
    /// server-side.
    async fn decrement_credit(&self, account_id: &str) -> Result<(), StoreError>;

    /// Non-atomic fallback: overwrite the stored balance. Race-prone under
    /// concurrent requests from the same account; used only when the atomic
    /// path fails.
    async fn write_credits(&self, account_id: &str, credits: u32) -> Result<(), StoreError>;
}

#[derive(Debug, Deserialize)]
struct VerifiedUser {
    id: String,
}

/// HTTP implementation over a Supabase-style REST API.
pub struct HttpAccountStore {
    client: reqwest::Client,
    config: IdentityConfig,
}

impl HttpAccountStore {
    pub fn new(config: IdentityConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    fn configured(&self) -> Result<(), StoreError> {
        if self.config.url.is_empty() || self.config.anon_key.is_empty() {
            return Err(StoreError::Unconfigured);
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for HttpAccountStore {
    async fn verify_token(&self, token: &str) -> Result<Option<String>, StoreError> {
        self.configured()?;
        let res = self
            .client
            .get(format!("{}/auth/v1/user", self.config.url))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        match res.status().as_u16() {
            200 => {
                let user: VerifiedUser = res.json().await?;
                Ok(Some(user.id))
            }
            401 | 403 | 404 => Ok(None),
            code => Err(StoreError::Status(code)),
        }
    }

    async fn fetch_profile(&self, account_id: &str) -> Result<Option<Profile>, StoreError> {
        self.configured()?;
        let res = self
            .client
            .get(format!("{}/rest/v1/profiles", self.config.url))
            .query(&[
                ("id", format!("eq.{}", account_id)),
                ("select", "role,credits,is_premium".to_string()),
            ])
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(StoreError::Status(res.status().as_u16()));
        }
        let mut rows: Vec<Profile> = res.json().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    async fn decrement_credit(&self, account_id: &str) -> Result<(), StoreError> {
        self.configured()?;
        let res = self
            .client
            .post(format!(
                "{}/rest/v1/rpc/{}",
                self.config.url, self.config.decrement_fn
            ))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
            .json(&serde_json::json!({ "account_id": account_id }))
            .send()
            .await?;

        if res.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::Status(res.status().as_u16()))
        }
    }

    async fn write_credits(&self, account_id: &str, credits: u32) -> Result<(), StoreError> {
        self.configured()?;
        let res = self
            .client
            .patch(format!("{}/rest/v1/profiles", self.config.url))
            .query(&[("id", format!("eq.{}", account_id))])
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
            .json(&serde_json::json!({ "credits": credits }))
            .send()
            .await?;

        if res.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::Status(res.status().as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_deserializes_lowercase() {
        let profile: Profile =
            serde_json::from_str(r#"{"role":"admin","credits":3,"is_premium":false}"#).unwrap();
        assert_eq!(profile.role, Role::Admin);
        assert_eq!(profile.credits, 3);
    }

    #[test]
    fn missing_fields_default() {
        let profile: Profile = serde_json::from_str("{}").unwrap();
        assert_eq!(profile.role, Role::Free);
        assert_eq!(profile.credits, 0);
        assert!(!profile.is_premium);
    }

    #[test]
    fn unavailability_is_distinct_from_rejection() {
        assert!(StoreError::Unconfigured.is_unavailable());
        assert!(StoreError::Status(404).is_unavailable());
        assert!(StoreError::Status(500).is_unavailable());
        assert!(!StoreError::Status(409).is_unavailable());
        assert!(!StoreError::Status(400).is_unavailable());
    }

    #[tokio::test]
    async fn unconfigured_store_errors() {
        let store = HttpAccountStore::new(IdentityConfig::default());
        assert!(matches!(
            store.verify_token("abc").await,
            Err(StoreError::Unconfigured)
        ));
    }
}
