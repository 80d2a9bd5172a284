//! Caller identity resolution.
//!
//! First stage of the request pipeline. Extracts the bearer credential,
//! verifies it with the external identity service, and attaches the
//! entitlement profile. Every failure mode degrades to [`Caller::Anonymous`]
//! — an unreachable identity store must not take down an otherwise healthy
//! gateway.

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

use crate::identity::store::{AccountStore, Profile, Role};
use crate::observability::metrics;

/// Resolved identity and entitlement snapshot for one in-flight request.
/// Built once per request and dropped with it; never persisted.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub id: String,
    pub role: Role,
    pub credits: u32,
    pub premium: bool,
}

/// Outcome of identity resolution. `Anonymous` is a valid state, distinct
/// from a known caller with zero credits.
#[derive(Debug, Clone)]
pub enum Caller {
    Anonymous,
    Known(CallerContext),
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        matches!(self, Caller::Known(ctx) if ctx.role == Role::Admin)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
}

/// Resolves callers against the external identity/profile store.
pub struct IdentityResolver {
    store: Arc<dyn AccountStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Resolve the caller for one request. At most two read-only store
    /// calls; never fails the pipeline.
    pub async fn resolve(&self, headers: &HeaderMap) -> Caller {
        let token = match bearer_token(headers) {
            Some(token) => token,
            None => return Caller::Anonymous,
        };

        let account_id = match self.store.verify_token(token).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                tracing::debug!("bearer token rejected by identity service");
                return Caller::Anonymous;
            }
            Err(e) => {
                tracing::warn!(error = %e, "identity verification unavailable, treating caller as anonymous");
                return Caller::Anonymous;
            }
        };

        let profile = match self.store.fetch_profile(&account_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                // Verified identity without a profile row: valid but
                // unprivileged. Surfaced as its own signal so the data gap
                // is visible.
                tracing::warn!(account_id = %account_id, "no profile row for verified account, using defaults");
                metrics::record_profile_missing();
                Profile::default()
            }
            Err(e) => {
                tracing::warn!(account_id = %account_id, error = %e, "profile fetch failed, using defaults");
                Profile::default()
            }
        };

        tracing::debug!(
            account_id = %account_id,
            role = ?profile.role,
            credits = profile.credits,
            "caller resolved"
        );

        Caller::Known(CallerContext {
            id: account_id,
            role: profile.role,
            credits: profile.credits,
            premium: profile.is_premium,
        })
    }
}
