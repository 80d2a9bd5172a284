//! Pay-per-chapter entitlement gate.
//!
//! Second stage of the pipeline. Only chapter-page requests are metered;
//! everything else passes through untouched. Free-tier callers spend one
//! credit per chapter-page view; premium and admin callers bypass billing.

use std::sync::Arc;

use crate::identity::store::{AccountStore, Role};
use crate::identity::Caller;
use crate::observability::metrics;

/// Decision for one metered request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingDecision {
    /// Not metered, or metered and bypassed (premium/admin).
    Allow,
    /// Metered and one credit was consumed.
    Consumed,
    /// Metered but the caller is anonymous (HTTP 401).
    DenyUnauthenticated,
    /// Metered but the caller has no credits left (HTTP 402).
    DenyInsufficientCredit,
}

/// A path is metered when it addresses a single page inside a chapter,
/// e.g. `/api/v1/manga/42/chapter/7/page/3`.
pub fn is_chapter_page(path: &str) -> bool {
    path.contains("/chapter/") && path.contains("/page/")
}

/// The paywall decision stage.
pub struct EntitlementGate {
    store: Arc<dyn AccountStore>,
}

impl EntitlementGate {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Decide whether the request may proceed, debiting one credit when a
    /// free-tier caller views a chapter page.
    pub async fn authorize(&self, caller: &Caller, path: &str) -> BillingDecision {
        // Sole gating condition for whether billing logic runs at all.
        if !is_chapter_page(path) {
            return BillingDecision::Allow;
        }

        let ctx = match caller {
            Caller::Anonymous => {
                tracing::info!(path = %path, "chapter page requested without credentials");
                return BillingDecision::DenyUnauthenticated;
            }
            Caller::Known(ctx) => ctx,
        };

        if ctx.role == Role::Admin || ctx.premium {
            tracing::debug!(account_id = %ctx.id, "premium/admin caller, no credit consumed");
            return BillingDecision::Allow;
        }

        if ctx.credits == 0 {
            tracing::info!(account_id = %ctx.id, path = %path, "insufficient credits");
            return BillingDecision::DenyInsufficientCredit;
        }

        self.consume_credit(ctx).await
    }

    /// Debit exactly one credit. The atomic server-side decrement is the
    /// required discipline against lost updates; when the store refuses the
    /// debit (the balance was already spent, typically by a concurrent
    /// request racing this one) the request is denied. Only when the atomic
    /// path is unavailable does the gate fall back to a read-modify-write
    /// update, which does not provide the lost-update guarantee (concurrent
    /// requests from the same account may each write from the same stale
    /// balance).
    async fn consume_credit(&self, ctx: &crate::identity::CallerContext) -> BillingDecision {
        match self.store.decrement_credit(&ctx.id).await {
            Ok(()) => {
                tracing::info!(
                    account_id = %ctx.id,
                    remaining = ctx.credits - 1,
                    "credit consumed"
                );
                metrics::record_credit_consumed("atomic");
                BillingDecision::Consumed
            }
            Err(e) if e.is_unavailable() => {
                tracing::warn!(
                    account_id = %ctx.id,
                    error = %e,
                    "atomic decrement unavailable, falling back to non-atomic update (known lost-update race)"
                );
                metrics::record_credit_consumed("fallback");
                if let Err(e) = self.store.write_credits(&ctx.id, ctx.credits - 1).await {
                    tracing::error!(account_id = %ctx.id, error = %e, "fallback credit update failed");
                }
                BillingDecision::Consumed
            }
            Err(e) => {
                tracing::info!(
                    account_id = %ctx.id,
                    error = %e,
                    "atomic decrement rejected, balance already spent"
                );
                BillingDecision::DenyInsufficientCredit
            }
        }
    }
}
