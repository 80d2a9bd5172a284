//! Restricted-path authorization.
//!
//! Third stage of the pipeline. Administrative endpoints (extension
//! management, settings, downloads) are reachable only by admin-role
//! callers. Runs after the entitlement gate on the same resolved caller.

use crate::identity::Caller;

/// Decision for one request against the restricted path set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminDecision {
    Allow,
    /// Restricted path without an admin caller (HTTP 403).
    DenyForbidden,
}

/// Immutable set of admin-only path prefixes, built once at startup.
pub struct RouteAuthorizer {
    restricted: Vec<String>,
}

impl RouteAuthorizer {
    pub fn new(restricted: Vec<String>) -> Self {
        Self { restricted }
    }

    /// Check the caller against the restricted set. Paths outside the set
    /// always pass, independent of caller state.
    pub fn check(&self, caller: &Caller, path: &str) -> AdminDecision {
        if !self.restricted.iter().any(|prefix| path.starts_with(prefix)) {
            return AdminDecision::Allow;
        }

        if caller.is_admin() {
            tracing::debug!(path = %path, "admin access granted to restricted path");
            AdminDecision::Allow
        } else {
            tracing::info!(path = %path, "blocked non-admin access to restricted path");
            AdminDecision::DenyForbidden
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicyConfig;
    use crate::identity::store::Role;
    use crate::identity::CallerContext;

    fn authorizer() -> RouteAuthorizer {
        RouteAuthorizer::new(PolicyConfig::default().restricted_paths)
    }

    fn caller(role: Role) -> Caller {
        Caller::Known(CallerContext {
            id: "u1".into(),
            role,
            credits: 0,
            premium: false,
        })
    }

    #[test]
    fn unrestricted_path_allows_anyone() {
        let authorizer = authorizer();
        assert_eq!(
            authorizer.check(&Caller::Anonymous, "/api/v1/manga/1"),
            AdminDecision::Allow
        );
        assert_eq!(
            authorizer.check(&caller(Role::Free), "/library"),
            AdminDecision::Allow
        );
    }

    #[test]
    fn restricted_path_requires_admin() {
        let authorizer = authorizer();
        for path in [
            "/api/v1/extension/install/foo",
            "/api/v1/extension/uninstall/foo",
            "/api/v1/extension/update/foo",
            "/api/v1/settings/about",
            "/api/v1/download/42",
        ] {
            assert_eq!(
                authorizer.check(&Caller::Anonymous, path),
                AdminDecision::DenyForbidden
            );
            assert_eq!(
                authorizer.check(&caller(Role::Free), path),
                AdminDecision::DenyForbidden
            );
            assert_eq!(
                authorizer.check(&caller(Role::Premium), path),
                AdminDecision::DenyForbidden
            );
            assert_eq!(authorizer.check(&caller(Role::Admin), path), AdminDecision::Allow);
        }
    }

    #[test]
    fn premium_flag_does_not_grant_admin() {
        let authorizer = authorizer();
        let premium = Caller::Known(CallerContext {
            id: "u2".into(),
            role: Role::Free,
            credits: 100,
            premium: true,
        });
        assert_eq!(
            authorizer.check(&premium, "/api/v1/settings"),
            AdminDecision::DenyForbidden
        );
    }
}
