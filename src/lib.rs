//! Gatekeeper: authenticating, metering reverse-proxy gateway.
//!
//! Sits in front of a manga-reading backend and its web UI. Terminates
//! all inbound HTTP traffic, resolves caller identity against an external
//! account service, enforces a pay-per-chapter entitlement policy,
//! restricts administrative endpoints, and forwards each request to one
//! of two upstreams with the credentials that upstream requires. A
//! background bootstrap task installs a configured extension list once
//! the backend comes up.

pub mod config;
pub mod http;
pub mod identity;
pub mod installer;
pub mod lifecycle;
pub mod observability;
pub mod policy;
pub mod proxy;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
